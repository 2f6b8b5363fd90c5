//! Overlay composition.
//!
//! A definition is built by instantiating its class with defaults and then
//! applying every layer of its lineage root-to-leaf. A key present in a layer
//! overwrites the field; a key absent leaves the inherited value alone. Keys
//! that are not payload fields collect in `extra_fields`.

use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::{Map, Value};

use crate::def::Def;
use crate::error::DefError;
use crate::resolver::Lineage;
use crate::stub::HEADER_KEYS;
use crate::types::{DefFields, DefType};

/// A single field that failed to populate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Running state of one composition.
#[derive(Debug, Default, Clone)]
pub struct LayerState {
    /// Raw field values applied so far, nearest layer last.
    pub applied: Map<String, Value>,
    /// Keys that are not fields of the payload.
    pub extra: Map<String, Value>,
}

/// Captures the field list a derived `Deserialize` hands to `deserialize_struct`.
struct FieldNames<'a> {
    names: &'a mut &'static [&'static str],
}

impl<'de> Deserializer<'de> for FieldNames<'_> {
    type Error = de::value::Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(de::Error::custom("payload is not a plain struct"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        *self.names = fields;
        Err(de::Error::custom("field names captured"))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

/// Field names `T` accepts when deserializing.
///
/// Empty for payloads that deserialize as a map (e.g. with `#[serde(flatten)]`);
/// callers then fall back to the serialized keys.
pub fn declared_fields<T: DeserializeOwned>() -> &'static [&'static str] {
    let mut names: &'static [&'static str] = &[];
    // Always errors once the names are captured.
    let _ = T::deserialize(FieldNames { names: &mut names });
    names
}

fn fields_of<T: DefFields>(target: &T) -> Result<Map<String, Value>, FieldError> {
    match serde_json::to_value(target) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(FieldError::new(T::TYPE_NAME, "payload does not serialize to an object")),
        Err(err) => Err(FieldError::new(T::TYPE_NAME, err.to_string())),
    }
}

/// Overlay `layer` onto `target` field by field.
///
/// A key is a field if the payload's `Deserialize` declares it or the current
/// payload serializes it. Values applied by earlier layers are carried in
/// `state.applied`, so fields hidden from serialization keep their value.
/// On failure the offending key is isolated by re-applying keys one at a time.
pub fn overlay<T: DefFields>(
    target: &mut T,
    layer: &Map<String, Value>,
    state: &mut LayerState,
) -> Result<(), FieldError> {
    let declared = declared_fields::<T>();
    let current = fields_of(target)?;
    let is_field = |key: &str| declared.contains(&key) || current.contains_key(key);

    let mut base: Map<String, Value> = current
        .iter()
        .filter(|(key, _)| declared.is_empty() || declared.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for (key, value) in &state.applied {
        base.insert(key.clone(), value.clone());
    }

    let mut merged = base.clone();
    let mut touched: Vec<(&str, &Value)> = Vec::new();
    for (key, value) in layer {
        if HEADER_KEYS.contains(&key.as_str()) {
            continue;
        }
        if is_field(key.as_str()) {
            merged.insert(key.clone(), value.clone());
            touched.push((key.as_str(), value));
        } else {
            state.extra.insert(key.clone(), value.clone());
        }
    }

    if touched.is_empty() {
        return Ok(());
    }

    match serde_json::from_value::<T>(Value::Object(merged)) {
        Ok(updated) => {
            *target = updated;
            for (key, value) in touched {
                state.applied.insert(key.to_string(), value.clone());
            }
            Ok(())
        }
        Err(err) => Err(blame::<T>(&base, &touched).unwrap_or_else(|| {
            let keys: Vec<&str> = touched.iter().map(|(key, _)| *key).collect();
            FieldError::new(keys.join(", "), err.to_string())
        })),
    }
}

/// Find the first layer key that fails on its own.
fn blame<T: DefFields>(base: &Map<String, Value>, touched: &[(&str, &Value)]) -> Option<FieldError> {
    touched.iter().find_map(|&(key, value)| {
        let mut single = base.clone();
        single.insert(key.to_string(), value.clone());
        serde_json::from_value::<T>(Value::Object(single))
            .err()
            .map(|err| FieldError::new(key, err.to_string()))
    })
}

/// Materialize the leaf of `lineage` as an instance of `def_type`.
pub fn compose(lineage: &Lineage<'_>, def_type: &DefType) -> Result<Def, DefError> {
    let leaf = lineage.leaf();
    let Some(mut data) = def_type.instantiate() else {
        return Err(DefError::AbstractType {
            origin: leaf.origin.clone(),
            name: leaf.name.clone(),
            class: def_type.name.to_string(),
        });
    };

    let mut state = LayerState::default();
    for layer in lineage.root_to_leaf() {
        data.apply_layer(&layer.raw, &mut state)
            .map_err(|err| DefError::Field {
                origin: leaf.origin.clone(),
                name: leaf.name.clone(),
                class: def_type.name.to_string(),
                layer: layer.name.clone(),
                layer_origin: layer.origin.clone(),
                field: err.field,
                message: err.message,
            })?;
    }

    let extra = state.extra;
    if !extra.is_empty() && !(def_type.allow_additional_data || lineage.allow_additional_data()) {
        let fields: Vec<&str> = extra.keys().map(String::as_str).collect();
        return Err(DefError::AdditionalData {
            origin: leaf.origin.clone(),
            name: leaf.name.clone(),
            fields: fields.join(", "),
        });
    }

    Ok(Def::new(
        leaf.name.clone(),
        leaf.parent_name.clone(),
        leaf.origin.clone(),
        extra,
        data,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::Color;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase", default)]
    struct UnitDef {
        attack: i32,
        speed: f32,
        tint: Color,
        tags: Vec<String>,
    }

    impl Default for UnitDef {
        fn default() -> Self {
            Self {
                attack: 1,
                speed: 1.0,
                tint: Color::WHITE,
                tags: Vec::new(),
            }
        }
    }

    impl DefFields for UnitDef {
        const TYPE_NAME: &'static str = "UnitDef";
    }

    fn layer(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(obj) => obj,
            _ => panic!("layer must be an object"),
        }
    }

    #[test]
    fn test_overlay_sets_only_present_keys() {
        let mut unit = UnitDef::default();
        let mut state = LayerState::default();
        overlay(&mut unit, &layer(json!({"Attack": 5})), &mut state).unwrap();
        overlay(&mut unit, &layer(json!({"Speed": 2.5})), &mut state).unwrap();
        assert_eq!(unit.attack, 5);
        assert_eq!(unit.speed, 2.5);
        assert!(state.extra.is_empty());
    }

    #[test]
    fn test_overlay_skips_header_keys() {
        let mut unit = UnitDef::default();
        let mut state = LayerState::default();
        let header = json!({"Name": "Archer", "Parent": "Base", "Class": "UnitDef", "Abstract": false,
                            "AllowAdditionalData": true});
        overlay(&mut unit, &layer(header), &mut state).unwrap();
        assert_eq!(unit, UnitDef::default());
        assert!(state.extra.is_empty());
    }

    #[test]
    fn test_overlay_collects_unknown_keys() {
        let mut unit = UnitDef::default();
        let mut state = LayerState::default();
        overlay(&mut unit, &layer(json!({"Foo": 10, "Attack": 3})), &mut state).unwrap();
        assert_eq!(unit.attack, 3);
        assert_eq!(state.extra.get("Foo"), Some(&json!(10)));
    }

    #[test]
    fn test_overlay_blames_offending_field() {
        let mut unit = UnitDef::default();
        let mut state = LayerState::default();
        let err = overlay(
            &mut unit,
            &layer(json!({"Attack": 4, "Tint": "1, 2"})),
            &mut state,
        )
        .unwrap_err();
        assert_eq!(err.field, "Tint");
        assert!(err.message.contains("color"), "{}", err.message);
        // Failed layer leaves the payload untouched.
        assert_eq!(unit.attack, 1);
    }

    #[test]
    fn test_overlay_replaces_collections_wholesale() {
        let mut unit = UnitDef::default();
        let mut state = LayerState::default();
        overlay(&mut unit, &layer(json!({"Tags": ["a", "b"]})), &mut state).unwrap();
        overlay(&mut unit, &layer(json!({"Tags": ["c"]})), &mut state).unwrap();
        assert_eq!(unit.tags, vec!["c".to_string()]);
    }

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase", default)]
    struct BannerDef {
        width: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        #[serde(skip_serializing)]
        sort_key: i32,
    }

    impl DefFields for BannerDef {
        const TYPE_NAME: &'static str = "BannerDef";
    }

    #[test]
    fn test_declared_fields_come_from_deserialize() {
        assert_eq!(declared_fields::<BannerDef>(), &["Width", "Icon", "SortKey"]);
        assert_eq!(declared_fields::<UnitDef>(), &["Attack", "Speed", "Tint", "Tags"]);
    }

    #[test]
    fn test_fields_hidden_from_serialization_are_not_extra() {
        let mut banner = BannerDef::default();
        let mut state = LayerState::default();
        overlay(
            &mut banner,
            &layer(json!({"Width": 2, "Icon": "flag.png", "SortKey": 7})),
            &mut state,
        )
        .unwrap();
        assert!(state.extra.is_empty(), "{:?}", state.extra);
        assert_eq!(banner.icon.as_deref(), Some("flag.png"));
        assert_eq!(banner.sort_key, 7);
    }

    #[test]
    fn test_hidden_fields_survive_later_layers() {
        let mut banner = BannerDef::default();
        let mut state = LayerState::default();
        overlay(&mut banner, &layer(json!({"SortKey": 4, "Icon": "a.png"})), &mut state).unwrap();
        overlay(&mut banner, &layer(json!({"Width": 3})), &mut state).unwrap();
        assert_eq!(banner.width, 3);
        assert_eq!(banner.sort_key, 4);
        assert_eq!(banner.icon.as_deref(), Some("a.png"));
    }
}
