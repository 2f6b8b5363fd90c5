//! Definition type registry.
//!
//! Logical class names (the `Class` key in data files) map to registered
//! [`DefType`] descriptors. Concrete types carry a zero-argument constructor;
//! abstract ones exist only to anchor the type hierarchy. The registry is an
//! owned value passed into the loader, never a global.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::compose::{overlay, FieldError, LayerState};

/// Logical name of the root supertype every definition class derives from.
pub const BASE_TYPE: &str = "Def";

/// Payload struct of a concrete definition class.
///
/// Field names in data files are the serde names of the struct, so payloads
/// usually carry `#[serde(rename_all = "PascalCase")]`.
pub trait DefFields: Serialize + DeserializeOwned + Default + fmt::Debug + 'static {
    /// Logical class name used in the `Class` key.
    const TYPE_NAME: &'static str;
    /// Parent class in the type hierarchy.
    const PARENT_TYPE: &'static str = BASE_TYPE;
    /// Runtime class spawned from definitions of this type.
    const REAL_CLASS: Option<&'static str> = None;
    /// Unknown keys are kept in `extra_fields` without raising an error.
    const ALLOW_ADDITIONAL_DATA: bool = false;
}

/// Object-safe view of a definition payload.
pub trait DefData: Any + fmt::Debug {
    fn type_name(&self) -> &'static str;

    /// Overlay one JSON layer onto the payload. Keys that are not fields of
    /// the payload are moved into `state.extra`.
    fn apply_layer(&mut self, layer: &Map<String, Value>, state: &mut LayerState) -> Result<(), FieldError>;

    /// Serialized form of the current field values.
    fn to_json(&self) -> Value;

    fn as_any(&self) -> &dyn Any;
}

impl<T: DefFields> DefData for T {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn apply_layer(&mut self, layer: &Map<String, Value>, state: &mut LayerState) -> Result<(), FieldError> {
        overlay(self, layer, state)
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub type Constructor = fn() -> Box<dyn DefData>;

fn construct<T: DefFields>() -> Box<dyn DefData> {
    Box::new(T::default())
}

/// Descriptor of a registered definition class.
#[derive(Clone)]
pub struct DefType {
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub real_class: Option<&'static str>,
    pub allow_additional_data: bool,
    constructor: Option<Constructor>,
}

impl DefType {
    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    /// Fresh default payload, or `None` for abstract types.
    pub fn instantiate(&self) -> Option<Box<dyn DefData>> {
        self.constructor.map(|ctor| ctor())
    }
}

impl fmt::Debug for DefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefType")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("real_class", &self.real_class)
            .field("instantiable", &self.is_instantiable())
            .finish()
    }
}

/// Registry of definition classes, keyed by logical name.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<&'static str, DefType>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Registry holding only the abstract [`BASE_TYPE`].
    pub fn new() -> Self {
        let mut types = HashMap::new();
        types.insert(
            BASE_TYPE,
            DefType {
                name: BASE_TYPE,
                parent: None,
                real_class: None,
                allow_additional_data: false,
                constructor: None,
            },
        );
        Self { types }
    }

    /// Register a concrete class. The first registration of a name wins.
    pub fn register<T: DefFields>(&mut self) -> &mut Self {
        self.insert(DefType {
            name: T::TYPE_NAME,
            parent: Some(T::PARENT_TYPE),
            real_class: T::REAL_CLASS,
            allow_additional_data: T::ALLOW_ADDITIONAL_DATA,
            constructor: Some(construct::<T>),
        })
    }

    /// Register a non-instantiable class used only for hierarchy checks.
    pub fn register_abstract(&mut self, name: &'static str, parent: &'static str) -> &mut Self {
        self.insert(DefType {
            name,
            parent: Some(parent),
            real_class: None,
            allow_additional_data: false,
            constructor: None,
        })
    }

    fn insert(&mut self, def_type: DefType) -> &mut Self {
        if self.types.contains_key(def_type.name) {
            tracing::warn!(class = def_type.name, "definition class registered twice, keeping the first");
        } else {
            tracing::debug!(class = def_type.name, parent = ?def_type.parent, "registered definition class");
            self.types.insert(def_type.name, def_type);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&DefType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// True if `sub` equals `sup` or derives from it.
    pub fn is_assignable(&self, sub: &str, sup: &str) -> bool {
        let mut current = Some(sub);
        // Bounded so a misregistered parent loop cannot spin forever.
        for _ in 0..=self.types.len() {
            let Some(name) = current else { return false };
            if name == sup {
                return true;
            }
            current = self.types.get(name).and_then(|t| t.parent);
        }
        false
    }

    /// `name` followed by each ancestor class up to the root.
    pub fn lineage(&self, name: &str) -> Vec<&'static str> {
        let mut chain = Vec::new();
        let mut current = self.types.get(name);
        while let Some(def_type) = current {
            if chain.contains(&def_type.name) {
                break;
            }
            chain.push(def_type.name);
            current = def_type.parent.and_then(|parent| self.types.get(parent));
        }
        chain
    }

    /// Names of every registered class, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.types.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct UnitDef {
        attack: i32,
    }

    impl DefFields for UnitDef {
        const TYPE_NAME: &'static str = "UnitDef";
        const PARENT_TYPE: &'static str = "ActorDef";
    }

    fn registry() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types.register_abstract("ActorDef", BASE_TYPE);
        types.register::<UnitDef>();
        types
    }

    #[test]
    fn test_base_type_is_abstract() {
        let types = TypeRegistry::new();
        let base = types.get(BASE_TYPE).unwrap();
        assert!(!base.is_instantiable());
        assert!(base.instantiate().is_none());
    }

    #[test]
    fn test_assignability_walks_hierarchy() {
        let types = registry();
        assert!(types.is_assignable("UnitDef", "UnitDef"));
        assert!(types.is_assignable("UnitDef", "ActorDef"));
        assert!(types.is_assignable("UnitDef", BASE_TYPE));
        assert!(!types.is_assignable("ActorDef", "UnitDef"));
        assert!(!types.is_assignable("Missing", BASE_TYPE));
    }

    #[test]
    fn test_lineage_runs_leaf_to_root() {
        let types = registry();
        assert_eq!(types.lineage("UnitDef"), vec!["UnitDef", "ActorDef", BASE_TYPE]);
        assert_eq!(types.lineage(BASE_TYPE), vec![BASE_TYPE]);
        assert!(types.lineage("Missing").is_empty());
    }

    #[test]
    fn test_instantiate_concrete() {
        let types = registry();
        let data = types.get("UnitDef").unwrap().instantiate().unwrap();
        assert_eq!(data.type_name(), "UnitDef");
        assert!(data.as_any().downcast_ref::<UnitDef>().is_some());
        assert_eq!(data.to_json(), serde_json::json!({"Attack": 0}));
    }

    #[test]
    fn test_first_registration_wins() {
        let mut types = registry();
        let before = types.len();
        types.register_abstract("UnitDef", BASE_TYPE);
        assert_eq!(types.len(), before);
        assert!(types.get("UnitDef").unwrap().is_instantiable());
    }
}
