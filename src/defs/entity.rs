use serde::{Deserialize, Serialize};

use crate::convert::{Color, IVec2, SpriteRef, Vec3};
use crate::types::DefFields;

/// Abstract class shared by everything that walks the map.
pub const ENTITY_DEF: &str = "EntityDef";

/// Fields common to all entity classes, flattened into each payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EntityFields {
    pub label: String,
    pub sprite: SpriteRef,
    pub tint: Color,
    pub health: i32,
    pub speed: f32,
    /// Footprint in tiles.
    pub size: IVec2,
}

impl Default for EntityFields {
    fn default() -> Self {
        Self {
            label: String::new(),
            sprite: SpriteRef::default(),
            tint: Color::WHITE,
            health: 100,
            speed: 1.0,
            size: IVec2::ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SoldierDef {
    #[serde(flatten)]
    pub entity: EntityFields,
    pub attack: i32,
    pub defence: i32,
    pub range: f32,
    /// Muzzle / weapon anchor relative to the sprite origin.
    pub weapon_offset: Vec3,
}

impl Default for SoldierDef {
    fn default() -> Self {
        Self {
            entity: EntityFields::default(),
            attack: 1,
            defence: 0,
            range: 1.0,
            weapon_offset: Vec3::ZERO,
        }
    }
}

impl DefFields for SoldierDef {
    const TYPE_NAME: &'static str = "SoldierDef";
    const PARENT_TYPE: &'static str = ENTITY_DEF;
    const REAL_CLASS: Option<&'static str> = Some("Soldier");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{declared_fields, overlay, LayerState};
    use serde_json::{json, Map, Value};

    fn layer(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_flattened_fields_are_overlaid() {
        let mut soldier = SoldierDef::default();
        let mut state = LayerState::default();
        overlay(
            &mut soldier,
            &layer(json!({"Health": 40, "Size": "2, 2", "Attack": 7, "Morale": 3})),
            &mut state,
        )
        .unwrap();
        assert_eq!(soldier.entity.health, 40);
        assert_eq!(soldier.entity.size, IVec2::new(2, 2));
        assert_eq!(soldier.attack, 7);
        assert_eq!(state.extra.get("Morale"), Some(&json!(3)));
    }

    #[test]
    fn test_flattened_payload_falls_back_to_serialized_keys() {
        // Flattened structs deserialize as maps and declare no field list.
        assert!(declared_fields::<SoldierDef>().is_empty());
        assert_eq!(declared_fields::<EntityFields>().len(), 6);
    }

    #[test]
    fn test_serialized_keys_are_pascal_case() {
        let value = serde_json::to_value(SoldierDef::default()).unwrap();
        let obj = value.as_object().unwrap();
        for key in ["Label", "Health", "Attack", "WeaponOffset"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
    }
}
