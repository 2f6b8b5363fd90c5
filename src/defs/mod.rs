//! Built-in definition families.
//!
//! Class hierarchy:
//!   Def
//!   ├── TileDef           (runtime class "Tile")
//!   ├── TileComponentDef  (runtime class "TileComponent")
//!   └── EntityDef         (abstract)
//!       └── SoldierDef    (runtime class "Soldier")
//!
//! Other crates add their own classes by calling `TypeRegistry::register`
//! on the same registry before loading.

pub mod component;
pub mod entity;
pub mod tile;

pub use component::TileComponentDef;
pub use entity::{EntityFields, SoldierDef, ENTITY_DEF};
pub use tile::TileDef;

use crate::types::{TypeRegistry, BASE_TYPE};

/// Register every built-in class on `types`.
pub fn register_builtin(types: &mut TypeRegistry) {
    types
        .register::<TileDef>()
        .register::<TileComponentDef>()
        .register_abstract(ENTITY_DEF, BASE_TYPE)
        .register::<SoldierDef>();
}

/// A fresh registry holding the base class and the built-in families.
pub fn builtin_types() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    register_builtin(&mut types);
    types
}
