use serde::{Deserialize, Serialize};

use crate::convert::{Color, SpriteRef};
use crate::types::DefFields;

/// Map tile template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TileDef {
    pub label: String,
    pub description: String,
    pub sprite: SpriteRef,
    pub tint: Color,
    pub walkable: bool,
    /// Path cost multiplier; 1.0 is open ground.
    pub move_cost: f32,
    /// Names of `TileComponentDef`s placed on the tile when spawned.
    pub components: Vec<String>,
}

impl Default for TileDef {
    fn default() -> Self {
        Self {
            label: String::new(),
            description: String::new(),
            sprite: SpriteRef::default(),
            tint: Color::WHITE,
            walkable: true,
            move_cost: 1.0,
            components: Vec::new(),
        }
    }
}

impl DefFields for TileDef {
    const TYPE_NAME: &'static str = "TileDef";
    const REAL_CLASS: Option<&'static str> = Some("Tile");
}
