use serde::{Deserialize, Serialize};

use crate::convert::{Color, SpriteRef, Vec2};
use crate::types::DefFields;

/// Decoration or overlay drawn on top of a tile (walls, doors, foliage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TileComponentDef {
    pub sprite: SpriteRef,
    pub tint: Color,
    pub offset: Vec2,
    /// Draw order within the tile, higher on top.
    pub layer: i32,
    pub blocks_movement: bool,
    pub blocks_sight: bool,
}

impl Default for TileComponentDef {
    fn default() -> Self {
        Self {
            sprite: SpriteRef::default(),
            tint: Color::WHITE,
            offset: Vec2::ZERO,
            layer: 0,
            blocks_movement: false,
            blocks_sight: false,
        }
    }
}

impl DefFields for TileComponentDef {
    const TYPE_NAME: &'static str = "TileComponentDef";
    const REAL_CLASS: Option<&'static str> = Some("TileComponent");
}
