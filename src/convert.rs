//! Compact string encodings for definition fields.
//!
//! Data files write small vectors and colors as comma-separated strings:
//! - Color: `"R, G, B"` or `"R, G, B, A"` (bytes, alpha defaults to 255)
//! - 2D vector / point: `"X, Y"`
//! - 3D vector: `"X, Y, Z"`
//! - Sprite reference: a bare content path
//!
//! Each type round-trips through serde as a string, so payload structs can
//! use them directly as fields.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("{kind} expects {expected} comma-separated components, got {found} in \"{input}\"")]
    Arity {
        kind: &'static str,
        expected: &'static str,
        found: usize,
        input: String,
    },
    #[error("{kind} component #{index} \"{component}\" is not a valid number")]
    Component {
        kind: &'static str,
        index: usize,
        component: String,
    },
    #[error("{kind} must not be blank")]
    Blank { kind: &'static str },
}

/// Split `input` on commas and parse each trimmed component.
fn parse_components<T: FromStr>(kind: &'static str, input: &str) -> Result<Vec<T>, ConvertError> {
    input
        .split(',')
        .enumerate()
        .map(|(index, raw)| {
            let component = raw.trim();
            component.parse::<T>().map_err(|_| ConvertError::Component {
                kind,
                index,
                component: component.to_string(),
            })
        })
        .collect()
}

fn arity(kind: &'static str, expected: &'static str, found: usize, input: &str) -> ConvertError {
    ConvertError::Arity {
        kind,
        expected,
        found,
        input: input.to_string(),
    }
}

/// Implements string-backed serde for a type with `FromStr` + `Display`.
macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(de::Error::custom)
            }
        }
    };
}

// ============================================================
// Color
// ============================================================

/// RGBA color with byte components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl FromStr for Color {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<u8> = parse_components("color", s)?;
        match parts.as_slice() {
            [r, g, b] => Ok(Color::rgb(*r, *g, *b)),
            [r, g, b, a] => Ok(Color::rgba(*r, *g, *b, *a)),
            _ => Err(arity("color", "3 or 4", parts.len(), s)),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}, {}", self.r, self.g, self.b, self.a)
    }
}

string_serde!(Color);

// ============================================================
// Vectors
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl FromStr for Vec2 {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f32> = parse_components("vector2", s)?;
        match parts.as_slice() {
            [x, y] => Ok(Vec2::new(*x, *y)),
            _ => Err(arity("vector2", "2", parts.len(), s)),
        }
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

string_serde!(Vec2);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl FromStr for Vec3 {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f32> = parse_components("vector3", s)?;
        match parts.as_slice() {
            [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
            _ => Err(arity("vector3", "3", parts.len(), s)),
        }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.z)
    }
}

string_serde!(Vec3);

/// Integer point, used for tile coordinates and footprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IVec2 {
    pub x: i32,
    pub y: i32,
}

impl IVec2 {
    pub const ONE: IVec2 = IVec2::new(1, 1);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl FromStr for IVec2 {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<i32> = parse_components("point", s)?;
        match parts.as_slice() {
            [x, y] => Ok(IVec2::new(*x, *y)),
            _ => Err(arity("point", "2", parts.len(), s)),
        }
    }
}

impl fmt::Display for IVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

string_serde!(IVec2);

// ============================================================
// Sprite reference
// ============================================================

/// Content path of a sprite. Resolution against the atlas happens in the
/// renderer; here the path is only normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpriteRef(String);

impl SpriteRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &str {
        &self.0
    }

    /// An unset sprite serializes as the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for SpriteRef {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim();
        if path.is_empty() {
            // Allowed so an inherited sprite can be cleared.
            if s.is_empty() {
                return Ok(SpriteRef::default());
            }
            return Err(ConvertError::Blank { kind: "sprite path" });
        }
        Ok(SpriteRef(path.replace('\\', "/")))
    }
}

impl fmt::Display for SpriteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

string_serde!(SpriteRef);
