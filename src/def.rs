//! Materialized definitions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::stub::Stub;
use crate::types::{DefData, DefFields};

/// Numeric id of a registered definition. `0` means "no definition".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct DefId(pub u16);

impl DefId {
    pub const NONE: DefId = DefId(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "DefId(NONE)")
        } else {
            write!(f, "DefId({})", self.0)
        }
    }
}

/// A resolved, typed definition: shared header plus a class-specific payload.
#[derive(Debug)]
pub struct Def {
    pub name: String,
    pub parent_name: Option<String>,
    /// Assigned on registration; [`DefId::NONE`] until then.
    pub id: DefId,
    pub file_origin: String,
    /// Keys from any layer that are not fields of the payload.
    pub extra_fields: Map<String, Value>,
    data: Box<dyn DefData>,
}

impl Def {
    pub fn new(
        name: impl Into<String>,
        parent_name: Option<String>,
        file_origin: impl Into<String>,
        extra_fields: Map<String, Value>,
        data: Box<dyn DefData>,
    ) -> Self {
        Self {
            name: name.into(),
            parent_name,
            id: DefId::NONE,
            file_origin: file_origin.into(),
            extra_fields,
            data,
        }
    }

    /// Logical class name of the payload.
    pub fn type_name(&self) -> &'static str {
        self.data.type_name()
    }

    /// Typed payload access; `None` if the payload is another class.
    pub fn data<T: DefFields>(&self) -> Option<&T> {
        self.data.as_any().downcast_ref::<T>()
    }

    pub fn is<T: DefFields>(&self) -> bool {
        self.data::<T>().is_some()
    }

    pub fn payload(&self) -> &dyn DefData {
        self.data.as_ref()
    }

    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra_fields.get(key)
    }
}

/// Abstract node of the inheritance forest. Never spawnable, never has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractDef {
    pub name: String,
    pub parent_name: Option<String>,
    pub file_origin: String,
    pub declared_type: Option<String>,
}

impl From<&Stub> for AbstractDef {
    fn from(stub: &Stub) -> Self {
        Self {
            name: stub.name.clone(),
            parent_name: stub.parent_name.clone(),
            file_origin: stub.origin.clone(),
            declared_type: stub.declared_type.clone(),
        }
    }
}
