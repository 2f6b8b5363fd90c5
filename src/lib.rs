//! Tower Definitions - data-driven template loader
//!
//! This crate turns loosely structured JSON documents into a validated forest
//! of typed definitions used as spawn templates by the rest of the game:
//! - Stub parsing (header keys, default parent, duplicate filtering)
//! - Data inheritance (parent chains, cycle and type-narrowing checks)
//! - Type binding against an owned registry of definition classes
//! - Overlay composition (root-to-leaf field overrides, extra fields)
//! - Definition database (ids, name index, children index)
//! - Runtime bindings (provider/constructor tables per definition family)
//! - Compact value converters (colors, vectors, sprite paths)

pub mod binder;
pub mod compose;
pub mod config;
pub mod convert;
pub mod database;
pub mod def;
pub mod defs;
pub mod error;
pub mod factory;
pub mod loader;
pub mod logging;
pub mod resolver;
pub mod source;
pub mod stub;
pub mod types;

pub use config::LoaderConfig;
pub use database::DefDatabase;
pub use def::{AbstractDef, Def, DefId};
pub use error::{DefError, ErrorReporter};
pub use factory::{ApplyDef, Bindings, RuntimeRegistry};
pub use loader::{Batch, DefLoader, LoadSummary};
pub use source::DefSource;
pub use types::{DefData, DefFields, DefType, TypeRegistry, BASE_TYPE};
