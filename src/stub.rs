//! Stub parsing: raw JSON text into untyped definition skeletons.
//!
//! A stub keeps the header keys (`Name`, `Parent`, `Class`, `Abstract`,
//! `AllowAdditionalData`) split out and the full object as its overlay layer.
//! Stubs live for one batch and are dropped after materialization.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::config::LoaderConfig;
use crate::error::{DefError, ErrorReporter};
use crate::source::DefSource;

pub const KEY_NAME: &str = "Name";
pub const KEY_PARENT: &str = "Parent";
pub const KEY_CLASS: &str = "Class";
pub const KEY_ABSTRACT: &str = "Abstract";
pub const KEY_ALLOW_ADDITIONAL_DATA: &str = "AllowAdditionalData";

/// Keys consumed by the pipeline itself; never overlaid onto payloads.
pub const HEADER_KEYS: [&str; 5] = [
    KEY_NAME,
    KEY_PARENT,
    KEY_CLASS,
    KEY_ABSTRACT,
    KEY_ALLOW_ADDITIONAL_DATA,
];

/// Pre-resolution skeleton of a definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Stub {
    pub name: String,
    pub parent_name: Option<String>,
    pub declared_type: Option<String>,
    pub is_abstract: bool,
    /// `None` when the layer does not mention the key, so it can inherit.
    pub allow_additional_data: Option<bool>,
    pub origin: String,
    pub raw: Map<String, Value>,
}

/// Stubs of one batch, in parse order, indexed by name.
#[derive(Debug, Default)]
pub struct StubSet {
    stubs: Vec<Stub>,
    index: HashMap<String, usize>,
    dropped: usize,
}

impl StubSet {
    pub fn get(&self, name: &str) -> Option<&Stub> {
        self.index.get(name).map(|&i| &self.stubs[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stub> {
        self.stubs.iter()
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }

    /// Stubs rejected during parsing (source- and stub-level errors).
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn push(&mut self, stub: Stub) {
        self.index.insert(stub.name.clone(), self.stubs.len());
        self.stubs.push(stub);
    }
}

/// Parse a source into its top-level objects.
pub fn parse_source(source: &DefSource) -> Result<Vec<Map<String, Value>>, DefError> {
    let value: Value = serde_json::from_str(&source.text).map_err(|err| DefError::Json {
        origin: source.origin.clone(),
        source: err,
    })?;

    match value {
        Value::Object(obj) => Ok(vec![obj]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(obj) => Ok(obj),
                other => Err(DefError::BadShape {
                    origin: source.origin.clone(),
                    found: json_kind(&other),
                }),
            })
            .collect(),
        other => Err(DefError::BadShape {
            origin: source.origin.clone(),
            found: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Optional string header; `null` and blank strings count as absent.
fn header_str(
    obj: &Map<String, Value>,
    key: &'static str,
    name: &str,
    origin: &str,
) -> Result<Option<String>, DefError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(DefError::BadHeader {
            origin: origin.to_string(),
            name: name.to_string(),
            key,
            expected: "string",
        }),
    }
}

fn header_bool(
    obj: &Map<String, Value>,
    key: &'static str,
    name: &str,
    origin: &str,
) -> Result<Option<bool>, DefError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(DefError::BadHeader {
            origin: origin.to_string(),
            name: name.to_string(),
            key,
            expected: "boolean",
        }),
    }
}

/// Build a stub from one JSON object, applying stub-level validation.
pub fn stub_from_object(
    obj: Map<String, Value>,
    origin: &str,
    index: usize,
    config: &LoaderConfig,
) -> Result<Stub, DefError> {
    let name = match obj.get(KEY_NAME) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => {
            return Err(DefError::MissingName {
                origin: origin.to_string(),
                index,
            })
        }
    };

    let mut parent_name = header_str(&obj, KEY_PARENT, &name, origin)?;
    let declared_type = header_str(&obj, KEY_CLASS, &name, origin)?;
    let is_abstract = header_bool(&obj, KEY_ABSTRACT, &name, origin)?.unwrap_or(false);
    let allow_additional_data = header_bool(&obj, KEY_ALLOW_ADDITIONAL_DATA, &name, origin)?;

    if parent_name.as_deref() == Some(name.as_str()) {
        return Err(DefError::SelfParent {
            origin: origin.to_string(),
            name,
        });
    }

    if parent_name.is_none() && declared_type.is_none() {
        if config.assume_default_parent && name != config.default_root {
            parent_name = Some(config.default_root.clone());
        } else if !is_abstract {
            return Err(DefError::AmbiguousParent {
                origin: origin.to_string(),
                name,
            });
        }
    }

    Ok(Stub {
        name,
        parent_name,
        declared_type,
        is_abstract,
        allow_additional_data,
        origin: origin.to_string(),
        raw: obj,
    })
}

/// Parse a batch of sources into a [`StubSet`].
///
/// `is_taken` reports names that already exist outside the batch (for
/// example in the target database). Duplicates are dropped, never overwritten.
pub fn parse_batch<F>(
    sources: Vec<DefSource>,
    config: &LoaderConfig,
    is_taken: F,
    reporter: &mut ErrorReporter,
) -> StubSet
where
    F: Fn(&str) -> bool,
{
    let mut set = StubSet::default();

    for source in sources {
        let objects = match parse_source(&source) {
            Ok(objects) => objects,
            Err(err) => {
                set.dropped += 1;
                reporter.report(err);
                continue;
            }
        };

        for (index, obj) in objects.into_iter().enumerate() {
            let stub = match stub_from_object(obj, &source.origin, index, config) {
                Ok(stub) => stub,
                Err(err) => {
                    set.dropped += 1;
                    reporter.report(err);
                    continue;
                }
            };

            if set.contains(&stub.name) || is_taken(&stub.name) {
                set.dropped += 1;
                reporter.report(DefError::DuplicateName {
                    origin: stub.origin,
                    name: stub.name,
                });
                continue;
            }

            set.push(stub);
        }
    }

    tracing::debug!(stubs = set.len(), dropped = set.dropped, "parsed definition stubs");
    set
}
