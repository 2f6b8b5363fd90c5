//! Error taxonomy for the definition pipeline.
//!
//! Every recoverable problem is funnelled through an [`ErrorReporter`] so a
//! single malformed definition never aborts the batch. Only an unknown class
//! name escapes as an `Err`, since it means the host program is missing a type.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading, resolving, registering or binding definitions.
#[derive(Debug, Error)]
pub enum DefError {
    // --- source-level: the whole source is skipped ---
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{origin}: malformed JSON: {source}")]
    Json {
        origin: String,
        source: serde_json::Error,
    },
    #[error("{origin}: expected an object or an array of objects, found {found}")]
    BadShape { origin: String, found: &'static str },

    // --- stub-level: the stub is dropped ---
    #[error("{origin}: definition #{index} has no name")]
    MissingName { origin: String, index: usize },
    #[error("{origin}: '{name}' has a '{key}' header that is not a {expected}")]
    BadHeader {
        origin: String,
        name: String,
        key: &'static str,
        expected: &'static str,
    },
    #[error("{origin}: '{name}' declares itself as its parent")]
    SelfParent { origin: String, name: String },
    #[error("{origin}: '{name}' declares neither a parent nor a class")]
    AmbiguousParent { origin: String, name: String },
    #[error("{origin}: duplicate definition name '{name}', keeping the first one")]
    DuplicateName { origin: String, name: String },

    // --- resolution-level: the definition is rejected ---
    #[error("{origin}: cyclic parenting for '{name}' ({chain})")]
    CyclicParent {
        origin: String,
        name: String,
        chain: String,
    },
    #[error("{origin}: '{name}' has missing parent '{parent}'")]
    MissingParent {
        origin: String,
        name: String,
        parent: String,
    },
    #[error(
        "{origin}: '{name}' resolves to class '{class}', which is not assignable to \
         '{ancestor_class}' declared by ancestor '{ancestor}'"
    )]
    IncompatibleType {
        origin: String,
        name: String,
        class: String,
        ancestor: String,
        ancestor_class: String,
    },

    // --- binding-level ---
    #[error("unknown definition class '{class}' referenced by '{name}' ({origin})")]
    UnknownType {
        origin: String,
        name: String,
        class: String,
    },
    #[error("{origin}: no class declared anywhere in the inheritance chain of '{name}'")]
    NoType { origin: String, name: String },
    #[error("{origin}: '{name}' uses the base class '{class}' directly")]
    BaseType {
        origin: String,
        name: String,
        class: String,
    },
    #[error("{origin}: '{name}' resolves to abstract class '{class}'")]
    AbstractType {
        origin: String,
        name: String,
        class: String,
    },

    // --- composition-level ---
    #[error(
        "{origin}: '{name}': field '{field}' of {class} from layer '{layer}' ({layer_origin}) \
         is invalid: {message}"
    )]
    Field {
        origin: String,
        name: String,
        class: String,
        layer: String,
        layer_origin: String,
        field: String,
        message: String,
    },
    #[error("{origin}: '{name}' has unknown fields [{fields}] and does not allow additional data")]
    AdditionalData {
        origin: String,
        name: String,
        fields: String,
    },

    // --- database-level ---
    #[error("definition '{name}' is already registered")]
    DuplicateRegistration { name: String },
    #[error("definition id space exhausted while registering '{name}'")]
    IdsExhausted { name: String },

    // --- runtime bindings ---
    #[error("{class}: designated provider is unusable: {reason}")]
    ProviderShape { class: String, reason: String },
    #[error("{class}: constructor on '{real_class}' is unusable: {reason}")]
    ConstructorShape {
        class: String,
        real_class: String,
        reason: String,
    },
    #[error("{class}: no runtime class declared")]
    NoRuntimeClass { class: String },
    #[error("{class}: no provider or constructor bound for runtime class '{real_class}'")]
    NoStrategy { class: String, real_class: String },
}

impl DefError {
    /// True for errors that abort the whole batch instead of one definition.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, DefError::UnknownType { .. })
    }
}

/// Callback invoked once per reported error: `(message, cause)`.
pub type ErrorCallback = Box<dyn FnMut(&str, Option<&DefError>)>;

/// Single sink for recoverable errors.
///
/// Each report is logged through `tracing` and forwarded to the optional
/// callback. The running count lets callers check how many problems a batch hit.
#[derive(Default)]
pub struct ErrorReporter {
    callback: Option<ErrorCallback>,
    count: usize,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback<F>(callback: F) -> Self
    where
        F: FnMut(&str, Option<&DefError>) + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
            count: 0,
        }
    }

    /// Report a typed error.
    pub fn report(&mut self, err: DefError) {
        self.report_ref(&err);
    }

    /// Report a typed error the caller still needs, e.g. to return it.
    pub fn report_ref(&mut self, err: &DefError) {
        let message = err.to_string();
        tracing::error!(target: "tower_defs", "{}", message);
        self.count += 1;
        if let Some(callback) = self.callback.as_mut() {
            callback(&message, Some(err));
        }
    }

    /// Report a problem that has no underlying [`DefError`].
    pub fn report_message(&mut self, message: &str) {
        tracing::error!(target: "tower_defs", "{}", message);
        self.count += 1;
        if let Some(callback) = self.callback.as_mut() {
            callback(message, None);
        }
    }

    /// Number of errors reported so far.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("has_callback", &self.callback.is_some())
            .field("count", &self.count)
            .finish()
    }
}
