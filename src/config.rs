use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DefError;
use crate::logging::TracingConfig;
use crate::types::BASE_TYPE;

/// Loader settings, usually read from a JSON file next to the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Rewrite a missing parent to `default_root` when a stub declares
    /// neither a parent nor a class.
    pub assume_default_parent: bool,
    pub default_root: String,
    pub file_extension: String,
    pub recursive: bool,
    pub logging: TracingConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            assume_default_parent: false,
            default_root: BASE_TYPE.into(),
            file_extension: "json".into(),
            recursive: true,
            logging: TracingConfig::default(),
        }
    }
}

impl LoaderConfig {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DefError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DefError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| DefError::Json {
            origin: path.display().to_string(),
            source,
        })
    }
}
