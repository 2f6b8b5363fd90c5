//! Definition sources: opaque `(origin, text)` pairs.
//!
//! Files are read up front so nothing downstream performs I/O.

use std::path::Path;

use walkdir::WalkDir;

use crate::error::{DefError, ErrorReporter};

/// Raw definition text plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefSource {
    pub origin: String,
    pub text: String,
}

impl DefSource {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }

    /// Read a single file; the origin is its display path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DefError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DefError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// Collect every file under `root` whose extension matches `extension`.
///
/// Paths are sorted so id assignment does not depend on directory order.
/// A missing root is an error; unreadable entries are reported and skipped.
pub fn collect_dir(
    root: impl AsRef<Path>,
    recursive: bool,
    extension: &str,
    reporter: &mut ErrorReporter,
) -> Result<Vec<DefSource>, DefError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(DefError::Io {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "definition directory not found"),
        });
    }

    let walker = WalkDir::new(root)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut sources = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                reporter.report_message(&format!("{}: {}", root.display(), err));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if !matches {
            continue;
        }
        match DefSource::from_file(entry.path()) {
            Ok(source) => sources.push(source),
            Err(err) => reporter.report(err),
        }
    }

    tracing::debug!(root = %root.display(), count = sources.len(), recursive, "collected definition files");
    Ok(sources)
}
