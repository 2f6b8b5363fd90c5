//! Loading pipeline: queue sources, process them as one batch, register.
//!
//! ```text
//! sources -> stubs -> lineage -> bound class -> composed Def -> DefDatabase
//! ```
//!
//! The source queue is drained by [`DefLoader::process_all`]; calling it again
//! without queueing new sources yields an empty batch.

use std::path::Path;

use crate::binder::bind;
use crate::compose::compose;
use crate::config::LoaderConfig;
use crate::database::DefDatabase;
use crate::def::{AbstractDef, Def};
use crate::error::{DefError, ErrorReporter};
use crate::logging::TimingSpan;
use crate::resolver::resolve;
use crate::source::{collect_dir, DefSource};
use crate::stub::{parse_batch, Stub, StubSet};
use crate::types::TypeRegistry;

/// Output of one [`DefLoader::process_all`] call, not yet registered.
#[derive(Debug, Default)]
pub struct Batch {
    pub defs: Vec<Def>,
    pub abstracts: Vec<AbstractDef>,
    /// Stubs and definitions dropped because of a reported error.
    pub rejected: usize,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty() && self.abstracts.is_empty()
    }
}

/// What [`DefLoader::load_into`] added to the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub registered: usize,
    pub abstracts: usize,
    pub rejected: usize,
}

pub struct DefLoader<'t> {
    config: LoaderConfig,
    types: &'t TypeRegistry,
    queue: Vec<DefSource>,
    reporter: ErrorReporter,
}

impl<'t> DefLoader<'t> {
    pub fn new(types: &'t TypeRegistry, config: LoaderConfig) -> Self {
        Self {
            config,
            types,
            queue: Vec::new(),
            reporter: ErrorReporter::new(),
        }
    }

    /// Forward every recoverable error to `callback` as `(message, cause)`.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&str, Option<&DefError>) + 'static,
    {
        self.reporter = ErrorReporter::with_callback(callback);
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn add_source(&mut self, source: DefSource) {
        self.queue.push(source);
    }

    pub fn add_text(&mut self, origin: impl Into<String>, text: impl Into<String>) {
        self.add_source(DefSource::new(origin, text));
    }

    /// Queue every matching file under `root`. Returns how many were queued.
    pub fn add_directory(&mut self, root: impl AsRef<Path>, recursive: bool) -> Result<usize, DefError> {
        let sources = collect_dir(root, recursive, &self.config.file_extension, &mut self.reporter)?;
        let count = sources.len();
        self.queue.extend(sources);
        Ok(count)
    }

    /// Number of sources waiting for the next batch.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn error_count(&self) -> usize {
        self.reporter.count()
    }

    pub fn reporter_mut(&mut self) -> &mut ErrorReporter {
        &mut self.reporter
    }

    /// Resolve every queued source.
    ///
    /// Names already present in `db` count as duplicates. Per-definition
    /// problems are reported and skipped; an unknown class name is reported
    /// and aborts the batch.
    pub fn process_all(&mut self, db: &DefDatabase) -> Result<Batch, DefError> {
        let _span = TimingSpan::new("process_all");
        let sources = std::mem::take(&mut self.queue);
        if sources.is_empty() {
            return Ok(Batch::default());
        }

        let source_count = sources.len();
        let stubs = parse_batch(sources, &self.config, |name| db.contains(name), &mut self.reporter);

        let mut batch = Batch {
            rejected: stubs.dropped(),
            ..Batch::default()
        };

        for stub in stubs.iter() {
            match self.materialize(stub, &stubs) {
                Ok(Some(def)) => batch.defs.push(def),
                Ok(None) => batch.abstracts.push(AbstractDef::from(stub)),
                Err(err) if err.is_batch_fatal() => {
                    self.reporter.report_ref(&err);
                    return Err(err);
                }
                Err(err) => {
                    batch.rejected += 1;
                    self.reporter.report(err);
                }
            }
        }

        tracing::debug!(
            sources = source_count,
            defs = batch.defs.len(),
            abstracts = batch.abstracts.len(),
            rejected = batch.rejected,
            "processed definition batch"
        );
        Ok(batch)
    }

    /// `Ok(None)` for abstract stubs, which only need a valid lineage.
    fn materialize(&self, stub: &Stub, stubs: &StubSet) -> Result<Option<Def>, DefError> {
        let lineage = resolve(stub, stubs, self.types)?;
        if stub.is_abstract {
            return Ok(None);
        }
        let def_type = bind(&lineage, self.types)?;
        let def = compose(&lineage, def_type)?;
        tracing::debug!(name = %def.name, class = def.type_name(), layers = lineage.len(), "composed definition");
        Ok(Some(def))
    }

    /// Process the queue and register the result into `db`.
    pub fn load_into(&mut self, db: &mut DefDatabase) -> Result<LoadSummary, DefError> {
        let batch = self.process_all(db)?;
        let mut summary = LoadSummary {
            rejected: batch.rejected,
            ..LoadSummary::default()
        };

        for node in batch.abstracts {
            match db.register_abstract(node) {
                Ok(()) => summary.abstracts += 1,
                Err(err) => {
                    summary.rejected += 1;
                    self.reporter.report(err);
                }
            }
        }
        for def in batch.defs {
            match db.register(def) {
                Ok(_) => summary.registered += 1,
                Err(err) => {
                    summary.rejected += 1;
                    self.reporter.report(err);
                }
            }
        }
        db.rebuild_children_index();

        tracing::info!(
            registered = summary.registered,
            abstracts = summary.abstracts,
            rejected = summary.rejected,
            total = db.len(),
            "loaded definitions"
        );
        Ok(summary)
    }
}
