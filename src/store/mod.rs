//! File-backed hierarchical result store
//!
//! One container file per pipeline, two addressing levels: stage index,
//! then run index (dense, zero-based, in execution order). Each run holds
//! the parameter binding that produced it as scalar attributes plus zero
//! or more named result fields.
//!
//! **Append-Only Write Pattern**: a `(stage, run)` coordinate is written
//! exactly once and never mutated; resetting requires an explicit
//! [`prepare`](ResultStore::prepare) with `overwrite = true`. Discipline is
//! single-writer within one process; concurrent multi-process access is
//! unsupported.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::{binding_to_string, Binding, Fields};
use crate::{Error, Result};

/// Container format version written into the manifest.
const FORMAT_VERSION: u32 = 1;

/// One persisted run: the binding that produced it plus its result fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    params: Binding,
    fields: Fields,
}

impl RunEntry {
    /// The parameter binding, fixed at write time.
    #[must_use]
    pub const fn params(&self) -> &Binding {
        &self.params
    }

    /// The named result fields.
    #[must_use]
    pub const fn fields(&self) -> &Fields {
        &self.fields
    }
}

/// On-disk document: manifest plus the stage/run hierarchy.
///
/// Integer keys serialize as stringified indices, and `BTreeMap` keeps
/// numeric order, so storage order equals execution order for dense runs.
#[derive(Debug, Serialize, Deserialize)]
struct StoreDoc {
    version: u32,
    created_at: DateTime<Utc>,
    stages: BTreeMap<usize, BTreeMap<usize, RunEntry>>,
}

impl StoreDoc {
    fn fresh() -> Self {
        Self {
            version: FORMAT_VERSION,
            created_at: Utc::now(),
            stages: BTreeMap::new(),
        }
    }
}

/// Append-only, key-addressable store for sweep results.
pub struct ResultStore {
    path: PathBuf,
    doc: StoreDoc,
}

impl ResultStore {
    /// Handle on a store at `path`. No IO happens until
    /// [`prepare`](Self::prepare) or the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            doc: StoreDoc::fresh(),
        }
    }

    /// Open an existing store for reading, failing if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read or
    /// [`Error::Serde`] if it does not parse as a container.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = Self::read_doc(&path)?;
        Ok(Self { path, doc })
    }

    /// Create or load the backing file.
    ///
    /// With `overwrite = true`, or when no file exists yet, the store is
    /// reset to empty and written out. Otherwise existing content is loaded
    /// untouched (the file itself is only read), which makes the call
    /// idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Serde`] on an unreadable or
    /// malformed container.
    pub fn prepare(&mut self, overwrite: bool) -> Result<()> {
        if overwrite || !self.path.exists() {
            tracing::debug!(path = %self.path.display(), overwrite, "initializing result store");
            self.doc = StoreDoc::fresh();
            self.flush()?;
        } else {
            tracing::debug!(path = %self.path.display(), "loading existing result store");
            self.doc = Self::read_doc(&self.path)?;
        }
        Ok(())
    }

    /// Write one run's binding and fields at `(stage, run)` and persist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRun`] if the coordinate already exists;
    /// the original entry is left unmodified. IO and serialization errors
    /// propagate as [`Error::Io`] / [`Error::Serde`].
    pub fn write_run(
        &mut self,
        stage: usize,
        run: usize,
        binding: Binding,
        fields: Fields,
    ) -> Result<()> {
        let runs = self.doc.stages.entry(stage).or_default();
        if runs.contains_key(&run) {
            return Err(Error::DuplicateRun { stage, run });
        }
        runs.insert(run, RunEntry { params: binding, fields });
        self.flush()
    }

    /// Find the fields of the first run in `stage` whose stored binding
    /// equals `binding` exactly (all keys, all values).
    ///
    /// Linear scan in storage order, O(runs) per call; uniqueness is not
    /// guaranteed and ties resolve to the first-written run. Callers that
    /// need faster lookup keep their own index.
    #[must_use]
    pub fn lookup(&self, stage: usize, binding: &Binding) -> Option<&Fields> {
        self.doc
            .stages
            .get(&stage)?
            .values()
            .find(|entry| &entry.params == binding)
            .map(RunEntry::fields)
    }

    /// Read-only traversal of one stage in storage order.
    pub fn iterate_stage(&self, stage: usize) -> impl Iterator<Item = (usize, &RunEntry)> {
        self.doc
            .stages
            .get(&stage)
            .into_iter()
            .flat_map(|runs| runs.iter().map(|(&run, entry)| (run, entry)))
    }

    /// Number of stages holding at least one run.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.doc.stages.len()
    }

    /// Number of runs written to `stage`.
    #[must_use]
    pub fn run_count(&self, stage: usize) -> usize {
        self.doc.stages.get(&stage).map_or(0, BTreeMap::len)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Manifest creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.doc.created_at
    }

    /// Render a dependency-lookup failure for `binding` against `stage`.
    pub(crate) fn missing_dependency(stage: usize, binding: &Binding) -> Error {
        Error::DependencyLookup {
            stage,
            binding: binding_to_string(binding),
        }
    }

    fn read_doc(path: &Path) -> Result<StoreDoc> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn flush(&self) -> Result<()> {
        let file = File::create(&self.path)?;
        serde_json::to_writer(BufWriter::new(file), &self.doc)?;
        Ok(())
    }
}
