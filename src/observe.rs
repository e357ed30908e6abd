//! Progress reporting for the pipeline.
//!
//! Every pipeline step receives a [`PipelineObserver`] instead of logging on
//! its own, so callers decide where progress goes. [`TracingObserver`] forwards
//! the events to `tracing`; tests plug in observers that record them.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{LookupError, ReconcileError};

/// Receives progress and per-task failures from the pipeline.
///
/// All methods default to doing nothing. Implementations are shared between
/// worker threads and must therefore be `Sync`.
pub trait PipelineObserver: Sync {
    fn candidates_read(&self, _path: &Path, _candidates: usize) {}

    fn identifiers_collected(&self, _unique: usize) {}

    fn documents_located(&self, _count: usize) {}

    fn document_parsed(&self, _worker: usize, _path: &Path, _records: usize) {}

    /// A document could not be read; the round continues without it.
    fn document_failed(&self, _worker: usize, _path: &Path, _error: &ReconcileError) {}

    fn datasets_merged(&self, _records: usize) {}

    /// An identifier had no match and was skipped.
    fn identifier_unmatched(&self, _identifier: &str) {}

    /// A lookup outcome that stopped index assembly.
    fn lookup_aborted(&self, _identifier: &str, _error: &LookupError) {}

    fn index_assembled(&self, _entries: usize, _unmatched: usize) {}

    fn selection_reduced(&self, _entries: usize) {}

    fn report_written(&self, _path: &Path, _rows: usize) {}

    fn master_patched(&self, _path: &Path, _updated_rows: usize) {}
}

/// Observer that emits every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn candidates_read(&self, path: &Path, candidates: usize) {
        info!(path = %path.display(), candidates, "read identifier candidates from master");
    }

    fn identifiers_collected(&self, unique: usize) {
        info!(unique, "collected unique identifiers");
    }

    fn documents_located(&self, count: usize) {
        info!(count, "located source documents");
    }

    fn document_parsed(&self, worker: usize, path: &Path, records: usize) {
        debug!(worker, path = %path.display(), records, "parsed source document");
    }

    fn document_failed(&self, worker: usize, path: &Path, error: &ReconcileError) {
        warn!(worker, path = %path.display(), %error, "skipping unreadable source document");
    }

    fn datasets_merged(&self, records: usize) {
        info!(records, "merged source datasets");
    }

    fn identifier_unmatched(&self, identifier: &str) {
        debug!(identifier, "no source records for identifier");
    }

    fn lookup_aborted(&self, identifier: &str, error: &LookupError) {
        warn!(identifier, %error, "lookup failure stopped index assembly");
    }

    fn index_assembled(&self, entries: usize, unmatched: usize) {
        info!(entries, unmatched, "reconciliation index assembled");
    }

    fn selection_reduced(&self, entries: usize) {
        info!(entries, "selected best record per identifier");
    }

    fn report_written(&self, path: &Path, rows: usize) {
        info!(path = %path.display(), rows, "report written");
    }

    fn master_patched(&self, path: &Path, updated_rows: usize) {
        info!(path = %path.display(), updated_rows, "master copy patched");
    }
}
