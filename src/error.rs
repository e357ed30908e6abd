use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Failure reported by a single lookup worker.
///
/// Kept separate from [`ReconcileError`] so it can travel inside a
/// [`TaskOutcome`](crate::model::TaskOutcome) and be compared in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The worker was handed an empty identifier.
    #[error("identifier must not be empty")]
    EmptyIdentifier,

    /// No record of the master dataset carries the identifier.
    #[error("no records found for identifier {0}")]
    IdentifierNotFound(String),

    /// The worker thread panicked before reporting an outcome.
    #[error("lookup worker panicked")]
    WorkerPanicked,
}

impl LookupError {
    /// Whether the failure is the expected "no match" outcome rather than an anomaly.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::IdentifierNotFound(_))
    }
}

/// Error type covering the different failure cases that can occur while the
/// tool reads documents, reconciles identifiers, or writes its outputs.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when a pure step receives a missing or malformed argument.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Raised when the source directory holds no document to parse.
    #[error("no source documents with extension '{extension}' found in {dir}")]
    NoSourcesFound { dir: PathBuf, extension: String },

    /// Raised when a document cannot be opened.
    #[error("failed to open document {path}: {reason}")]
    DocumentOpen { path: PathBuf, reason: String },

    /// Raised when the rows of a sheet cannot be read.
    #[error("failed to read sheet '{sheet}' of {path}: {reason}")]
    SheetRead {
        path: PathBuf,
        sheet: String,
        reason: String,
    },

    /// Raised when every source document failed or none yielded a record.
    #[error("no usable records were extracted from the source documents")]
    NoUsableData,

    /// Raised when index assembly stops on a fatal lookup outcome.
    #[error("index assembly aborted at identifier '{identifier}': {source}")]
    Aborted {
        identifier: String,
        #[source]
        source: LookupError,
    },

    /// Raised when a worker thread panicked instead of reporting a result.
    #[error("worker {worker} panicked while processing {subject}")]
    WorkerPanicked { worker: usize, subject: String },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
