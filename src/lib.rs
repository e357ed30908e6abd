//! Core library for the product-reconcile command line application.
//!
//! The library reconciles the product identifiers of a master workbook against
//! a directory of source workbooks. IO adapters live under [`io`], data
//! representations inside [`model`], the concurrent parse and lookup rounds in
//! [`pipeline`], best-record selection in [`reduce`], and the end-to-end run
//! under [`run`].

pub mod config;
pub mod error;
pub mod identifiers;
pub mod io;
pub mod model;
pub mod observe;
pub mod pipeline;
pub mod reduce;
pub mod run;

pub use config::{LookupPolicy, ReconcileConfig};
pub use error::{LookupError, ReconcileError, Result};
pub use observe::{PipelineObserver, TracingObserver};
