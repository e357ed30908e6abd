//! The two concurrent rounds of a reconciliation run.
//!
//! Each round spawns one worker per known task (document or identifier),
//! waits for all of them, and only then drains their completion queue:
//!
//! 1. [`parse::parse_round`] → [`parse::merge_datasets`] builds the master dataset.
//! 2. [`lookup::lookup_round`] → [`lookup::assemble_index`] builds the
//!    reconciliation index from it.

pub mod lookup;
pub mod parse;

use std::path::PathBuf;

use crate::config::LookupPolicy;
use crate::error::Result;
use crate::io::excel_read::SheetReader;
use crate::model::{Dataset, IdentifierSet, Record};
use crate::observe::PipelineObserver;

pub use lookup::{IndexAssembly, assemble_index, lookup_identifier, lookup_round};
pub use parse::{merge_datasets, parse_document, parse_round};

/// Runs the parsing round over `documents` and merges its output.
pub fn build_master_dataset<R, O>(
    reader: &R,
    documents: &[PathBuf],
    sheet: &str,
    observer: &O,
) -> Result<Dataset>
where
    R: SheetReader + ?Sized,
    O: PipelineObserver + ?Sized,
{
    let completed = parse_round(reader, documents, sheet, observer);
    merge_datasets(completed, observer)
}

/// Runs the lookup round for `identifiers` and assembles the index.
pub fn reconcile_identifiers<O>(
    identifiers: &IdentifierSet,
    master: &[Record],
    policy: LookupPolicy,
    observer: &O,
) -> IndexAssembly
where
    O: PipelineObserver + ?Sized,
{
    let outcomes = lookup_round(identifiers, master);
    assemble_index(outcomes, policy, observer)
}
