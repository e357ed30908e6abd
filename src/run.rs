use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, Result};
use crate::identifiers::{build_identifier_set, read_candidates};
use crate::io::excel_read::SheetReader;
use crate::io::{excel_write, locate};
use crate::observe::PipelineObserver;
use crate::pipeline::{build_master_dataset, reconcile_identifiers};
use crate::reduce::select_best;

/// Counts and output locations of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub candidates: usize,
    pub identifiers: usize,
    pub documents: usize,
    pub master_records: usize,
    pub matched: usize,
    pub unmatched: Vec<String>,
    pub report_rows: usize,
    pub report_path: PathBuf,
    pub patched_rows: usize,
    pub patched_path: Option<PathBuf>,
}

/// Reconciles the master document against every source document and writes
/// the report and, unless disabled, the patched master copy.
#[instrument(
    level = "info",
    skip_all,
    fields(master = %config.master_path.display(), sources = %config.sources_dir.display())
)]
pub fn reconcile<R, O>(config: &ReconcileConfig, reader: &R, observer: &O) -> Result<RunSummary>
where
    R: SheetReader + ?Sized,
    O: PipelineObserver + ?Sized,
{
    config.validate()?;
    if !config.master_path.exists() {
        return Err(ReconcileError::MissingInput(config.master_path.clone()));
    }

    let candidates = read_candidates(reader, &config.master_path, &config.sheet_name, observer)?;
    let identifiers = build_identifier_set(Some(candidates.as_slice()))?;
    observer.identifiers_collected(identifiers.len());

    let documents = locate::locate_documents(&config.sources_dir, &config.extension)?;
    observer.documents_located(documents.len());

    let master = build_master_dataset(reader, &documents, &config.sheet_name, observer)?;
    let assembly =
        reconcile_identifiers(&identifiers, &master, config.lookup_policy, observer);
    let unmatched = assembly.unmatched.clone();
    let index = assembly.into_result()?;

    let report_path = config.report_path();
    let report_rows = excel_write::write_report(&report_path, &index)?;
    observer.report_written(&report_path, report_rows);

    let mut summary = RunSummary {
        candidates: candidates.len(),
        identifiers: identifiers.len(),
        documents: documents.len(),
        master_records: master.len(),
        matched: index.len(),
        unmatched,
        report_rows,
        report_path,
        patched_rows: 0,
        patched_path: None,
    };

    if config.skip_patch {
        info!("patching of the master copy disabled");
        return Ok(summary);
    }

    let selection = select_best(&index, observer);
    let copy = locate::copy_to_work_dir(&config.master_path, &config.work_dir)?;
    summary.patched_rows = excel_write::patch_workbook(
        &copy,
        &config.sheet_name,
        &selection,
        config.patch_start_row,
        &config.patch_header_label,
    )?;
    observer.master_patched(&copy, summary.patched_rows);
    summary.patched_path = Some(copy);

    Ok(summary)
}
