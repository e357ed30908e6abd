use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use tracing::instrument;

use crate::error::{ReconcileError, Result};
use crate::io::excel_read::SheetReader;
use crate::model::{Dataset, Record};
use crate::observe::PipelineObserver;

/// Extracts the qualifying records of one document, in row order.
pub fn parse_document<R>(reader: &R, path: &Path, sheet: &str) -> Result<Dataset>
where
    R: SheetReader + ?Sized,
{
    let rows = reader.read_rows(path, sheet)?;
    Ok(rows.iter().filter_map(|row| Record::from_row(row)).collect())
}

/// Parses every document on its own thread and returns the completion queue.
///
/// The queue holds one dataset per document and is closed once every worker
/// finished, so draining it never blocks. A document that cannot be read is
/// reported to `observer` and contributes an empty dataset.
#[instrument(level = "info", skip_all, fields(documents = documents.len()))]
pub fn parse_round<R, O>(
    reader: &R,
    documents: &[PathBuf],
    sheet: &str,
    observer: &O,
) -> Receiver<Dataset>
where
    R: SheetReader + ?Sized,
    O: PipelineObserver + ?Sized,
{
    let (sender, receiver) = mpsc::sync_channel(documents.len());

    thread::scope(|scope| {
        let handles: Vec<_> = documents
            .iter()
            .enumerate()
            .map(|(idx, path)| {
                let worker = idx + 1;
                let sender = sender.clone();
                let handle = scope.spawn(move || {
                    let dataset = match parse_document(reader, path, sheet) {
                        Ok(dataset) => {
                            observer.document_parsed(worker, path, dataset.len());
                            dataset
                        }
                        Err(error) => {
                            observer.document_failed(worker, path, &error);
                            Dataset::new()
                        }
                    };
                    // capacity matches the worker count and the receiver outlives the scope
                    let _ = sender.send(dataset);
                });
                (worker, path, handle)
            })
            .collect();

        for (worker, path, handle) in handles {
            if handle.join().is_err() {
                let error = ReconcileError::WorkerPanicked {
                    worker,
                    subject: path.display().to_string(),
                };
                observer.document_failed(worker, path, &error);
            }
        }
    });

    drop(sender);
    receiver
}

/// Concatenates the datasets of a finished parsing round.
///
/// Each dataset keeps its internal order; no order is imposed between them.
/// Fails with [`ReconcileError::NoUsableData`] when nothing was extracted.
pub fn merge_datasets<I, O>(datasets: I, observer: &O) -> Result<Dataset>
where
    I: IntoIterator<Item = Dataset>,
    O: PipelineObserver + ?Sized,
{
    let mut merged = Dataset::new();
    for dataset in datasets {
        if dataset.is_empty() {
            continue;
        }
        merged.extend(dataset);
    }

    if merged.is_empty() {
        return Err(ReconcileError::NoUsableData);
    }
    observer.datasets_merged(merged.len());
    Ok(merged)
}
