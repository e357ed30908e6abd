use std::path::Path;

use tracing::instrument;

use crate::error::{ReconcileError, Result};
use crate::io::excel_read::SheetReader;
use crate::model::{Identifier, IdentifierSet, columns, is_valid_identifier};
use crate::observe::PipelineObserver;

/// Reads the candidate identifiers of the master document, in row order.
///
/// A row contributes its identifier cell when the row is wider than eight
/// cells and the value is exactly twelve characters long. Duplicates are kept.
#[instrument(level = "debug", skip_all, fields(path = %path.display(), sheet = %sheet))]
pub fn read_candidates<R, O>(
    reader: &R,
    path: &Path,
    sheet: &str,
    observer: &O,
) -> Result<Vec<Identifier>>
where
    R: SheetReader + ?Sized,
    O: PipelineObserver + ?Sized,
{
    let rows = reader.read_rows(path, sheet)?;
    let candidates: Vec<Identifier> = rows
        .into_iter()
        .filter(|row| row.len() >= columns::MIN_ROW_WIDTH)
        .filter_map(|mut row| {
            let value = row.swap_remove(columns::IDENTIFIER);
            is_valid_identifier(&value).then_some(value)
        })
        .collect();
    observer.candidates_read(path, candidates.len());
    Ok(candidates)
}

/// Deduplicates candidate identifiers.
///
/// `None` means the candidates were never produced and is rejected; an empty
/// slice yields an empty set.
pub fn build_identifier_set(candidates: Option<&[Identifier]>) -> Result<IdentifierSet> {
    let candidates = candidates
        .ok_or_else(|| ReconcileError::InvalidInput("identifier candidates are missing".into()))?;
    Ok(candidates.iter().cloned().collect())
}
