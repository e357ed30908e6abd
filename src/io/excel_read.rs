use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::error::{ReconcileError, Result};
use crate::model::Row;

/// Reads the rows of one sheet of a tabular document.
///
/// Rows are returned with absolute coordinates: index 0 is the first sheet
/// row and cell `i` of a row is column `i`. Trailing empty cells are trimmed,
/// so a row's length is the position of its last non-empty cell plus one.
pub trait SheetReader: Sync {
    fn read_rows(&self, path: &Path, sheet: &str) -> Result<Vec<Row>>;
}

/// [`SheetReader`] backed by `calamine` for `.xlsx` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxSheetReader;

impl SheetReader for XlsxSheetReader {
    fn read_rows(&self, path: &Path, sheet: &str) -> Result<Vec<Row>> {
        let mut workbook = open_document(path)?;
        let range = read_sheet(&mut workbook, path, sheet)?;
        Ok(absolute_rows(&range))
    }
}

pub(crate) fn open_document(path: &Path) -> Result<Xlsx<BufReader<File>>> {
    open_workbook(path).map_err(|error: calamine::XlsxError| ReconcileError::DocumentOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })
}

pub(crate) fn read_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    path: &Path,
    name: &str,
) -> Result<Range<DataType>> {
    let sheet_error = |reason: String| ReconcileError::SheetRead {
        path: path.to_path_buf(),
        sheet: name.to_string(),
        reason,
    };
    workbook
        .worksheet_range(name)
        .ok_or_else(|| sheet_error("sheet not found".into()))?
        .map_err(|error| sheet_error(error.to_string()))
}

pub(crate) fn read_formulas<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    path: &Path,
    name: &str,
) -> Result<Range<String>> {
    let sheet_error = |reason: String| ReconcileError::SheetRead {
        path: path.to_path_buf(),
        sheet: name.to_string(),
        reason,
    };
    workbook
        .worksheet_formula(name)
        .ok_or_else(|| sheet_error("sheet not found".into()))?
        .map_err(|error| sheet_error(format!("formulas: {error}")))
}

fn absolute_rows(range: &Range<DataType>) -> Vec<Row> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<Row> = vec![Row::new(); start_row as usize];
    for source in range.rows() {
        let mut row = vec![String::new(); start_col as usize];
        row.extend(source.iter().map(|cell| cell_to_string(Some(cell))));
        while row.last().is_some_and(String::is_empty) {
            row.pop();
        }
        rows.push(row);
    }
    rows
}

pub(crate) fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(cell @ DataType::DateTime(serial)) => match cell.as_datetime() {
            Some(moment) if serial.fract() == 0.0 => moment.format("%Y-%m-%d").to_string(),
            Some(moment) => moment.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => serial.to_string(),
        },
        Some(cell @ DataType::Duration(days)) => match cell.as_duration() {
            Some(duration) => {
                let seconds = duration.num_seconds();
                format!("{}:{:02}:{:02}", seconds / 3600, seconds % 3600 / 60, seconds % 60)
            }
            None => days.to_string(),
        },
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
