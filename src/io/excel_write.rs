use std::fs;
use std::path::Path;

use calamine::{DataType, Range, Reader};
use rust_xlsxwriter::{Color, Format, FormatAlign, Formula, Workbook, Worksheet};

use crate::error::{ReconcileError, Result};
use crate::io::excel_read::{self, cell_to_string};
use crate::io::merged_cells::{self, CellSpan};
use crate::model::{ReconciliationIndex, SelectionIndex, columns};

/// Header row of the report.
pub const REPORT_HEADERS: [&str; 8] = [
    "ID",
    "Fullname",
    "Consignee",
    "NetWeight",
    "GrossWeight",
    "Count",
    "ChangeNote",
    "Country",
];

const REPORT_COLUMN_WIDTHS: [f64; 8] = [20.0, 80.0, 20.0, 5.0, 5.0, 12.0, 80.0, 15.0];
const HEADER_FILL: u32 = 0xDDEBF7;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DURATION_FORMAT: &str = "[h]:mm:ss";

/// Master columns overwritten by the patch, paired with the record field they receive.
const PATCH_COLUMNS: [usize; 6] = [
    columns::NET_WEIGHT,
    columns::GROSS_WEIGHT,
    columns::COUNT,
    columns::CHANGE_NOTE,
    columns::COUNTRY,
    columns::PATCH_CONSIGNEE,
];

/// Writes one report row per record of `index` and returns the number of data rows.
///
/// Rows follow the index order (sorted by identifier), then dataset order.
/// The parent directory is created when missing.
pub fn write_report(path: &Path, index: &ReconciliationIndex) -> Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let header_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_background_color(Color::RGB(HEADER_FILL));
    for (col_idx, header) in REPORT_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, *header, &header_format)?;
    }

    let mut row_idx: u32 = 1;
    for (identifier, dataset) in index {
        for record in dataset {
            let mut cells = record.report_cells();
            cells[0] = identifier.as_str();
            for (col_idx, value) in cells.iter().enumerate() {
                worksheet.write_string(row_idx, col_idx as u16, *value)?;
            }
            row_idx += 1;
        }
    }

    for (col_idx, width) in REPORT_COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col_idx as u16, *width)?;
    }

    workbook.save(path)?;
    Ok((row_idx - 1) as usize)
}

/// Rewrites the workbook at `path` with the selected records patched into `sheet`.
///
/// Every sheet is carried over: typed cell values (dates keep a date format),
/// formulas with their cached result, and merged ranges. On `sheet`, each row
/// from `start_row` (1-based) whose identifier cell matches a selection gets the
/// six patch columns overwritten, and `header_label` is written above the
/// consignee column. Returns the number of patched rows.
pub fn patch_workbook(
    path: &Path,
    sheet: &str,
    selection: &SelectionIndex,
    start_row: u32,
    header_label: &str,
) -> Result<usize> {
    if start_row < 2 {
        return Err(ReconcileError::InvalidInput(format!(
            "patch start row must be at least 2, got {start_row}"
        )));
    }

    let sheets = read_all_sheets(path)?;
    if !sheets.iter().any(|content| content.name == sheet) {
        return Err(ReconcileError::SheetRead {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            reason: "sheet not found".into(),
        });
    }

    let mut workbook = Workbook::new();
    let mut updated = 0;
    for content in &sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&content.name)?;
        // merging pads the range with blanks, so it goes before the values
        merge_spans(worksheet, content)?;
        copy_cells(worksheet, &content.values)?;
        copy_formulas(worksheet, content)?;

        if content.name == sheet {
            updated = patch_rows(worksheet, &content.values, selection, start_row - 1)?;
            worksheet.write_string(start_row - 2, columns::PATCH_CONSIGNEE as u16, header_label)?;
        }
    }

    workbook.save(path)?;
    Ok(updated)
}

/// Everything carried over from one sheet of the workbook being patched.
struct SheetContent {
    name: String,
    values: Range<DataType>,
    formulas: Range<String>,
    merged: Vec<CellSpan>,
}

fn read_all_sheets(path: &Path) -> Result<Vec<SheetContent>> {
    let mut merges = merged_cells::merged_cells(path)?;
    let mut workbook = excel_read::open_document(path)?;
    let names = workbook.sheet_names().to_vec();
    names
        .into_iter()
        .map(|name| {
            let values = excel_read::read_sheet(&mut workbook, path, &name)?;
            let formulas = excel_read::read_formulas(&mut workbook, path, &name)?;
            let merged = merges.remove(&name).unwrap_or_default();
            Ok(SheetContent {
                name,
                values,
                formulas,
                merged,
            })
        })
        .collect()
}

fn merge_spans(worksheet: &mut Worksheet, content: &SheetContent) -> Result<()> {
    let plain = Format::new();
    for span in content.merged.iter().filter(|span| !span.is_single_cell()) {
        let (first_row, first_col) = span.first;
        let (last_row, last_col) = span.last;
        let text = cell_to_string(content.values.get_value((first_row, first_col as u32)));
        worksheet.merge_range(first_row, first_col, last_row, last_col, &text, &plain)?;
    }
    Ok(())
}

fn copy_cells(worksheet: &mut Worksheet, range: &Range<DataType>) -> Result<()> {
    let Some((start_row, start_col)) = range.start() else {
        return Ok(());
    };

    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);
    let duration_format = Format::new().set_num_format(DURATION_FORMAT);
    for (row_offset, col_offset, cell) in range.used_cells() {
        let row = start_row + row_offset as u32;
        let col = (start_col as usize + col_offset) as u16;
        match cell {
            DataType::Empty => {}
            DataType::String(value) => {
                worksheet.write_string(row, col, value)?;
            }
            DataType::Float(value) => {
                worksheet.write_number(row, col, *value)?;
            }
            DataType::Int(value) => {
                worksheet.write_number(row, col, *value as f64)?;
            }
            DataType::Bool(value) => {
                worksheet.write_boolean(row, col, *value)?;
            }
            DataType::DateTime(serial) if serial.fract() == 0.0 => {
                worksheet.write_number_with_format(row, col, *serial, &date_format)?;
            }
            DataType::DateTime(serial) => {
                worksheet.write_number_with_format(row, col, *serial, &datetime_format)?;
            }
            DataType::Duration(days) => {
                worksheet.write_number_with_format(row, col, *days, &duration_format)?;
            }
            other => {
                worksheet.write_string(row, col, other.to_string())?;
            }
        }
    }
    Ok(())
}

/// Writes every formula over its copied value, keeping the value as the cached result.
fn copy_formulas(worksheet: &mut Worksheet, content: &SheetContent) -> Result<()> {
    let Some((start_row, start_col)) = content.formulas.start() else {
        return Ok(());
    };

    for (row_offset, col_offset, text) in content.formulas.used_cells() {
        let row = start_row + row_offset as u32;
        let col = start_col + col_offset as u32;
        let cached = cell_to_string(content.values.get_value((row, col)));
        let mut formula = Formula::new(text.as_str());
        if !cached.is_empty() {
            formula = formula.set_result(cached);
        }
        worksheet.write_formula(row, col as u16, formula)?;
    }
    Ok(())
}

fn patch_rows(
    worksheet: &mut Worksheet,
    range: &Range<DataType>,
    selection: &SelectionIndex,
    first_row: u32,
) -> Result<usize> {
    let Some((last_row, _)) = range.end() else {
        return Ok(0);
    };

    let mut updated = 0;
    for row in first_row..=last_row {
        let identifier = cell_to_string(range.get_value((row, columns::IDENTIFIER as u32)));
        let Some(record) = selection.get(identifier.trim()) else {
            continue;
        };

        let values = [
            &record.net_weight,
            &record.gross_weight,
            &record.count,
            &record.change_note,
            &record.country,
            &record.consignee,
        ];
        for (col, value) in PATCH_COLUMNS.iter().zip(values) {
            worksheet.write_string(row, *col as u16, value.as_str())?;
        }
        updated += 1;
    }
    Ok(updated)
}
