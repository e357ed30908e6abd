//! Merged-cell ranges of an `.xlsx` workbook.
//!
//! calamine 0.21 does not expose `<mergeCells>`, so the worksheet parts are
//! located through the workbook relationships and scanned directly.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

use crate::error::{ReconcileError, Result};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

type PartResult<T> = std::result::Result<T, String>;

/// Rectangle of merged cells, 0-based and inclusive on both corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    pub first: (u32, u16),
    pub last: (u32, u16),
}

impl CellSpan {
    /// Parses an A1-style range such as `A1:E1` (absolute markers allowed).
    pub fn parse(reference: &str) -> Option<CellSpan> {
        let (first, last) = reference.split_once(':')?;
        Some(CellSpan {
            first: parse_cell(first)?,
            last: parse_cell(last)?,
        })
    }

    pub fn is_single_cell(&self) -> bool {
        self.first == self.last
    }
}

fn parse_cell(reference: &str) -> Option<(u32, u16)> {
    let reference = reference.replace('$', "");
    let digits_at = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(digits_at);
    if letters.is_empty() {
        return None;
    }

    let mut col: u32 = 0;
    for letter in letters.chars() {
        if !letter.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (letter.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, u16::try_from(col - 1).ok()?))
}

/// Returns the merged ranges of every worksheet, keyed by sheet name.
///
/// Sheets without merged cells map to an empty list.
pub fn merged_cells(path: &Path) -> Result<HashMap<String, Vec<CellSpan>>> {
    let open_error = |reason: String| ReconcileError::DocumentOpen {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|error| open_error(error.to_string()))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|error| open_error(error.to_string()))?;

    let targets = relationship_targets(&mut archive).map_err(open_error)?;
    let sheets = sheet_parts(&mut archive, &targets).map_err(open_error)?;

    let mut merged = HashMap::with_capacity(sheets.len());
    for (name, part) in sheets {
        let spans = merge_spans(&mut archive, &part).map_err(|reason| ReconcileError::SheetRead {
            path: path.to_path_buf(),
            sheet: name.clone(),
            reason,
        })?;
        merged.insert(name, spans);
    }
    Ok(merged)
}

/// Relationship id → archive path of the part it points to.
fn relationship_targets<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> PartResult<HashMap<String, String>> {
    let mut targets = HashMap::new();
    scan_part(archive, WORKBOOK_RELS_PART, |element| {
        if element.local_name().as_ref() != b"Relationship" {
            return Ok(());
        }
        if let (Some(id), Some(target)) = (attribute(element, b"Id")?, attribute(element, b"Target")?)
        {
            let part = match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{target}"),
            };
            targets.insert(id, part);
        }
        Ok(())
    })?;
    Ok(targets)
}

/// Sheet name → worksheet part, in workbook order.
fn sheet_parts<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    targets: &HashMap<String, String>,
) -> PartResult<Vec<(String, String)>> {
    let mut sheets = Vec::new();
    scan_part(archive, WORKBOOK_PART, |element| {
        if element.local_name().as_ref() != b"sheet" {
            return Ok(());
        }
        // the relationship attribute is `r:id`; only its local name is stable
        if let (Some(name), Some(id)) = (attribute(element, b"name")?, attribute(element, b"id")?) {
            if let Some(part) = targets.get(&id) {
                sheets.push((name, part.clone()));
            }
        }
        Ok(())
    })?;
    Ok(sheets)
}

fn merge_spans<R: Read + Seek>(archive: &mut ZipArchive<R>, part: &str) -> PartResult<Vec<CellSpan>> {
    let mut spans = Vec::new();
    scan_part(archive, part, |element| {
        if element.local_name().as_ref() == b"mergeCell" {
            if let Some(span) = attribute(element, b"ref")?.as_deref().and_then(CellSpan::parse) {
                spans.push(span);
            }
        }
        Ok(())
    })?;
    Ok(spans)
}

fn scan_part<R, F>(archive: &mut ZipArchive<R>, part: &str, mut visit: F) -> PartResult<()>
where
    R: Read + Seek,
    F: FnMut(&BytesStart<'_>) -> PartResult<()>,
{
    let entry = archive
        .by_name(part)
        .map_err(|error| format!("{part}: {error}"))?;
    let mut reader = Reader::from_reader(BufReader::new(entry));
    let mut buf = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|error| format!("{part}: {error}"))?
        {
            Event::Start(element) | Event::Empty(element) => visit(&element)?,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Value of the attribute whose local name is `local`.
fn attribute(element: &BytesStart<'_>, local: &[u8]) -> PartResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|error| error.to_string())?;
        if attr.key.local_name().as_ref() == local {
            let value = attr.unescape_value().map_err(|error| error.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
