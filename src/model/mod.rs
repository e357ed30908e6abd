use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// Product code used as the reconciliation key. It is kept as the plain cell
/// text so it can be compared directly against spreadsheet values.
pub type Identifier = String;

/// Number of characters a valid identifier carries.
pub const IDENTIFIER_LEN: usize = 12;

/// One row of cell text, addressed by absolute column index.
pub type Row = Vec<String>;

/// Ordered collection of records; order follows the source rows.
pub type Dataset = Vec<Record>;

/// Deduplicated identifiers read from the master document.
pub type IdentifierSet = BTreeSet<Identifier>;

/// Identifier → every record found for it. Identifiers without a match are absent.
pub type ReconciliationIndex = BTreeMap<Identifier, Dataset>;

/// Identifier → the record with the highest count.
pub type SelectionIndex = BTreeMap<Identifier, Record>;

/// Absolute column positions shared by the master and the source documents.
pub mod columns {
    pub const IDENTIFIER: usize = 2;
    pub const FULL_NAME: usize = 3;
    pub const CONSIGNEE: usize = 5;
    pub const NET_WEIGHT: usize = 8;
    pub const GROSS_WEIGHT: usize = 9;
    pub const COUNT: usize = 12;
    pub const CHANGE_NOTE: usize = 15;
    pub const COUNTRY: usize = 18;
    /// Column receiving the consignee when the master copy is patched.
    pub const PATCH_CONSIGNEE: usize = 19;

    /// Minimum number of cells a row needs before it is considered at all.
    pub const MIN_ROW_WIDTH: usize = NET_WEIGHT + 1;
}

/// Returns whether `value` has the exact shape of an identifier.
pub fn is_valid_identifier(value: &str) -> bool {
    value.chars().count() == IDENTIFIER_LEN
}

/// One matched row of product data. All fields are copied verbatim from the
/// source cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Record {
    pub identifier: Identifier,
    pub full_name: String,
    pub consignee: String,
    pub net_weight: String,
    pub gross_weight: String,
    pub count: String,
    pub change_note: String,
    pub country: String,
}

impl Record {
    /// Extracts a record from a source row, or `None` when the row does not
    /// qualify (too short, malformed identifier, or empty net weight).
    pub fn from_row(row: &[String]) -> Option<Self> {
        if row.len() < columns::MIN_ROW_WIDTH {
            return None;
        }
        let identifier = cell(row, columns::IDENTIFIER);
        if !is_valid_identifier(&identifier) {
            return None;
        }
        let net_weight = cell(row, columns::NET_WEIGHT);
        if net_weight.is_empty() {
            return None;
        }

        Some(Self {
            identifier,
            full_name: cell(row, columns::FULL_NAME),
            consignee: cell(row, columns::CONSIGNEE),
            net_weight,
            gross_weight: cell(row, columns::GROSS_WEIGHT),
            count: cell(row, columns::COUNT),
            change_note: cell(row, columns::CHANGE_NOTE),
            country: cell(row, columns::COUNTRY),
        })
    }

    /// Count interpreted as an integer; `None` when the text is not numeric.
    pub fn count_value(&self) -> Option<i64> {
        self.count.trim().parse().ok()
    }

    /// Cells in report column order, identifier first.
    pub fn report_cells(&self) -> [&str; 8] {
        [
            self.identifier.as_str(),
            self.full_name.as_str(),
            self.consignee.as_str(),
            self.net_weight.as_str(),
            self.gross_weight.as_str(),
            self.count.as_str(),
            self.change_note.as_str(),
            self.country.as_str(),
        ]
    }
}

fn cell(row: &[String], index: usize) -> String {
    row.get(index).cloned().unwrap_or_default()
}

/// Result emitted by a lookup worker for one identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub identifier: Identifier,
    pub dataset: Dataset,
    pub failure: Option<LookupError>,
}

impl TaskOutcome {
    pub fn matched(identifier: Identifier, dataset: Dataset) -> Self {
        Self {
            identifier,
            dataset,
            failure: None,
        }
    }

    pub fn failed(identifier: Identifier, failure: LookupError) -> Self {
        Self {
            identifier,
            dataset: Dataset::new(),
            failure: Some(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(usize, &str)]) -> Row {
        let width = cells.iter().map(|(idx, _)| idx + 1).max().unwrap_or(0);
        let mut row = vec![String::new(); width];
        for (idx, value) in cells {
            row[*idx] = value.to_string();
        }
        row
    }

    #[test]
    fn qualifying_row_maps_every_column() {
        let row = row(&[
            (2, "123456789012"),
            (3, "Bolt M8"),
            (5, "Depot 4"),
            (8, "1.5"),
            (9, "1.7"),
            (12, "40"),
            (15, "none"),
            (18, "DE"),
        ]);

        let record = Record::from_row(&row).expect("row qualifies");
        assert_eq!(record.identifier, "123456789012");
        assert_eq!(record.full_name, "Bolt M8");
        assert_eq!(record.consignee, "Depot 4");
        assert_eq!(record.net_weight, "1.5");
        assert_eq!(record.gross_weight, "1.7");
        assert_eq!(record.count, "40");
        assert_eq!(record.change_note, "none");
        assert_eq!(record.country, "DE");
    }

    #[test]
    fn short_row_missing_weight_or_bad_identifier_is_rejected() {
        assert!(Record::from_row(&row(&[(2, "123456789012"), (7, "x")])).is_none());
        assert!(Record::from_row(&row(&[(2, "123456789012"), (8, ""), (9, "2")])).is_none());
        assert!(Record::from_row(&row(&[(2, "12345"), (8, "1")])).is_none());
    }

    #[test]
    fn trailing_cells_default_to_empty() {
        let record = Record::from_row(&row(&[(2, "123456789012"), (8, "3")])).expect("qualifies");
        assert_eq!(record.gross_weight, "");
        assert_eq!(record.country, "");
    }

    #[test]
    fn identifier_length_counts_characters() {
        assert!(is_valid_identifier("123456789012"));
        assert!(is_valid_identifier("АБВГДЕЖЗИКЛМ"));
        assert!(!is_valid_identifier("12345678901"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn count_value_ignores_surrounding_whitespace() {
        let mut record = Record::from_row(&row(&[(2, "123456789012"), (8, "3")])).expect("qualifies");
        record.count = " 25 ".into();
        assert_eq!(record.count_value(), Some(25));
        record.count = "n/a".into();
        assert_eq!(record.count_value(), None);
    }
}
