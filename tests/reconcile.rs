use std::fs;
use std::path::Path;

use product_reconcile::io::excel_read::{SheetReader, XlsxSheetReader};
use product_reconcile::model::columns;
use product_reconcile::run::reconcile;
use product_reconcile::{LookupError, LookupPolicy, ReconcileConfig, ReconcileError, TracingObserver};
use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

const SHEET: &str = "Products";

enum Cell<'a> {
    Text(u32, usize, &'a str),
    Number(u32, usize, f64),
}

fn write_book(path: &Path, cells: &[Cell<'_>]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET).expect("sheet named");
    for cell in cells {
        match cell {
            Cell::Text(row, col, value) => {
                worksheet
                    .write_string(*row, *col as u16, *value)
                    .expect("text written");
            }
            Cell::Number(row, col, value) => {
                worksheet
                    .write_number(*row, *col as u16, *value)
                    .expect("number written");
            }
        }
    }
    workbook.save(path).expect("workbook saved");
}

fn source_cells<'a>(identifier: &'a str, count: f64, consignee: &'a str) -> Vec<Cell<'a>> {
    vec![
        Cell::Text(0, columns::IDENTIFIER, "ID"),
        Cell::Text(1, columns::IDENTIFIER, identifier),
        Cell::Text(1, columns::FULL_NAME, "Hex bolt"),
        Cell::Text(1, columns::CONSIGNEE, consignee),
        Cell::Text(1, columns::NET_WEIGHT, "1.5"),
        Cell::Text(1, columns::GROSS_WEIGHT, "1.8"),
        Cell::Number(1, columns::COUNT, count),
        Cell::Text(1, columns::COUNTRY, "PL"),
    ]
}

/// Master with candidates ["123456789012", "123456789012", "987654321098"]
/// and two source documents matching only the first identifier.
fn scenario() -> (TempDir, ReconcileConfig) {
    let dir = tempdir().expect("temporary directory");
    let master_path = dir.path().join("main.xlsx");
    write_book(
        &master_path,
        &[
            Cell::Text(0, columns::IDENTIFIER, "ID"),
            Cell::Text(0, columns::GROSS_WEIGHT, "header"),
            Cell::Text(1, columns::IDENTIFIER, "123456789012"),
            Cell::Text(1, columns::GROSS_WEIGHT, "-"),
            Cell::Text(2, columns::IDENTIFIER, "123456789012"),
            Cell::Text(2, columns::GROSS_WEIGHT, "-"),
            Cell::Text(3, columns::IDENTIFIER, "987654321098"),
            Cell::Text(3, columns::GROSS_WEIGHT, "-"),
        ],
    );

    let sources = dir.path().join("sources");
    fs::create_dir(&sources).expect("sources dir");
    write_book(&sources.join("a.xlsx"), &source_cells("123456789012", 3.0, "North"));
    write_book(&sources.join("b.xlsx"), &source_cells("123456789012", 8.0, "South"));
    fs::write(sources.join("broken.xlsx"), b"not a workbook").expect("broken file");
    fs::write(sources.join("readme.txt"), b"ignored").expect("text file");

    let config = ReconcileConfig {
        master_path,
        sources_dir: sources,
        work_dir: dir.path().join("work"),
        sheet_name: SHEET.to_string(),
        patch_start_row: 2,
        patch_header_label: "Origin".to_string(),
        ..ReconcileConfig::default()
    };
    (dir, config)
}

#[test]
fn end_to_end_run_reports_and_patches_matching_identifier() {
    let (_dir, config) = scenario();

    let summary = reconcile(&config, &XlsxSheetReader, &TracingObserver).expect("run succeeded");
    assert_eq!(summary.candidates, 3);
    assert_eq!(summary.identifiers, 2);
    assert_eq!(summary.documents, 3);
    assert_eq!(summary.master_records, 2);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.unmatched, vec!["987654321098"]);
    assert_eq!(summary.report_rows, 2);
    assert_eq!(summary.patched_rows, 2);

    let report = XlsxSheetReader
        .read_rows(&summary.report_path, "Sheet1")
        .expect("report read");
    assert_eq!(report.len(), 3);
    let mut counts: Vec<&str> = report[1..].iter().map(|row| row[5].as_str()).collect();
    counts.sort();
    assert_eq!(counts, vec!["3", "8"]);

    let patched_path = summary.patched_path.expect("patched copy written");
    assert!(patched_path.starts_with(&config.work_dir));
    let patched = XlsxSheetReader
        .read_rows(&patched_path, SHEET)
        .expect("patched copy read");
    assert_eq!(patched[0][columns::PATCH_CONSIGNEE], "Origin");
    for row in &patched[1..3] {
        assert_eq!(row[columns::COUNT], "8");
        assert_eq!(row[columns::PATCH_CONSIGNEE], "South");
        assert_eq!(row[columns::COUNTRY], "PL");
    }
    assert_eq!(patched[3].len(), columns::GROSS_WEIGHT + 1);

    // the master itself is never modified
    let master = XlsxSheetReader
        .read_rows(&config.master_path, SHEET)
        .expect("master read");
    assert_eq!(master[1].len(), columns::GROSS_WEIGHT + 1);
}

#[test]
fn fail_fast_policy_aborts_on_unmatched_identifier() {
    let (_dir, mut config) = scenario();
    config.lookup_policy = LookupPolicy::FailFast;

    let err = reconcile(&config, &XlsxSheetReader, &TracingObserver).expect_err("run aborted");
    match err {
        ReconcileError::Aborted { identifier, source } => {
            assert_eq!(identifier, "987654321098");
            assert_eq!(source, LookupError::IdentifierNotFound("987654321098".into()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!config.report_path().exists());
}

#[test]
fn skipping_the_patch_only_writes_the_report() {
    let (_dir, mut config) = scenario();
    config.skip_patch = true;

    let summary = reconcile(&config, &XlsxSheetReader, &TracingObserver).expect("run succeeded");
    assert!(summary.patched_path.is_none());
    let written: Vec<_> = fs::read_dir(&config.work_dir)
        .expect("work dir listed")
        .collect();
    assert_eq!(written.len(), 1);
}

#[test]
fn run_level_failures_are_fatal() {
    let (dir, config) = scenario();

    let missing_master = ReconcileConfig {
        master_path: dir.path().join("absent.xlsx"),
        ..config.clone()
    };
    assert!(matches!(
        reconcile(&missing_master, &XlsxSheetReader, &TracingObserver),
        Err(ReconcileError::MissingInput(_))
    ));

    let empty_sources = dir.path().join("empty");
    fs::create_dir(&empty_sources).expect("empty dir");
    let no_sources = ReconcileConfig {
        sources_dir: empty_sources,
        ..config.clone()
    };
    assert!(matches!(
        reconcile(&no_sources, &XlsxSheetReader, &TracingObserver),
        Err(ReconcileError::NoSourcesFound { .. })
    ));

    let only_broken = dir.path().join("broken");
    fs::create_dir(&only_broken).expect("broken dir");
    fs::write(only_broken.join("x.xlsx"), b"garbage").expect("broken file");
    let no_data = ReconcileConfig {
        sources_dir: only_broken,
        ..config
    };
    assert!(matches!(
        reconcile(&no_data, &XlsxSheetReader, &TracingObserver),
        Err(ReconcileError::NoUsableData)
    ));
}
