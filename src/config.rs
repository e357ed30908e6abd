use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};

/// Sheet holding the product table in both the master and the source documents.
pub const DEFAULT_SHEET: &str = "Заявка на участие в процедуре";
/// Label written above the patched consignee column.
pub const DEFAULT_PATCH_HEADER_LABEL: &str = "Исходный пункт назначения";

/// How the lookup fan-in treats failed outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupPolicy {
    /// Identifiers without a match are recorded as unmatched and skipped.
    /// Any other failure still stops index assembly.
    #[default]
    SkipNotFound,
    /// The first failed outcome of any kind stops index assembly.
    FailFast,
}

/// Settings for a single reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Master document providing the identifiers and receiving the patch.
    pub master_path: PathBuf,
    /// Directory scanned for source documents.
    pub sources_dir: PathBuf,
    /// Extension (without the dot) a source document must carry.
    pub extension: String,
    /// Directory receiving the report and the patched copy.
    pub work_dir: PathBuf,
    /// Sheet read from every document.
    pub sheet_name: String,
    /// File name of the report inside `work_dir`.
    pub report_file_name: String,
    /// First data row (1-based) of the master table.
    pub patch_start_row: u32,
    pub patch_header_label: String,
    pub lookup_policy: LookupPolicy,
    /// Skip copying and patching the master document.
    pub skip_patch: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            master_path: PathBuf::from("./mainFile/main.xlsx"),
            sources_dir: PathBuf::from("./filesExcel"),
            extension: "xlsx".to_string(),
            work_dir: PathBuf::from("./work"),
            sheet_name: DEFAULT_SHEET.to_string(),
            report_file_name: "products_report.xlsx".to_string(),
            patch_start_row: 17,
            patch_header_label: DEFAULT_PATCH_HEADER_LABEL.to_string(),
            lookup_policy: LookupPolicy::default(),
            skip_patch: false,
        }
    }
}

impl ReconcileConfig {
    /// Loads settings from a JSON file. Missing keys fall back to the defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReconcileError::MissingInput(path.to_path_buf()));
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Rejects values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.sheet_name.trim().is_empty() {
            return Err(ReconcileError::InvalidConfig("sheet name is empty".into()));
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(ReconcileError::InvalidConfig("extension is empty".into()));
        }
        if self.report_file_name.is_empty() {
            return Err(ReconcileError::InvalidConfig("report file name is empty".into()));
        }
        if self.patch_start_row < 2 {
            return Err(ReconcileError::InvalidConfig(format!(
                "patch start row must leave room for a header row, got {}",
                self.patch_start_row
            )));
        }
        Ok(())
    }

    pub fn report_path(&self) -> PathBuf {
        self.work_dir.join(&self.report_file_name)
    }
}
