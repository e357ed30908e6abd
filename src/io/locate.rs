use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{ReconcileError, Result};

/// Lists the regular files in `dir` carrying `extension`.
///
/// The order follows the directory listing and carries no meaning.
pub fn locate_documents(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut documents = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == extension) {
            documents.push(path);
        }
    }

    if documents.is_empty() {
        return Err(ReconcileError::NoSourcesFound {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        });
    }
    Ok(documents)
}

/// Copies `source` into `work_dir` as `<stem>_work_<timestamp>.<ext>` and
/// returns the new path. `work_dir` is created when missing.
pub fn copy_to_work_dir(source: &Path, work_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(work_dir)?;

    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ReconcileError::InvalidInput(format!("{} has no file name", source.display()))
        })?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let file_name = match source.extension() {
        Some(ext) => format!("{stem}_work_{timestamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_work_{timestamp}"),
    };

    let destination = work_dir.join(file_name);
    fs::copy(source, &destination)?;
    Ok(destination)
}
