//! CSV discovery under the extracted dataset directory.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Finds all `.csv` files recursively under `data_dir`, sorted by path.
///
/// The Kaggle archive extracts into per-year subdirectories depending on the
/// export vintage, so the walk is recursive. A missing directory yields an
/// empty list; the caller decides whether that is fatal.
pub fn collect_csv_files(data_dir: &Path) -> Vec<PathBuf> {
    if !data_dir.exists() {
        warn!(dir = %data_dir.display(), "Data directory does not exist");
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    debug!(count = files.len(), dir = %data_dir.display(), "CSV discovery complete");
    files
}

/// Applies the optional smoke-test cap on how many files are processed.
pub fn limit_files(mut files: Vec<PathBuf>, limit: Option<usize>) -> Vec<PathBuf> {
    if let Some(limit) = limit {
        files.truncate(limit);
    }
    files
}
