//! Summary serialization and persistence.

use std::path::Path;

use tracing::{debug, info};

use crate::error::ReportError;
use crate::report::types::ReportSummary;

/// Logs the summary as pretty-printed JSON.
pub fn print_json(summary: &ReportSummary) -> Result<(), ReportError> {
    info!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Writes the finalized summary as pretty JSON to `path`, creating parent
/// directories as needed.
pub fn write_summary(path: &Path, summary: &ReportSummary) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(summary)?;

    let io_result = (|| {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &json)
    })();

    io_result.map_err(|source| ReportError::WriteSummary {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), bytes = json.len(), "Summary written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::aggregate::AggregateContext;

    fn empty_summary() -> ReportSummary {
        AggregateContext::new().finalize()
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&empty_summary()).unwrap();
    }

    #[test]
    fn test_write_summary_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/summary.json");

        write_summary(&path, &empty_summary()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"overall\""));
        assert!(content.contains("\"quality\""));
    }

    #[test]
    fn test_written_summary_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_summary(&path, &empty_summary()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["overall"]["flights"], 0);
    }
}
