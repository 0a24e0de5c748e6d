//! Error taxonomy for an aggregation run.
//!
//! Only the absence of any input file aborts a run. Everything else a
//! multi-year CSV dump can throw at us (unreadable file, header missing a
//! required column, malformed row) degrades to a counter in
//! [`DataQuality`](crate::report::types::DataQuality) so the final summary
//! states how complete the data was.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// No CSV files were discovered at all. Fatal: there is nothing to
    /// summarize and the enclosing tool must exit non-zero.
    #[error("no CSV files found to aggregate")]
    MissingInput,

    /// The requested output path could not be written.
    #[error("failed to write summary to {path}")]
    WriteSummary {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}
