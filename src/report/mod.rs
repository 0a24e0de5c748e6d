//! Streaming punctuality aggregation over flight-record CSV files.
//!
//! Files are classified at open time, rows stream through in bounded
//! batches, and one caller-owned context accumulates per-month, per-carrier,
//! per-airport, and per-route totals that finalize into ranked summary
//! tables once every file has been consumed.

pub mod aggregate;
pub mod record;
pub mod schema;
pub mod types;
