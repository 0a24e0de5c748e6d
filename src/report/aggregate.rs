//! Streaming aggregation over the discovered CSV files.
//!
//! One [`AggregateContext`] owns every accumulator for a run. Files are
//! streamed in bounded batches so peak memory stays proportional to the
//! batch size, never to the dataset; batch size has no effect on the
//! finalized numbers. Nothing is derived or exposed until [`finalize`]
//! runs after the last file.
//!
//! [`finalize`]: AggregateContext::finalize

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::ReportError;
use crate::report::record::FlightRecord;
use crate::report::schema::classify_header;
use crate::report::types::{
    Accumulator, AirportSummary, CarrierSummary, DataQuality, MonthlySummary, ReportSummary,
    RouteSummary, cause_totals,
};

/// Rows parsed per batch by default. Matches the row count the full
/// 2018–2024 dataset is comfortably streamed with.
pub const DEFAULT_CHUNKSIZE: usize = 250_000;

/// Rankings are truncated to this many rows for presentation.
const TOP_N: usize = 10;

/// All mutable state of one aggregation run, owned by the caller.
///
/// Contexts for disjoint input partitions can be merged with
/// [`AggregateContext::merge`]; counts and sums add commutatively, so a
/// per-file parallel split finalizes to the same integers as a sequential
/// pass (float means may differ in the last bits with summation order).
#[derive(Debug, Default)]
pub struct AggregateContext {
    overall: Accumulator,
    monthly: BTreeMap<String, Accumulator>,
    carriers: HashMap<String, Accumulator>,
    airports: HashMap<String, Accumulator>,
    routes: HashMap<(String, String), Accumulator>,
    quality: DataQuality,
}

impl AggregateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one parsed record into every grouping dimension.
    pub fn record(&mut self, rec: &FlightRecord) {
        self.overall.record(rec);
        self.monthly.entry(rec.month()).or_default().record(rec);
        self.carriers
            .entry(rec.carrier.clone())
            .or_default()
            .record(rec);
        self.airports
            .entry(rec.origin.clone())
            .or_default()
            .record(rec);
        self.routes
            .entry((rec.origin.clone(), rec.dest.clone()))
            .or_default()
            .record(rec);
        if rec.causes.is_none() {
            self.quality.rows_without_cause_data += 1;
        }
    }

    /// Absorbs another context, e.g. one built from a disjoint set of files.
    pub fn merge(&mut self, other: AggregateContext) {
        self.overall.merge(&other.overall);
        for (key, acc) in other.monthly {
            self.monthly.entry(key).or_default().merge(&acc);
        }
        for (key, acc) in other.carriers {
            self.carriers.entry(key).or_default().merge(&acc);
        }
        for (key, acc) in other.airports {
            self.airports.entry(key).or_default().merge(&acc);
        }
        for (key, acc) in other.routes {
            self.routes.entry(key).or_default().merge(&acc);
        }
        self.quality.files_processed += other.quality.files_processed;
        self.quality.files_unreadable += other.quality.files_unreadable;
        self.quality.files_bad_schema += other.quality.files_bad_schema;
        self.quality.rows_skipped += other.quality.rows_skipped;
        self.quality.rows_without_cause_data += other.quality.rows_without_cause_data;
    }

    /// Streams one CSV file into the context in batches of at most
    /// `chunksize` rows.
    ///
    /// Unreadable files and files missing a required column are recorded in
    /// the quality counters and skipped; only the enclosing run decides
    /// whether that is fatal.
    pub fn process_file(&mut self, path: &Path, chunksize: usize) {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                self.quality.files_unreadable += 1;
                return;
            }
        };

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = match reader.headers() {
            Ok(h) => h.clone(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping file with unreadable header");
                self.quality.files_unreadable += 1;
                return;
            }
        };

        let map = match classify_header(&headers) {
            Ok(map) => map,
            Err(mismatch) => {
                warn!(path = %path.display(), %mismatch, "Skipping file with unexpected schema");
                self.quality.files_bad_schema += 1;
                return;
            }
        };
        if !map.has_cause_columns() {
            debug!(path = %path.display(), "File carries no delay-cause columns");
        }

        let mut rows_read: u64 = 0;
        let mut batch: Vec<FlightRecord> = Vec::with_capacity(chunksize.max(1));

        for result in reader.records() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping malformed CSV row");
                    self.quality.rows_skipped += 1;
                    continue;
                }
            };
            rows_read += 1;

            match FlightRecord::from_row(&row, &map) {
                Ok(rec) => batch.push(rec),
                Err(reason) => {
                    debug!(path = %path.display(), ?reason, "Skipping row");
                    self.quality.rows_skipped += 1;
                }
            }

            if batch.len() >= chunksize.max(1) {
                self.apply_batch(&mut batch);
            }
        }
        self.apply_batch(&mut batch);

        self.quality.files_processed += 1;
        debug!(path = %path.display(), rows_read, "File aggregated");
    }

    fn apply_batch(&mut self, batch: &mut Vec<FlightRecord>) {
        for rec in batch.drain(..) {
            self.record(&rec);
        }
    }

    pub fn quality(&self) -> &DataQuality {
        &self.quality
    }

    /// Total flights seen so far across all files.
    pub fn flights(&self) -> u64 {
        self.overall.flights
    }

    /// Converts the accumulated state into the sorted, truncated summary.
    pub fn finalize(self) -> ReportSummary {
        let monthly = self
            .monthly
            .into_iter()
            .map(|(month, acc)| MonthlySummary {
                month,
                metrics: acc.metrics(),
            })
            .collect();

        let carriers = rank(self.carriers)
            .into_iter()
            .map(|(carrier, acc)| CarrierSummary {
                carrier,
                metrics: acc.metrics(),
            })
            .collect();

        let airports = rank(self.airports)
            .into_iter()
            .map(|(origin, acc)| AirportSummary {
                origin,
                metrics: acc.metrics(),
            })
            .collect();

        let routes = rank(self.routes)
            .into_iter()
            .map(|((origin, dest), acc)| RouteSummary {
                origin,
                dest,
                metrics: acc.metrics(),
            })
            .collect();

        ReportSummary {
            generated_at: Utc::now(),
            overall: self.overall.metrics(),
            cause_totals: cause_totals(&self.overall),
            monthly,
            carriers,
            airports,
            routes,
            quality: self.quality,
        }
    }
}

/// Orders a grouped table descending by flight count, breaking ties on the
/// key ascending for a deterministic ranking, and keeps the top ten.
fn rank<K: Ord>(table: HashMap<K, Accumulator>) -> Vec<(K, Accumulator)> {
    let mut rows: Vec<(K, Accumulator)> = table.into_iter().collect();
    rows.sort_by(|(ka, a), (kb, b)| b.flights.cmp(&a.flights).then_with(|| ka.cmp(kb)));
    rows.truncate(TOP_N);
    rows
}

/// Aggregates every file in `paths` sequentially and finalizes the result.
///
/// An empty `paths` is the one fatal condition: with no input at all there
/// is no summary to report. Per-file failures merely degrade the output.
pub fn aggregate_files<P: AsRef<Path>>(
    paths: &[P],
    chunksize: usize,
) -> Result<ReportSummary, ReportError> {
    if paths.is_empty() {
        return Err(ReportError::MissingInput);
    }

    let mut ctx = AggregateContext::new();
    for path in paths {
        ctx.process_file(path.as_ref(), chunksize);
    }
    Ok(ctx.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(date: (i32, u32, u32), carrier: &str, route: (&str, &str), arr: f64) -> FlightRecord {
        FlightRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            carrier: carrier.into(),
            origin: route.0.into(),
            dest: route.1.into(),
            arr_delay: Some(arr),
            dep_delay: Some(arr / 2.0),
            cancelled: false,
            diverted: false,
            causes: None,
        }
    }

    #[test]
    fn test_overall_scenario() {
        let mut ctx = AggregateContext::new();
        ctx.record(&rec((2024, 1, 1), "AA", ("ORD", "LAX"), 20.0));
        ctx.record(&rec((2024, 1, 2), "AA", ("ORD", "LAX"), 5.0));

        let summary = ctx.finalize();
        assert_eq!(summary.overall.flights, 2);
        assert_eq!(summary.overall.avg_arr_delay, Some(12.5));
        assert_eq!(summary.overall.on_time_rate, Some(0.5));
        assert_eq!(summary.routes.len(), 1);
        assert_eq!(summary.routes[0].metrics.flights, 2);
    }

    #[test]
    fn test_monthly_partition_property() {
        let mut ctx = AggregateContext::new();
        for (m, d) in [(1, 5), (1, 9), (2, 1), (3, 30), (3, 31)] {
            ctx.record(&rec((2023, m, d), "DL", ("ATL", "JFK"), 0.0));
        }
        let total = ctx.flights();
        let summary = ctx.finalize();
        let by_month: u64 = summary.monthly.iter().map(|m| m.metrics.flights).sum();
        assert_eq!(by_month, total);
        assert_eq!(
            summary.monthly.iter().map(|m| m.month.as_str()).collect::<Vec<_>>(),
            ["2023-01", "2023-02", "2023-03"]
        );
    }

    #[test]
    fn test_ranking_order_and_tie_break() {
        let mut ctx = AggregateContext::new();
        ctx.record(&rec((2024, 1, 1), "UA", ("DEN", "SFO"), 0.0));
        ctx.record(&rec((2024, 1, 1), "UA", ("DEN", "SFO"), 0.0));
        ctx.record(&rec((2024, 1, 1), "DL", ("ATL", "JFK"), 0.0));
        ctx.record(&rec((2024, 1, 1), "AA", ("ORD", "LAX"), 0.0));

        let summary = ctx.finalize();
        let order: Vec<&str> = summary.carriers.iter().map(|c| c.carrier.as_str()).collect();
        assert_eq!(order, ["UA", "AA", "DL"]);
    }

    #[test]
    fn test_ranking_truncates_to_top_ten() {
        let mut ctx = AggregateContext::new();
        for i in 0..15 {
            let code = format!("X{i:02}");
            for _ in 0..=i {
                ctx.record(&rec((2024, 1, 1), &code, ("AAA", "BBB"), 0.0));
            }
        }
        let summary = ctx.finalize();
        assert_eq!(summary.carriers.len(), 10);
        assert_eq!(summary.carriers[0].carrier, "X14");
        assert_eq!(summary.carriers[0].metrics.flights, 15);
        assert_eq!(summary.carriers[9].metrics.flights, 6);
    }

    #[test]
    fn test_merge_partitions_match_sequential() {
        let rows: Vec<FlightRecord> = (0..10)
            .map(|i| {
                rec(
                    (2024, 1 + (i % 3) as u32, 1 + i as u32),
                    if i % 2 == 0 { "AA" } else { "WN" },
                    ("ORD", "MDW"),
                    i as f64 * 4.0,
                )
            })
            .collect();

        let mut sequential = AggregateContext::new();
        for r in &rows {
            sequential.record(r);
        }

        let mut left = AggregateContext::new();
        let mut right = AggregateContext::new();
        for r in &rows[..4] {
            left.record(r);
        }
        for r in &rows[4..] {
            right.record(r);
        }
        left.merge(right);

        let a = sequential.finalize();
        let b = left.finalize();
        assert_eq!(a.overall.flights, b.overall.flights);
        assert_eq!(a.overall.avg_arr_delay, b.overall.avg_arr_delay);
        assert_eq!(a.monthly.len(), b.monthly.len());
        assert_eq!(a.carriers[0].metrics, b.carriers[0].metrics);
    }

    #[test]
    fn test_unopenable_file_counted_not_fatal() {
        let mut ctx = AggregateContext::new();
        ctx.process_file(Path::new("/definitely/not/here.csv"), DEFAULT_CHUNKSIZE);
        assert_eq!(ctx.quality().files_unreadable, 1);
        assert_eq!(ctx.quality().files_processed, 0);
        assert_eq!(ctx.finalize().overall.flights, 0);
    }

    #[test]
    fn test_empty_input_is_missing_input() {
        let paths: [&Path; 0] = [];
        let err = aggregate_files(&paths, DEFAULT_CHUNKSIZE).unwrap_err();
        assert!(matches!(err, ReportError::MissingInput));
    }
}
