//! Accumulators and the finalized summary types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::report::record::FlightRecord;
use crate::report::schema::CAUSES;

/// Arrival delays at or under this many minutes count as on time.
pub const ON_TIME_THRESHOLD_MINUTES: f64 = 15.0;

/// Running totals for one group key.
///
/// Holds only sums and counts so two accumulators merge by plain addition;
/// rates and means are derived once, at finalization.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Accumulator {
    pub flights: u64,
    pub arr_delay_sum: f64,
    pub arr_delay_n: u64,
    pub dep_delay_sum: f64,
    pub dep_delay_n: u64,
    pub on_time: u64,
    pub cancelled: u64,
    pub diverted: u64,
    pub cause_minutes: [f64; 5],
    /// Rows that carried cause columns, whether or not the cells were set.
    /// Distinguishes a genuine zero-minute total from absent cause data.
    pub cause_rows: u64,
}

impl Accumulator {
    pub fn record(&mut self, rec: &FlightRecord) {
        self.flights += 1;

        if let Some(arr) = rec.arr_delay {
            self.arr_delay_sum += arr;
            self.arr_delay_n += 1;
            if !rec.cancelled && arr <= ON_TIME_THRESHOLD_MINUTES {
                self.on_time += 1;
            }
        }
        if let Some(dep) = rec.dep_delay {
            self.dep_delay_sum += dep;
            self.dep_delay_n += 1;
        }
        if rec.cancelled {
            self.cancelled += 1;
        }
        if rec.diverted {
            self.diverted += 1;
        }
        if let Some(causes) = rec.causes {
            self.cause_rows += 1;
            for (total, minutes) in self.cause_minutes.iter_mut().zip(causes) {
                if let Some(m) = minutes {
                    *total += m;
                }
            }
        }
    }

    /// Adds `other` into `self`. Addition of sums and counts is commutative,
    /// so per-file partitions merge to the same totals as a sequential pass.
    pub fn merge(&mut self, other: &Accumulator) {
        self.flights += other.flights;
        self.arr_delay_sum += other.arr_delay_sum;
        self.arr_delay_n += other.arr_delay_n;
        self.dep_delay_sum += other.dep_delay_sum;
        self.dep_delay_n += other.dep_delay_n;
        self.on_time += other.on_time;
        self.cancelled += other.cancelled;
        self.diverted += other.diverted;
        for (total, add) in self.cause_minutes.iter_mut().zip(other.cause_minutes) {
            *total += add;
        }
        self.cause_rows += other.cause_rows;
    }

    pub fn metrics(&self) -> GroupMetrics {
        let ratio = |num: u64, den: u64| (den > 0).then(|| num as f64 / den as f64);
        let mean = |sum: f64, n: u64| (n > 0).then(|| sum / n as f64);

        GroupMetrics {
            flights: self.flights,
            avg_arr_delay: mean(self.arr_delay_sum, self.arr_delay_n),
            avg_dep_delay: mean(self.dep_delay_sum, self.dep_delay_n),
            on_time_rate: ratio(self.on_time, self.flights - self.cancelled),
            cancellation_rate: ratio(self.cancelled, self.flights),
            diversion_rate: ratio(self.diverted, self.flights),
        }
    }
}

/// Derived metrics for one group, `None` where the denominator was zero.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupMetrics {
    pub flights: u64,
    pub avg_arr_delay: Option<f64>,
    pub avg_dep_delay: Option<f64>,
    pub on_time_rate: Option<f64>,
    pub cancellation_rate: Option<f64>,
    pub diversion_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct MonthlySummary {
    pub month: String,
    #[serde(flatten)]
    pub metrics: GroupMetrics,
}

#[derive(Debug, Serialize)]
pub struct CarrierSummary {
    pub carrier: String,
    #[serde(flatten)]
    pub metrics: GroupMetrics,
}

#[derive(Debug, Serialize)]
pub struct AirportSummary {
    pub origin: String,
    #[serde(flatten)]
    pub metrics: GroupMetrics,
}

#[derive(Debug, Serialize)]
pub struct RouteSummary {
    pub origin: String,
    pub dest: String,
    #[serde(flatten)]
    pub metrics: GroupMetrics,
}

/// Total delay minutes attributed to one cause across all cause-bearing rows.
#[derive(Debug, Serialize)]
pub struct CauseTotal {
    pub cause: &'static str,
    pub minutes: f64,
}

/// Input-completeness counters surfaced alongside the results so a reader
/// can judge how much data the summary actually rests on.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct DataQuality {
    pub files_processed: u64,
    pub files_unreadable: u64,
    pub files_bad_schema: u64,
    pub rows_skipped: u64,
    pub rows_without_cause_data: u64,
}

/// Complete finalized output of one aggregation run.
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub generated_at: DateTime<Utc>,
    pub overall: GroupMetrics,
    pub monthly: Vec<MonthlySummary>,
    pub carriers: Vec<CarrierSummary>,
    pub airports: Vec<AirportSummary>,
    pub routes: Vec<RouteSummary>,
    pub cause_totals: Vec<CauseTotal>,
    pub quality: DataQuality,
}

/// Cause totals sorted descending by minutes. Empty when no input row
/// carried cause columns.
pub fn cause_totals(overall: &Accumulator) -> Vec<CauseTotal> {
    if overall.cause_rows == 0 {
        return Vec::new();
    }
    let mut totals: Vec<CauseTotal> = CAUSES
        .into_iter()
        .map(|c| CauseTotal {
            cause: c.label(),
            minutes: overall.cause_minutes[c.index()],
        })
        .collect();
    totals.sort_by(|a, b| b.minutes.total_cmp(&a.minutes));
    totals
}
