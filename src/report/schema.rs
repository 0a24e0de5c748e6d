//! Header inspection for the Kaggle flight-delay CSV exports.
//!
//! The dataset ships in two header vintages (2018-era `FL_DATE`/`ORIGIN`
//! uppercase names and the later `FlightDate`/`Origin` CamelCase names),
//! and some yearly files drop the five delay-cause columns entirely. Every
//! file is classified once, at open time, so row handling never has to probe
//! for a column's presence.

use csv::StringRecord;

/// Delay causes reported by the dataset, in column order.
pub const CAUSES: [Cause; 5] = [
    Cause::Carrier,
    Cause::Weather,
    Cause::Nas,
    Cause::Security,
    Cause::LateAircraft,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cause {
    Carrier,
    Weather,
    Nas,
    Security,
    LateAircraft,
}

impl Cause {
    pub fn label(self) -> &'static str {
        match self {
            Cause::Carrier => "Carrier Delay",
            Cause::Weather => "Weather Delay",
            Cause::Nas => "Nas Delay",
            Cause::Security => "Security Delay",
            Cause::LateAircraft => "Late Aircraft Delay",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Cause::Carrier => &["CARRIER_DELAY", "CarrierDelay"],
            Cause::Weather => &["WEATHER_DELAY", "WeatherDelay"],
            Cause::Nas => &["NAS_DELAY", "NASDelay"],
            Cause::Security => &["SECURITY_DELAY", "SecurityDelay"],
            Cause::LateAircraft => &["LATE_AIRCRAFT_DELAY", "LateAircraftDelay"],
        }
    }
}

/// Accepted header spellings for each required column.
///
/// The `Operating_Airline ` entry is not a typo: one export vintage carries
/// a trailing space in that header cell.
const FL_DATE_ALIASES: &[&str] = &["FL_DATE", "FlightDate"];
const CARRIER_ALIASES: &[&str] = &[
    "OP_CARRIER",
    "IATA_Code_Marketing_Airline",
    "Marketing_Airline_Network",
    "IATA_Code_Operating_Airline",
    "Operating_Airline",
    "Operating_Airline ",
];
const ORIGIN_ALIASES: &[&str] = &["ORIGIN", "Origin"];
const DEST_ALIASES: &[&str] = &["DEST", "Dest"];
const ARR_DELAY_ALIASES: &[&str] = &["ARR_DELAY", "ArrDelay", "ArrDelayMinutes"];
const DEP_DELAY_ALIASES: &[&str] = &["DEP_DELAY", "DepDelay", "DepDelayMinutes"];
const CANCELLED_ALIASES: &[&str] = &["CANCELLED", "Cancelled"];
const DIVERTED_ALIASES: &[&str] = &["DIVERTED", "Diverted"];

/// Column indices resolved from one file's header row.
///
/// Cause indices are all-or-nothing: a file either contributes cause minutes
/// for every cause or is treated as having no cause data at all, so a file
/// missing one cause column never shows up as zero minutes for that cause.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub date: usize,
    pub carrier: usize,
    pub origin: usize,
    pub dest: usize,
    pub arr_delay: usize,
    pub dep_delay: usize,
    pub cancelled: usize,
    pub diverted: usize,
    pub causes: Option<[usize; 5]>,
}

impl ColumnMap {
    pub fn has_cause_columns(&self) -> bool {
        self.causes.is_some()
    }
}

/// A required column was not found under any known alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMismatch {
    pub column: &'static str,
}

impl std::fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "required column {} not found in header", self.column)
    }
}

fn find(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.iter().any(|a| *a == h))
}

fn find_required(
    headers: &StringRecord,
    canonical: &'static str,
    aliases: &[&str],
) -> Result<usize, SchemaMismatch> {
    find(headers, aliases).ok_or(SchemaMismatch { column: canonical })
}

/// Resolves a header row into a [`ColumnMap`], classifying the file.
///
/// Returns `Err(SchemaMismatch)` when any required column is absent; the
/// caller skips the whole file in that case. A file lacking any of the five
/// cause columns comes back with `causes: None`.
pub fn classify_header(headers: &StringRecord) -> Result<ColumnMap, SchemaMismatch> {
    let date = find_required(headers, "FL_DATE", FL_DATE_ALIASES)?;
    let carrier = find_required(headers, "OP_CARRIER", CARRIER_ALIASES)?;
    let origin = find_required(headers, "ORIGIN", ORIGIN_ALIASES)?;
    let dest = find_required(headers, "DEST", DEST_ALIASES)?;
    let arr_delay = find_required(headers, "ARR_DELAY", ARR_DELAY_ALIASES)?;
    let dep_delay = find_required(headers, "DEP_DELAY", DEP_DELAY_ALIASES)?;
    let cancelled = find_required(headers, "CANCELLED", CANCELLED_ALIASES)?;
    let diverted = find_required(headers, "DIVERTED", DIVERTED_ALIASES)?;

    let mut cause_indices = [0usize; 5];
    let mut all_present = true;
    for cause in CAUSES {
        match find(headers, cause.aliases()) {
            Some(idx) => cause_indices[cause.index()] = idx,
            None => {
                all_present = false;
                break;
            }
        }
    }

    Ok(ColumnMap {
        date,
        carrier,
        origin,
        dest,
        arr_delay,
        dep_delay,
        cancelled,
        diverted,
        causes: all_present.then_some(cause_indices),
    })
}
