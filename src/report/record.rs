//! Row parsing: raw CSV cells into a typed [`FlightRecord`].

use chrono::NaiveDate;
use csv::StringRecord;

use crate::report::schema::ColumnMap;

/// One parsed flight row.
///
/// Numeric fields stay `None` when the cell is empty so missing values are
/// excluded from means rather than averaged in as zero. `causes` is `None`
/// for rows read from files without cause columns; individual entries are
/// `None` when the cell itself is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightRecord {
    pub date: NaiveDate,
    pub carrier: String,
    pub origin: String,
    pub dest: String,
    pub arr_delay: Option<f64>,
    pub dep_delay: Option<f64>,
    pub cancelled: bool,
    pub diverted: bool,
    pub causes: Option<[Option<f64>; 5]>,
}

/// Why a row was skipped. Skips are counted, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSkip {
    UnparseableDate,
    MissingCode,
    ShortRow,
}

fn cell<'a>(row: &'a StringRecord, idx: usize) -> Result<&'a str, RowSkip> {
    row.get(idx).map(str::trim).ok_or(RowSkip::ShortRow)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    // Some exports carry a midnight timestamp suffix.
    if let Some(prefix) = raw.get(..10) {
        if let Ok(d) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(d);
        }
    }
    NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok()
}

fn parse_minutes(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalizes a cancellation/diversion flag cell.
///
/// The exports encode these as `0.0`/`1.0`, bare integers, or textual
/// `Y`/`YES`/`TRUE`/`T`. Anything unrecognized (including empty) reads as
/// false, matching how the dataset marks the common case.
fn parse_flag(raw: &str) -> bool {
    if raw.is_empty() {
        return false;
    }
    if let Ok(v) = raw.parse::<f64>() {
        return v != 0.0;
    }
    matches!(
        raw.to_ascii_uppercase().as_str(),
        "Y" | "YES" | "TRUE" | "T"
    )
}

impl FlightRecord {
    /// Builds a record from one CSV row using the file's resolved columns.
    pub fn from_row(row: &StringRecord, map: &ColumnMap) -> Result<Self, RowSkip> {
        let date = parse_date(cell(row, map.date)?).ok_or(RowSkip::UnparseableDate)?;

        let carrier = cell(row, map.carrier)?;
        let origin = cell(row, map.origin)?;
        let dest = cell(row, map.dest)?;
        if carrier.is_empty() || origin.is_empty() || dest.is_empty() {
            return Err(RowSkip::MissingCode);
        }

        let arr_delay = parse_minutes(cell(row, map.arr_delay)?);
        let dep_delay = parse_minutes(cell(row, map.dep_delay)?);
        let cancelled = parse_flag(cell(row, map.cancelled)?);
        let diverted = parse_flag(cell(row, map.diverted)?);

        let causes = match map.causes {
            Some(indices) => {
                let mut minutes = [None; 5];
                for (slot, idx) in minutes.iter_mut().zip(indices) {
                    *slot = parse_minutes(cell(row, idx)?);
                }
                Some(minutes)
            }
            None => None,
        };

        Ok(FlightRecord {
            date,
            carrier: carrier.to_string(),
            origin: origin.to_string(),
            dest: dest.to_string(),
            arr_delay,
            dep_delay,
            cancelled,
            diverted,
            causes,
        })
    }

    /// Year-month key, e.g. `2024-01`.
    pub fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::schema::classify_header;

    fn map_without_causes() -> ColumnMap {
        classify_header(&StringRecord::from(vec![
            "FL_DATE", "OP_CARRIER", "ORIGIN", "DEST", "ARR_DELAY", "DEP_DELAY", "CANCELLED",
            "DIVERTED",
        ]))
        .unwrap()
    }

    fn row(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    #[test]
    fn test_parses_plain_row() {
        let rec = FlightRecord::from_row(
            &row(&["2024-01-01", "AA", "ORD", "LAX", "20", "10", "0", "0"]),
            &map_without_causes(),
        )
        .unwrap();
        assert_eq!(rec.month(), "2024-01");
        assert_eq!(rec.arr_delay, Some(20.0));
        assert!(!rec.cancelled);
        assert!(rec.causes.is_none());
    }

    #[test]
    fn test_empty_delay_is_missing_not_zero() {
        let rec = FlightRecord::from_row(
            &row(&["2024-01-01", "AA", "ORD", "LAX", "", "", "1.0", "0.0"]),
            &map_without_causes(),
        )
        .unwrap();
        assert_eq!(rec.arr_delay, None);
        assert_eq!(rec.dep_delay, None);
        assert!(rec.cancelled);
    }

    #[test]
    fn test_textual_flags() {
        for raw in ["Y", "yes", "TRUE", "t"] {
            assert!(parse_flag(raw), "{raw} should read as true");
        }
        for raw in ["", "N", "0", "0.0", "no"] {
            assert!(!parse_flag(raw), "{raw} should read as false");
        }
    }

    #[test]
    fn test_datetime_suffix_accepted() {
        assert_eq!(
            parse_date("2019-03-07 00:00:00"),
            NaiveDate::from_ymd_opt(2019, 3, 7)
        );
    }

    #[test]
    fn test_bad_date_skips_row() {
        let err = FlightRecord::from_row(
            &row(&["not-a-date", "AA", "ORD", "LAX", "5", "0", "0", "0"]),
            &map_without_causes(),
        )
        .unwrap_err();
        assert_eq!(err, RowSkip::UnparseableDate);
    }

    #[test]
    fn test_blank_carrier_skips_row() {
        let err = FlightRecord::from_row(
            &row(&["2024-01-01", " ", "ORD", "LAX", "5", "0", "0", "0"]),
            &map_without_causes(),
        )
        .unwrap_err();
        assert_eq!(err, RowSkip::MissingCode);
    }
}
