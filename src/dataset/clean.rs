//! Value-level cleaning for workbook cells.
//!
//! Field data arrives with comma decimal separators, `Na` markers, and dates
//! in half a dozen spellings. These helpers normalize single values and whole
//! columns into the canonical forms the rest of the pipeline expects:
//! `f64` measurements and `YYYY-MM-DD` date strings.

use crate::{BosquesError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use regex::Regex;
use std::sync::LazyLock;

/// Fast path for already-canonical dates
static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap()
});

/// Detects a time-of-day component
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,2}:\d{2}").unwrap()
});

/// Date formats tried in order for date-only strings.
///
/// Slash and dash forms are ambiguous; month-first is tried before day-first,
/// so day-first only applies when the month-first reading is impossible.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
];

/// Datetime formats tried in order when a time component is present.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

/// Parse a decimal value that may use a comma as the decimal separator.
///
/// The literal `Na` marker becomes `None`. Anything else must parse as a
/// number once commas are replaced with dots.
///
/// # Example
/// ```
/// use bosques::dataset::parse_decimal;
/// assert_eq!(parse_decimal("3,14")?, Some(3.14));
/// assert_eq!(parse_decimal("2.5")?, Some(2.5));
/// assert_eq!(parse_decimal("Na")?, None);
/// assert!(parse_decimal("abc").is_err());
/// # Ok::<(), bosques::BosquesError>(())
/// ```
pub fn parse_decimal(raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed == "Na" {
        return Ok(None);
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .map(Some)
        .map_err(|_| BosquesError::Dataset(format!("cannot parse decimal value '{}'", raw)))
}

/// Parse a date from any of the supported spellings.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();

    if ISO_DATE_RE.is_match(trimmed) {
        return NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map_err(|_| BosquesError::Dataset(format!("cannot parse date '{}'", raw)));
    }

    if TIME_RE.is_match(trimmed) {
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(dt.date());
            }
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }

    Err(BosquesError::Dataset(format!(
        "cannot parse date '{}'",
        raw
    )))
}

/// Normalize a date string to `YYYY-MM-DD`.
///
/// # Example
/// ```
/// use bosques::dataset::standardize_date;
/// assert_eq!(standardize_date("2024-03-05")?, "2024-03-05");
/// assert_eq!(standardize_date("13/05/2024")?, "2024-05-13");
/// assert_eq!(standardize_date("2024-03-05 14:30:00")?, "2024-03-05");
/// # Ok::<(), bosques::BosquesError>(())
/// ```
pub fn standardize_date(raw: &str) -> Result<String> {
    Ok(parse_date(raw)?.format("%Y-%m-%d").to_string())
}

/// Clean a column of measurements into `Float64`.
///
/// String columns are parsed value by value with [`parse_decimal`]; numeric
/// columns are cast. Nulls stay null.
///
/// # Errors
///
/// Returns an error if any value fails to parse, or if the column has a
/// type that cannot hold measurements (dates, booleans).
pub fn numeric_column(column: &Column) -> Result<Series> {
    let series = column.as_materialized_series();
    match series.dtype() {
        DataType::Float64 => Ok(series.clone()),
        dt if dt.is_integer() || dt.is_float() => series
            .cast(&DataType::Float64)
            .map_err(|e| BosquesError::Dataset(format!("cannot cast '{}': {}", series.name(), e))),
        DataType::String => {
            let ca = series
                .str()
                .map_err(|e| BosquesError::Dataset(e.to_string()))?;
            let mut values: Vec<Option<f64>> = Vec::with_capacity(ca.len());
            for opt in ca.into_iter() {
                match opt {
                    None => values.push(None),
                    Some(raw) => values.push(parse_decimal(raw)?),
                }
            }
            Ok(Series::new(series.name().clone(), values))
        }
        other => Err(BosquesError::Dataset(format!(
            "column '{}' has type {} and cannot be cleaned as numeric",
            series.name(),
            other
        ))),
    }
}

/// Normalize a date column to canonical `YYYY-MM-DD` strings.
///
/// Accepts string, date, and datetime columns. Nulls and blank strings stay
/// null.
pub fn date_column(column: &Column) -> Result<Series> {
    let series = column.as_materialized_series();
    let name = series.name().clone();
    match series.dtype() {
        DataType::String => {
            let ca = series
                .str()
                .map_err(|e| BosquesError::Dataset(e.to_string()))?;
            let mut values: Vec<Option<String>> = Vec::with_capacity(ca.len());
            for opt in ca.into_iter() {
                match opt {
                    None => values.push(None),
                    Some(raw) if raw.trim().is_empty() => values.push(None),
                    Some(raw) => values.push(Some(standardize_date(raw)?)),
                }
            }
            Ok(Series::new(name, values))
        }
        DataType::Date => {
            let ca = series
                .date()
                .map_err(|e| BosquesError::Dataset(e.to_string()))?;
            let unix_epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            let physical = &ca.0;
            let values: Vec<Option<String>> = physical
                .into_iter()
                .map(|opt| {
                    opt.map(|days| {
                        let date = unix_epoch + chrono::Duration::days(days as i64);
                        date.format("%Y-%m-%d").to_string()
                    })
                })
                .collect();
            Ok(Series::new(name, values))
        }
        DataType::Datetime(time_unit, _) => {
            let ca = series
                .datetime()
                .map_err(|e| BosquesError::Dataset(e.to_string()))?;
            let time_unit = *time_unit;
            let physical = &ca.0;
            let mut values: Vec<Option<String>> = Vec::with_capacity(ca.len());
            for opt in physical.into_iter() {
                match opt {
                    None => values.push(None),
                    Some(timestamp) => {
                        let micros = match time_unit {
                            TimeUnit::Microseconds => timestamp,
                            TimeUnit::Milliseconds => timestamp * 1_000,
                            TimeUnit::Nanoseconds => timestamp / 1_000,
                        };
                        let secs = micros.div_euclid(1_000_000);
                        let dt = chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0)
                            .ok_or_else(|| {
                                BosquesError::Dataset(format!(
                                    "timestamp {} in column '{}' is out of range",
                                    timestamp, name
                                ))
                            })?;
                        values.push(Some(dt.date_naive().format("%Y-%m-%d").to_string()));
                    }
                }
            }
            Ok(Series::new(name, values))
        }
        other => Err(BosquesError::Dataset(format!(
            "column '{}' has type {} and cannot be normalized as a date",
            series.name(),
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_comma_separator() {
        assert_eq!(parse_decimal("3,14").unwrap(), Some(3.14));
        assert_eq!(parse_decimal("12,5").unwrap(), Some(12.5));
    }

    #[test]
    fn test_parse_decimal_dot_separator() {
        assert_eq!(parse_decimal("3.14").unwrap(), Some(3.14));
        assert_eq!(parse_decimal("-7").unwrap(), Some(-7.0));
    }

    #[test]
    fn test_parse_decimal_na_marker() {
        assert_eq!(parse_decimal("Na").unwrap(), None);
        assert_eq!(parse_decimal("  Na  ").unwrap(), None);
    }

    #[test]
    fn test_parse_decimal_invalid() {
        assert!(parse_decimal("abc").is_err());
        assert!(parse_decimal("").is_err());
        // Lowercase marker is not recognized
        assert!(parse_decimal("na").is_err());
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date("2024-03-05").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn test_parse_date_slash_month_first_wins() {
        // Both readings are valid; month-first is preferred
        let date = parse_date("05/03/2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
    }

    #[test]
    fn test_parse_date_slash_day_first_fallback() {
        // 13 cannot be a month, so the day-first reading applies
        let date = parse_date("13/05/2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 13).unwrap());
    }

    #[test]
    fn test_parse_date_with_time() {
        let date = parse_date("2024-03-05 14:30:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        let date = parse_date("2024-03-05T00:00:00.000").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date("2024-13-40").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_standardize_date() {
        assert_eq!(standardize_date("2024/03/05").unwrap(), "2024-03-05");
        assert_eq!(standardize_date("13/05/2024").unwrap(), "2024-05-13");
    }

    #[test]
    fn test_numeric_column_from_strings() {
        let column: Column =
            Series::new("Diam".into(), &[Some("3,5"), Some("4.25"), Some("Na"), None]).into();
        let cleaned = numeric_column(&column).unwrap();
        assert_eq!(cleaned.name(), "Diam");
        let ca = cleaned.f64().unwrap();
        assert_eq!(ca.get(0), Some(3.5));
        assert_eq!(ca.get(1), Some(4.25));
        assert_eq!(ca.get(2), None);
        assert_eq!(ca.get(3), None);
    }

    #[test]
    fn test_numeric_column_cast_integers() {
        let column: Column = Series::new("MO".into(), &[1i32, 2, 3]).into();
        let cleaned = numeric_column(&column).unwrap();
        assert_eq!(cleaned.dtype(), &DataType::Float64);
        assert_eq!(cleaned.f64().unwrap().get(2), Some(3.0));
    }

    #[test]
    fn test_numeric_column_bad_value_errors() {
        let column: Column = Series::new("Diam".into(), &["3,5", "oops"]).into();
        let err = numeric_column(&column).unwrap_err().to_string();
        assert!(err.contains("oops"));
    }

    #[test]
    fn test_date_column_from_strings() {
        let column: Column =
            Series::new("Fecha".into(), &[Some("05/03/2024"), Some(""), None]).into();
        let cleaned = date_column(&column).unwrap();
        let ca = cleaned.str().unwrap();
        assert_eq!(ca.get(0), Some("2024-05-03"));
        assert_eq!(ca.get(1), None);
        assert_eq!(ca.get(2), None);
    }

    #[test]
    fn test_date_column_from_date_dtype() {
        let column: Column = Series::new("Fecha".into(), &[0i32, 31])
            .cast(&DataType::Date)
            .unwrap()
            .into();
        let cleaned = date_column(&column).unwrap();
        let ca = cleaned.str().unwrap();
        assert_eq!(ca.get(0), Some("1970-01-01"));
        assert_eq!(ca.get(1), Some("1970-02-01"));
    }

    #[test]
    fn test_date_column_from_datetime_dtype() {
        let column: Column = Series::new("Fecha".into(), &[86_400_000i64])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap()
            .into();
        let cleaned = date_column(&column).unwrap();
        assert_eq!(cleaned.str().unwrap().get(0), Some("1970-01-02"));
    }

    #[test]
    fn test_date_column_rejects_numeric() {
        let column: Column = Series::new("Fecha".into(), &[1.0f64]).into();
        assert!(date_column(&column).is_err());
    }
}
