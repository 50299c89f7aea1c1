//! Per-sheet transforms that bring workbook sheets onto the common schema.
//!
//! Every source sheet has its own layout, but after transformation each one
//! carries the canonical `Fecha` and `Estacion` key columns plus its
//! measurement columns, ready for unification.
//!
//! Sheet layouts handled here:
//!
//! - **Temperatures**: wide format with one column per station and hourly
//!   readings. Melted to long format and aggregated to daily min/max/mean.
//! - **Dendrometers**: diameter readings keyed by a station column named
//!   `Punto` (or `CARM` for regional sheets).
//! - **Litterfall**: organic matter weights keyed by `Esfp` (or `CARM`).
//! - **Captures**: trap capture counts with one column per species.

use crate::dataset::clean::{date_column, numeric_column};
use crate::naming::{self, DATE_COLUMN, STATION_COLUMN};
use crate::variables::VariableRegistry;
use crate::{BosquesError, Result};
use polars::prelude::*;

// ============================================================================
// Canonical Column Names
// ============================================================================

/// Long-format temperature value column produced by the melt
pub const TEMPERATURE_COLUMN: &str = "Temperatura";

/// Daily minimum temperature
pub const TEMP_MIN: &str = "Temp_Min";

/// Daily maximum temperature
pub const TEMP_MAX: &str = "Temp_Max";

/// Daily mean temperature
pub const TEMP_MEAN: &str = "Temp_Mean";

/// Number of readings contributing to a daily aggregate
pub const TEMP_COUNT: &str = "Temp_Count";

/// Dendrometer diameter column
pub const DIAMETER_COLUMN: &str = "Diam";

/// Litterfall organic matter column
pub const ORGANIC_MATTER_COLUMN: &str = "MO";

/// Identifier columns in temperature sheets, excluded from the melt
const TEMP_ID_COLUMNS: &[&str] = &["id", "year", "nmes", "mes", DATE_COLUMN, "Hora"];

/// Columns in capture sheets that are not species counts
const CAPTURE_ID_COLUMNS: &[&str] = &["id", "Year", "Mes", "Nmes", DATE_COLUMN, STATION_COLUMN];

/// Bookkeeping columns dropped before and after unification
const BASE_DROP_COLUMNS: &[&str] = &["id", "year", "nmes", "mes", "Year", "Mes", "Nmes"];

// ============================================================================
// Sheet Kind Detection
// ============================================================================

/// The recognized sheet layouts.
///
/// Detection is by substring of the sheet name, case-insensitive, matching
/// the naming scheme of the field workbooks (`ESFP_datos_temperaturas_final`,
/// `CARM_dendrometros`, and so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Temperatures,
    Dendrometers,
    Litterfall,
    Captures,
    Unknown,
}

impl SheetKind {
    /// Detect the layout of a sheet from its name.
    pub fn detect(sheet_name: &str) -> Self {
        let lower = sheet_name.to_lowercase();
        if lower.contains("temperaturas") {
            SheetKind::Temperatures
        } else if lower.contains("dendrometros") {
            SheetKind::Dendrometers
        } else if lower.contains("desfronde") {
            SheetKind::Litterfall
        } else if lower.contains("capturas") {
            SheetKind::Captures
        } else {
            SheetKind::Unknown
        }
    }

    /// Source column holding the station label, if the layout has one.
    ///
    /// Regional sheets (name contains `CARM`) use a different station column
    /// than the ESFP plot sheets. Temperature sheets have no station column;
    /// their stations come from the melt.
    pub fn station_source(&self, carm: bool) -> Option<&'static str> {
        match self {
            SheetKind::Temperatures | SheetKind::Unknown => None,
            SheetKind::Dendrometers => Some(if carm { "CARM" } else { "Punto" }),
            SheetKind::Litterfall | SheetKind::Captures => {
                Some(if carm { "CARM" } else { "Esfp" })
            }
        }
    }
}

impl std::fmt::Display for SheetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetKind::Temperatures => write!(f, "temperatures"),
            SheetKind::Dendrometers => write!(f, "dendrometers"),
            SheetKind::Litterfall => write!(f, "litterfall"),
            SheetKind::Captures => write!(f, "captures"),
            SheetKind::Unknown => write!(f, "unknown"),
        }
    }
}

// ============================================================================
// Transforms
// ============================================================================

/// Transform a sheet according to its detected layout, then standardize the
/// join columns from the registry's alias lists.
pub fn transform_sheet(
    sheet_name: &str,
    df: &DataFrame,
    registry: &VariableRegistry,
) -> Result<DataFrame> {
    let kind = SheetKind::detect(sheet_name);
    let carm = sheet_name.contains("CARM");
    tracing::debug!(sheet = sheet_name, %kind, carm, "transforming sheet");

    let transformed = match kind {
        SheetKind::Temperatures => temperatures(df)?,
        SheetKind::Dendrometers => dendrometers(df, carm)?,
        SheetKind::Litterfall => litterfall(df, carm)?,
        SheetKind::Captures => captures(df, carm)?,
        SheetKind::Unknown => {
            tracing::warn!(sheet = sheet_name, "unknown sheet layout, leaving untransformed");
            df.clone()
        }
    };

    standardize_join_columns(transformed, registry, sheet_name)
}

/// Melt a wide temperature sheet to long format and aggregate by day.
///
/// Every column outside the identifier set is treated as a station. The
/// result has one row per day and station with `Temp_Min`, `Temp_Max`,
/// `Temp_Mean`, and `Temp_Count` columns, sorted by day and station.
pub fn temperatures(df: &DataFrame) -> Result<DataFrame> {
    if !has_column(df, DATE_COLUMN) {
        return Err(BosquesError::Dataset(format!(
            "temperature sheet is missing the '{}' column",
            DATE_COLUMN
        )));
    }

    let station_columns: Vec<String> = df
        .get_column_names()
        .iter()
        .filter(|name| !TEMP_ID_COLUMNS.contains(&name.as_str()))
        .map(|name| name.to_string())
        .collect();
    if station_columns.is_empty() {
        return Err(BosquesError::Dataset(
            "temperature sheet has no station columns to melt".to_string(),
        ));
    }

    let dates = date_column(df.column(DATE_COLUMN).map_err(to_dataset_err)?)?;

    // Wide to long: one chunk per station column, stacked
    let mut melted: Option<DataFrame> = None;
    for station in &station_columns {
        let mut readings = numeric_column(df.column(station).map_err(to_dataset_err)?)?;
        readings.rename(TEMPERATURE_COLUMN.into());
        let labels = Series::new(STATION_COLUMN.into(), vec![station.as_str(); df.height()]);
        let chunk = DataFrame::new(vec![dates.clone().into(), labels.into(), readings.into()])
            .map_err(to_dataset_err)?;
        match melted.as_mut() {
            None => melted = Some(chunk),
            Some(acc) => {
                acc.vstack_mut(&chunk).map_err(to_dataset_err)?;
            }
        }
    }
    let melted = melted.ok_or_else(|| {
        BosquesError::Dataset("temperature sheet produced no rows".to_string())
    })?;

    tracing::info!(
        stations = station_columns.len(),
        readings = melted.height(),
        "aggregating temperature data by day"
    );

    melted
        .lazy()
        .filter(
            col(DATE_COLUMN)
                .is_not_null()
                .and(col(STATION_COLUMN).is_not_null()),
        )
        .group_by([col(DATE_COLUMN), col(STATION_COLUMN)])
        .agg([
            col(TEMPERATURE_COLUMN).min().alias(TEMP_MIN),
            col(TEMPERATURE_COLUMN).max().alias(TEMP_MAX),
            col(TEMPERATURE_COLUMN).mean().alias(TEMP_MEAN),
            col(TEMPERATURE_COLUMN)
                .count()
                .cast(DataType::Int64)
                .alias(TEMP_COUNT),
        ])
        .sort(
            vec![DATE_COLUMN, STATION_COLUMN],
            SortMultipleOptions::default(),
        )
        .collect()
        .map_err(to_dataset_err)
}

/// Transform a dendrometer sheet: station rename plus diameter cleaning.
pub fn dendrometers(df: &DataFrame, carm: bool) -> Result<DataFrame> {
    let mut df = df.clone();
    if let Some(source) = SheetKind::Dendrometers.station_source(carm) {
        rename_station(&mut df, source)?;
    }
    clean_numeric_in_place(&mut df, DIAMETER_COLUMN)?;
    clean_date_in_place(&mut df, DATE_COLUMN)?;
    Ok(df)
}

/// Transform a litterfall sheet: station rename plus organic matter cleaning.
pub fn litterfall(df: &DataFrame, carm: bool) -> Result<DataFrame> {
    let mut df = df.clone();
    if let Some(source) = SheetKind::Litterfall.station_source(carm) {
        rename_station(&mut df, source)?;
    }
    clean_numeric_in_place(&mut df, ORGANIC_MATTER_COLUMN)?;
    clean_date_in_place(&mut df, DATE_COLUMN)?;
    Ok(df)
}

/// Transform a captures sheet: station rename, date cleaning, and numeric
/// cleaning of every species column.
pub fn captures(df: &DataFrame, carm: bool) -> Result<DataFrame> {
    let mut df = df.clone();
    if let Some(source) = SheetKind::Captures.station_source(carm) {
        rename_station(&mut df, source)?;
    }
    clean_date_in_place(&mut df, DATE_COLUMN)?;

    let species_columns: Vec<String> = df
        .get_column_names()
        .iter()
        .filter(|name| !CAPTURE_ID_COLUMNS.contains(&name.as_str()))
        .map(|name| name.to_string())
        .collect();
    for column in species_columns {
        clean_numeric_in_place(&mut df, &column)?;
    }
    Ok(df)
}

/// Rename join-key aliases to their canonical column names.
///
/// For each join variable in the registry, the first alias present in the
/// sheet is renamed to the canonical column. Existing canonical columns are
/// never overwritten.
pub fn standardize_join_columns(
    mut df: DataFrame,
    registry: &VariableRegistry,
    sheet_name: &str,
) -> Result<DataFrame> {
    for (canonical, aliases) in registry.join_aliases() {
        if has_column(&df, canonical) {
            continue;
        }
        for alias in aliases {
            if has_column(&df, alias) {
                df.rename(alias, canonical.into()).map_err(to_dataset_err)?;
                tracing::info!(
                    sheet = sheet_name,
                    from = alias,
                    to = canonical,
                    "renamed join column"
                );
                break;
            }
        }
    }
    Ok(df)
}

/// Names of bookkeeping columns to drop, including the suffixed variants
/// that unification creates for each selected sheet.
pub fn drop_columns_for(sheet_names: &[&str]) -> Vec<String> {
    let mut columns: Vec<String> = BASE_DROP_COLUMNS.iter().map(|c| c.to_string()).collect();
    for sheet in sheet_names {
        for base in BASE_DROP_COLUMNS {
            columns.push(naming::sheet_suffixed(base, sheet));
        }
    }
    columns
}

/// Drop bookkeeping columns that are present in `df`.
pub fn drop_unnecessary(df: &DataFrame, sheet_names: &[&str]) -> DataFrame {
    let candidates = drop_columns_for(sheet_names);
    let present: Vec<&str> = candidates
        .iter()
        .map(String::as_str)
        .filter(|name| has_column(df, name))
        .collect();
    if present.is_empty() {
        return df.clone();
    }
    tracing::info!(columns = present.join(", "), "dropping bookkeeping columns");
    df.drop_many(present)
}

// ============================================================================
// Helpers
// ============================================================================

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

fn rename_station(df: &mut DataFrame, source: &str) -> Result<()> {
    if has_column(df, source) && !has_column(df, STATION_COLUMN) {
        df.rename(source, STATION_COLUMN.into())
            .map_err(to_dataset_err)?;
    }
    Ok(())
}

fn clean_numeric_in_place(df: &mut DataFrame, name: &str) -> Result<()> {
    let cleaned = numeric_column(df.column(name).map_err(|_| {
        BosquesError::Dataset(format!("required column '{}' not found", name))
    })?)?;
    df.with_column(cleaned).map_err(to_dataset_err)?;
    Ok(())
}

fn clean_date_in_place(df: &mut DataFrame, name: &str) -> Result<()> {
    let cleaned = date_column(df.column(name).map_err(|_| {
        BosquesError::Dataset(format!("required column '{}' not found", name))
    })?)?;
    df.with_column(cleaned).map_err(to_dataset_err)?;
    Ok(())
}

fn to_dataset_err(e: PolarsError) -> BosquesError {
    BosquesError::Dataset(e.to_string())
}
