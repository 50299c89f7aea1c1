//! Centralized naming conventions for bosques-generated identifiers.
//!
//! All synthetic column names and generated artifact names use a
//! double-underscore prefix pattern to avoid collision with column names
//! coming from user workbooks.
//!
//! # Categories
//!
//! - **Stat columns**: Columns produced by aggregating transforms (`__bosques_stat_<name>`)
//! - **Join columns**: Canonical key columns every transformed sheet must carry
//! - **Sheet suffixes**: Disambiguation suffixes for columns that collide during unification
//! - **Plot IDs**: Per-plot UUID identifying a synthesized plot
//! - **Report files**: Timestamped file names for generated task reports

use const_format::concatcp;
use uuid::Uuid;

// ============================================================================
// Base Building Blocks
// ============================================================================

/// Base prefix for all bosques synthetic identifiers
const BOSQUES_PREFIX: &str = "__bosques_";

// ============================================================================
// Canonical Join Columns
// ============================================================================

/// Canonical date key column present in every transformed sheet
pub const DATE_COLUMN: &str = "Fecha";

/// Canonical station key column present in every transformed sheet
pub const STATION_COLUMN: &str = "Estacion";

/// Display name of the station variable as it appears in the registry
/// (accented form, distinct from the plain-ASCII column name)
pub const STATION_VARIABLE: &str = "Estación";

// ============================================================================
// Derived Constants
// ============================================================================

/// Full prefix for stat columns: `__bosques_stat_`
const STAT_PREFIX: &str = concatcp!(BOSQUES_PREFIX, "stat_");

// ============================================================================
// Constructor Functions
// ============================================================================

/// Generate column name for statistical transform output.
///
/// These columns are produced by aggregating transforms such as the bar
/// kind's mean collapse.
///
/// # Example
/// ```
/// use bosques::naming;
/// assert_eq!(naming::stat_column("count"), "__bosques_stat_count");
/// assert_eq!(naming::stat_column("mean"), "__bosques_stat_mean");
/// ```
pub fn stat_column(stat_name: &str) -> String {
    format!("{}{}", STAT_PREFIX, stat_name)
}

/// Generate the suffixed form of a column that collided during unification.
///
/// When two sheets contribute a column with the same name, the copy coming
/// from the right side of the merge is renamed with the sheet name appended.
///
/// # Example
/// ```
/// use bosques::naming;
/// assert_eq!(naming::sheet_suffixed("id", "ESFP_dendrometros_final"), "id_ESFP_dendrometros_final");
/// assert_eq!(naming::sheet_suffixed("Year", "CARM_desfronde"), "Year_CARM_desfronde");
/// ```
pub fn sheet_suffixed(column: &str, sheet_name: &str) -> String {
    format!("{}{}", column, sheet_suffix(sheet_name))
}

/// Generate the merge suffix for a sheet.
///
/// # Example
/// ```
/// use bosques::naming;
/// assert_eq!(naming::sheet_suffix("ESFP_capturas"), "_ESFP_capturas");
/// ```
pub fn sheet_suffix(sheet_name: &str) -> String {
    format!("_{}", sheet_name)
}

/// Generate a fresh plot ID (32 hex characters, no dashes).
///
/// Each synthesized plot gets its own ID so downstream consumers can tell
/// plots apart when several are rendered from the same dataset.
///
/// # Example
/// ```
/// use bosques::naming;
/// let id = naming::new_plot_id();
/// assert_eq!(id.len(), 32);
/// assert_ne!(naming::new_plot_id(), id);
/// ```
pub fn new_plot_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Generate the file name for a task queue report.
///
/// Format: `<YYYYMMDD-HHMMSS>_plot_list.txt`
///
/// # Example
/// ```
/// use bosques::naming;
/// use chrono::NaiveDate;
/// let ts = NaiveDate::from_ymd_opt(2024, 3, 5)
///     .and_then(|d| d.and_hms_opt(14, 30, 9))
///     .ok_or("bad timestamp")?;
/// assert_eq!(naming::report_file_name(&ts), "20240305-143009_plot_list.txt");
/// # Ok::<(), &'static str>(())
/// ```
pub fn report_file_name(timestamp: &chrono::NaiveDateTime) -> String {
    format!("{}_plot_list.txt", timestamp.format("%Y%m%d-%H%M%S"))
}
