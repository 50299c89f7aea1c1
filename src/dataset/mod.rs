//! Dataset unification: many workbook sheets into one table.
//!
//! A [`Workbook`] holds the raw sheets of a loaded file. [`Workbook::unify`]
//! transforms each selected sheet onto the common schema (see
//! [`transform`]), then outer-joins them on the canonical `Fecha` and
//! `Estacion` keys so that every original record survives as one row and the
//! final column set is the union of the sheets' mapped columns.
//!
//! Sheets that cannot participate (missing from the workbook, or missing a
//! join key after transformation) are skipped and noted in the
//! [`UnifyReport`]; malformed values inside a participating sheet abort the
//! whole unification with an error.

pub mod clean;
pub mod transform;

pub use clean::{date_column, numeric_column, parse_date, parse_decimal, standardize_date};
pub use transform::SheetKind;

use crate::naming::{self, DATE_COLUMN, STATION_COLUMN};
use crate::variables::VariableRegistry;
use crate::{BosquesError, Result};
use polars::prelude::*;

/// Messages accumulated while unifying a workbook.
///
/// Mirrors what happened to each selected sheet: transformed, skipped, or
/// joined, plus the final column renames.
#[derive(Debug, Clone, Default)]
pub struct UnifyReport {
    pub messages: Vec<String>,
}

impl UnifyReport {
    fn push(&mut self, message: String) {
        self.messages.push(message);
    }
}

impl std::fmt::Display for UnifyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.messages.join("\n"))
    }
}

/// Result of a successful unification.
#[derive(Debug, Clone)]
pub struct UnifiedDataset {
    /// One row per original record, keyed by `Fecha` and `Estacion`
    pub table: DataFrame,
    /// What happened to each sheet along the way
    pub report: UnifyReport,
}

/// A loaded workbook: named sheets in file order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    name: String,
    sheets: Vec<(String, DataFrame)>,
}

impl Workbook {
    /// Create an empty workbook with a display name (usually the file name).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sheets: Vec::new(),
        }
    }

    /// Workbook display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a sheet, replacing any existing sheet with the same name.
    pub fn add_sheet(&mut self, name: impl Into<String>, df: DataFrame) {
        let name = name.into();
        match self.sheets.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = df,
            None => self.sheets.push((name, df)),
        }
    }

    /// Sheet names in file order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Look up a sheet by name.
    pub fn get(&self, name: &str) -> Option<&DataFrame> {
        self.sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, df)| df)
    }

    /// Number of sheets.
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Check whether the workbook has no sheets.
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Human-readable summary: file name plus per-sheet row and column info.
    pub fn summary(&self) -> String {
        if self.sheets.is_empty() {
            return "No data loaded".to_string();
        }
        let mut lines = vec![
            format!("File: {}", self.name),
            format!("Number of sheets: {}", self.sheets.len()),
            String::new(),
            "Available sheets:".to_string(),
        ];
        for (name, df) in &self.sheets {
            lines.push(String::new());
            lines.push(format!("{}:", name));
            lines.push(format!("- Rows: {}", df.height()));
            lines.push(format!("- Columns: {}", df.width()));
            let names: Vec<String> = df
                .get_column_names()
                .iter()
                .map(|c| c.to_string())
                .collect();
            lines.push(format!("- Columns: {}", names.join(", ")));
        }
        lines.join("\n")
    }

    /// Unify the selected sheets into one table.
    ///
    /// Each sheet is transformed to the common schema, stripped of
    /// bookkeeping columns, and outer-joined on `Fecha` and `Estacion`.
    /// Columns that collide between sheets get a `_<sheet>` suffix. After
    /// joining, workbook column names are renamed to registry display names.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing was selected, if no selected sheet
    /// survives transformation, or if a sheet contains malformed values.
    pub fn unify(&self, selected: &[&str], registry: &VariableRegistry) -> Result<UnifiedDataset> {
        if self.sheets.is_empty() || selected.is_empty() {
            return Err(BosquesError::Dataset(
                "no data loaded or no sheets selected".to_string(),
            ));
        }

        let mut report = UnifyReport::default();
        let mut transformed: Vec<(&str, DataFrame)> = Vec::new();

        for &sheet_name in selected {
            let Some(df) = self.get(sheet_name) else {
                report.push(format!("Sheet {} not found in data", sheet_name));
                continue;
            };
            let sheet = transform::transform_sheet(sheet_name, df, registry)?;
            if !has_column(&sheet, DATE_COLUMN) || !has_column(&sheet, STATION_COLUMN) {
                report.push(format!(
                    "Warning: Sheet {} missing required columns (Fecha, Estacion)",
                    sheet_name
                ));
                continue;
            }
            let sheet = transform::drop_unnecessary(&sheet, selected);
            transformed.push((sheet_name, sheet));
            report.push(format!("Transformed {}", sheet_name));
        }

        let mut iter = transformed.into_iter();
        let Some((base_name, mut unified)) = iter.next() else {
            return Err(BosquesError::Dataset(
                "no valid sheets to process".to_string(),
            ));
        };

        for (sheet_name, sheet) in iter {
            unified = join_sheets(unified, sheet, base_name, sheet_name)?;
            report.push(format!(
                "Joined sheet {} on Fecha and Estacion",
                sheet_name
            ));
        }

        let mut unified = unified
            .sort(
                vec![DATE_COLUMN, STATION_COLUMN],
                SortMultipleOptions::default().with_nulls_last(true),
            )
            .map_err(to_dataset_err)?;

        unified = transform::drop_unnecessary(&unified, selected);
        apply_display_names(&mut unified, registry, &mut report);

        tracing::info!(
            rows = unified.height(),
            columns = unified.width(),
            "unified dataset created"
        );
        Ok(UnifiedDataset {
            table: unified,
            report,
        })
    }
}

/// Outer-join two transformed sheets on the canonical keys.
///
/// Collisions outside the keys are resolved before the join: the left copy
/// gets the base sheet's suffix, the right copy the joining sheet's suffix.
fn join_sheets(
    mut left: DataFrame,
    mut right: DataFrame,
    base_name: &str,
    sheet_name: &str,
) -> Result<DataFrame> {
    let overlap: Vec<String> = left
        .get_column_names()
        .iter()
        .filter(|name| {
            let name = name.as_str();
            name != DATE_COLUMN && name != STATION_COLUMN && has_column(&right, name)
        })
        .map(|name| name.to_string())
        .collect();

    for column in &overlap {
        rename_unless_taken(&mut left, column, &naming::sheet_suffixed(column, base_name))?;
        rename_unless_taken(&mut right, column, &naming::sheet_suffixed(column, sheet_name))?;
    }

    left.lazy()
        .join(
            right.lazy(),
            [col(DATE_COLUMN), col(STATION_COLUMN)],
            [col(DATE_COLUMN), col(STATION_COLUMN)],
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        )
        .collect()
        .map_err(to_dataset_err)
}

/// Rename unified columns to registry display names where a mapping exists.
fn apply_display_names(df: &mut DataFrame, registry: &VariableRegistry, report: &mut UnifyReport) {
    let mapping = registry.column_mapping();
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect();

    let mut renamed: Vec<String> = Vec::new();
    for name in names {
        let Some(display) = mapping.get(&name) else {
            continue;
        };
        if display == &name {
            continue;
        }
        if has_column(df, display) {
            // The tracing macro's expansion shadows a local named `display`
            let display_name = display.as_str();
            tracing::warn!(
                column = name,
                display = display_name,
                "display name already taken, keeping workbook name"
            );
            continue;
        }
        // Both names were just checked, so the rename cannot fail
        if df.rename(&name, display.as_str().into()).is_ok() {
            renamed.push(format!("{} -> {}", name, display));
        }
    }
    if !renamed.is_empty() {
        report.push(format!("Renamed columns: {}", renamed.join(", ")));
    }
}

fn rename_unless_taken(df: &mut DataFrame, from: &str, to: &str) -> Result<()> {
    if has_column(df, to) {
        tracing::warn!(from, to, "suffixed column name already taken, keeping original");
        return Ok(());
    }
    df.rename(from, to.into()).map_err(to_dataset_err)?;
    Ok(())
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

fn to_dataset_err(e: PolarsError) -> BosquesError {
    BosquesError::Dataset(e.to_string())
}
