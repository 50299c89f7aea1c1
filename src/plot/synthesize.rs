//! Turning a dataset plus grammar state into a drawable [`PlotSpec`].
//!
//! Synthesis resolves each mapped channel against the dataset columns,
//! groups rows by the color and shape channels, normalizes size and alpha
//! values, and hands the result to the plot kind for series construction.

use crate::dataset::clean;
use crate::grammar::{AxisScale, Channel, CoordSystem, GrammarState};
use crate::naming;
use crate::plot::kind::{ChannelFrame, ChannelValues, GroupSpec, Kind};
use crate::plot::palette::{self, DEFAULT_POINT_COLOR, SERIES_ALPHA};
use crate::plot::types::{Axis, AxisKind, LegendEntry, Marker, PlotSpec, Series, SeriesGeometry};
use crate::{BosquesError, Result};
use polars::prelude::*;
use std::collections::HashMap;

/// Marker size when the size channel has no spread.
const BASE_POINT_SIZE: f64 = 10.0;
/// Smallest marker size produced by the size channel.
const MIN_POINT_SIZE: f64 = 5.0;
/// Size range spanned between the smallest and largest values.
const POINT_SIZE_RANGE: f64 = 15.0;

/// Build a plot from a dataset and the current grammar state.
///
/// # Errors
///
/// Returns a grammar error when a required channel is unmapped, and a plot
/// error when a mapped column is missing, has an unusable type, or violates
/// the axis scales.
pub fn synthesize(table: &DataFrame, state: &GrammarState) -> Result<PlotSpec> {
    state.validate()?;
    let kind = Kind::from_type(state.plot_type);

    for (channel, variable) in state.mapped() {
        if !kind.uses_channel(channel) {
            tracing::warn!(
                channel = %channel,
                variable,
                kind = %kind,
                "channel is not used by this plot kind"
            );
        }
    }

    let mut missing: Vec<&str> = Vec::new();
    for (channel, variable) in state.mapped() {
        if kind.uses_channel(channel) && !has_column(table, variable) && !missing.contains(&variable)
        {
            missing.push(variable);
        }
    }
    if !missing.is_empty() {
        return Err(BosquesError::Plot(format!(
            "missing columns in dataset: {}",
            missing.join(", ")
        )));
    }

    let x_name = state
        .get(Channel::X)
        .ok_or_else(|| BosquesError::Grammar("the x channel is not mapped".to_string()))?;
    let y_name = state
        .get(Channel::Y)
        .filter(|_| kind.uses_channel(Channel::Y));

    // A flipped coordinate system swaps the positional channels and their scales
    let flipped = state.coords == CoordSystem::Flipped;
    let (x_name, y_name, x_scale, y_scale) = match (flipped, y_name) {
        (true, Some(y)) => (y, Some(x_name), state.y_scale, state.x_scale),
        (true, None) => {
            tracing::warn!("flipped coordinates need both x and y mapped; ignoring");
            (x_name, None, state.x_scale, state.y_scale)
        }
        (false, y) => (x_name, y, state.x_scale, state.y_scale),
    };

    let x_values = positional_values(table, x_name)?;
    let (y_values, y_axis_kind) = match y_name {
        Some(name) => {
            let values = positional_values(table, name)?;
            let axis_kind = values.axis_kind();
            let numeric = values.as_numeric().map(<[f64]>::to_vec).ok_or_else(|| {
                BosquesError::Plot(format!(
                    "cannot plot non-numeric y values from '{}'",
                    name
                ))
            })?;
            (Some(numeric), axis_kind)
        }
        None => (None, AxisKind::Numeric),
    };

    let groups = build_groups(table, state, &kind)?;
    let sizes = match state.get(Channel::Size) {
        Some(variable) if kind.uses_channel(Channel::Size) => {
            Some(normalize_sizes(numeric_values(table, variable, Channel::Size)?))
        }
        _ => None,
    };
    let alphas = match state.get(Channel::Alpha) {
        Some(variable) if kind.uses_channel(Channel::Alpha) => {
            Some(normalize_alphas(numeric_values(table, variable, Channel::Alpha)?))
        }
        _ => None,
    };

    let frame = ChannelFrame {
        x: x_values,
        y: y_values,
        groups,
        sizes,
        alphas,
    };

    check_log_scale(x_scale, frame.x.as_numeric(), "x")?;
    if let Some(ys) = frame.y.as_deref() {
        check_log_scale(y_scale, Some(ys), "y")?;
    }

    let output = kind.synthesize(&frame)?;

    let mut x_axis = Axis::new(x_name, frame.x.axis_kind(), x_scale);
    x_axis.ticks = output.x_ticks;
    let y_label = output
        .y_label
        .unwrap_or_else(|| y_name.map(str::to_string).unwrap_or_default());
    let y_axis = Axis::new(y_label, y_axis_kind, y_scale);

    let title = match y_name {
        Some(y) => format!("{}: {} vs {}", kind, x_name, y),
        None => format!("{}: {}", kind, x_name),
    };
    let legend = build_legend(&output.series);
    let id = naming::new_plot_id();
    tracing::info!(
        id = %id,
        kind = %kind,
        series = output.series.len(),
        "synthesized plot"
    );

    Ok(PlotSpec {
        id,
        kind: state.plot_type,
        title,
        x_axis,
        y_axis,
        coords: state.coords,
        series: output.series,
        legend,
    })
}

fn has_column(table: &DataFrame, name: &str) -> bool {
    table.get_column_names().iter().any(|c| c.as_str() == name)
}

// =============================================================================
// Channel resolution
// =============================================================================

/// Resolve a positional channel column to plottable values.
///
/// Numeric columns pass through, date and datetime columns become epoch
/// seconds, and string columns are tried as dates, then as decimals, before
/// falling back to categories.
fn positional_values(table: &DataFrame, variable: &str) -> Result<ChannelValues> {
    let column = table.column(variable).map_err(to_plot_err)?;
    let series = column.as_materialized_series();
    let dtype = series.dtype();

    if dtype.is_integer() || dtype.is_float() {
        let casted = series.cast(&DataType::Float64).map_err(to_plot_err)?;
        let values = casted
            .f64()
            .map_err(to_plot_err)?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        return Ok(ChannelValues::Numeric(values));
    }

    match dtype {
        DataType::String => {
            let ca = series.str().map_err(to_plot_err)?;
            let raw: Vec<Option<&str>> = ca.into_iter().collect();
            Ok(string_values(&raw))
        }
        DataType::Date => {
            let ca = series.date().map_err(to_plot_err)?;
            let physical = &ca.0;
            let values = physical
                .into_iter()
                .map(|v| v.map(|days| days as f64 * 86_400.0).unwrap_or(f64::NAN))
                .collect();
            Ok(ChannelValues::Temporal(values))
        }
        DataType::Datetime(unit, _) => {
            let divisor = match unit {
                TimeUnit::Nanoseconds => 1e9,
                TimeUnit::Microseconds => 1e6,
                TimeUnit::Milliseconds => 1e3,
            };
            let ca = series.datetime().map_err(to_plot_err)?;
            let physical = &ca.0;
            let values = physical
                .into_iter()
                .map(|v| v.map(|t| t as f64 / divisor).unwrap_or(f64::NAN))
                .collect();
            Ok(ChannelValues::Temporal(values))
        }
        _ => Err(BosquesError::Plot(format!(
            "cannot plot values of type {} from column '{}'",
            dtype, variable
        ))),
    }
}

fn string_values(raw: &[Option<&str>]) -> ChannelValues {
    if let Some(values) = try_dates(raw) {
        return ChannelValues::Temporal(values);
    }
    if let Some(values) = try_decimals(raw) {
        return ChannelValues::Numeric(values);
    }
    ChannelValues::Categorical(
        raw.iter()
            .map(|v| {
                v.and_then(|s| {
                    if s.trim().is_empty() {
                        None
                    } else {
                        Some(s.to_string())
                    }
                })
            })
            .collect(),
    )
}

/// Parse every non-blank value as a date, or bail out on the first failure.
fn try_dates(raw: &[Option<&str>]) -> Option<Vec<f64>> {
    let mut values = Vec::with_capacity(raw.len());
    let mut parsed = 0usize;
    for &v in raw {
        match v.map(str::trim) {
            None | Some("") => values.push(f64::NAN),
            Some(s) => {
                let date = clean::parse_date(s).ok()?;
                values.push(date_to_epoch_seconds(date));
                parsed += 1;
            }
        }
    }
    (parsed > 0).then_some(values)
}

fn try_decimals(raw: &[Option<&str>]) -> Option<Vec<f64>> {
    let mut values = Vec::with_capacity(raw.len());
    let mut parsed = 0usize;
    for &v in raw {
        match v.map(str::trim) {
            None | Some("") => values.push(f64::NAN),
            Some(s) => match clean::parse_decimal(s) {
                Ok(Some(x)) => {
                    values.push(x);
                    parsed += 1;
                }
                Ok(None) => values.push(f64::NAN),
                Err(_) => return None,
            },
        }
    }
    (parsed > 0).then_some(values)
}

fn date_to_epoch_seconds(date: chrono::NaiveDate) -> f64 {
    let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    date.signed_duration_since(epoch).num_days() as f64 * 86_400.0
}

/// Resolve a channel that must carry numeric or temporal values.
fn numeric_values(table: &DataFrame, variable: &str, channel: Channel) -> Result<Vec<f64>> {
    let values = positional_values(table, variable)?;
    match values.as_numeric() {
        Some(v) => Ok(v.to_vec()),
        None => Err(BosquesError::Plot(format!(
            "cannot use non-numeric values from '{}' for the {} channel",
            variable, channel
        ))),
    }
}

/// Stringified values for a grouping channel.
fn label_values(table: &DataFrame, variable: &str) -> Result<Vec<Option<String>>> {
    let series = table
        .column(variable)
        .map_err(to_plot_err)?
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(to_plot_err)?;
    Ok(series
        .str()
        .map_err(to_plot_err)?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

// =============================================================================
// Grouping
// =============================================================================

/// Split rows into groups by the distinct color and shape values, in order
/// of first appearance. Rows with a missing grouping value are excluded.
fn build_groups(table: &DataFrame, state: &GrammarState, kind: &Kind) -> Result<Vec<GroupSpec>> {
    let color_variable = state
        .get(Channel::Color)
        .filter(|_| kind.uses_channel(Channel::Color));
    let shape_variable = state
        .get(Channel::Shape)
        .filter(|_| kind.uses_channel(Channel::Shape));
    let height = table.height();

    if color_variable.is_none() && shape_variable.is_none() {
        return Ok(vec![implicit_group(height)]);
    }
    let same_variable = color_variable.is_some() && color_variable == shape_variable;

    let color_labels = color_variable
        .map(|v| label_values(table, v))
        .transpose()?;
    let shape_labels = shape_variable
        .map(|v| label_values(table, v))
        .transpose()?;

    let mut groups: Vec<GroupSpec> = Vec::new();
    let mut slots: HashMap<(Option<usize>, Option<usize>), usize> = HashMap::new();
    let mut color_levels: Vec<String> = Vec::new();
    let mut shape_levels: Vec<String> = Vec::new();
    let mut dropped = 0usize;

    for row in 0..height {
        let color_key = if let Some(labels) = &color_labels {
            match &labels[row] {
                Some(value) => Some(level_index(&mut color_levels, value)),
                None => {
                    dropped += 1;
                    continue;
                }
            }
        } else {
            None
        };
        let shape_key = if let Some(labels) = &shape_labels {
            match &labels[row] {
                Some(value) => Some(level_index(&mut shape_levels, value)),
                None => {
                    dropped += 1;
                    continue;
                }
            }
        } else {
            None
        };

        let slot = *slots.entry((color_key, shape_key)).or_insert_with(|| {
            let label = match (color_key, shape_key) {
                (Some(c), Some(_)) if same_variable => color_levels[c].clone(),
                (Some(c), Some(s)) => {
                    format!("{} / {}", color_levels[c], shape_levels[s])
                }
                (Some(c), None) => color_levels[c].clone(),
                (None, Some(s)) => shape_levels[s].clone(),
                (None, None) => String::new(),
            };
            groups.push(GroupSpec {
                label: Some(label),
                color: color_key
                    .map(palette::series_color)
                    .unwrap_or(DEFAULT_POINT_COLOR),
                marker: shape_key
                    .map(palette::series_marker)
                    .unwrap_or(Marker::Circle),
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].rows.push(row);
    }

    if dropped > 0 {
        tracing::warn!(dropped, "excluded rows with missing grouping values");
    }
    if groups.is_empty() {
        groups.push(implicit_group(0));
    }
    Ok(groups)
}

fn implicit_group(height: usize) -> GroupSpec {
    GroupSpec {
        label: None,
        color: DEFAULT_POINT_COLOR,
        marker: Marker::Circle,
        rows: (0..height).collect(),
    }
}

fn level_index(levels: &mut Vec<String>, value: &str) -> usize {
    match levels.iter().position(|l| l == value) {
        Some(i) => i,
        None => {
            levels.push(value.to_string());
            levels.len() - 1
        }
    }
}

// =============================================================================
// Channel normalization
// =============================================================================

/// Map raw size values onto marker sizes between 5 and 20 pixels.
fn normalize_sizes(values: Vec<f64>) -> Vec<f64> {
    match finite_range(&values) {
        Some((min, max)) if max > min => values
            .iter()
            .map(|&v| {
                if v.is_finite() {
                    MIN_POINT_SIZE + POINT_SIZE_RANGE * (v - min) / (max - min)
                } else {
                    BASE_POINT_SIZE
                }
            })
            .collect(),
        _ => vec![BASE_POINT_SIZE; values.len()],
    }
}

/// Map raw alpha values onto the 0.2 to 1.0 opacity range.
fn normalize_alphas(values: Vec<f64>) -> Vec<u8> {
    match finite_range(&values) {
        Some((min, max)) if max > min => values
            .iter()
            .map(|&v| {
                if v.is_finite() {
                    ((0.2 + 0.8 * (v - min) / (max - min)) * 255.0).round() as u8
                } else {
                    SERIES_ALPHA
                }
            })
            .collect(),
        _ => vec![SERIES_ALPHA; values.len()],
    }
}

fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;
    for &v in values {
        if v.is_finite() {
            range = Some(match range {
                None => (v, v),
                Some((min, max)) => (min.min(v), max.max(v)),
            });
        }
    }
    range
}

fn check_log_scale(scale: AxisScale, values: Option<&[f64]>, axis: &str) -> Result<()> {
    if scale != AxisScale::Log {
        return Ok(());
    }
    match values {
        None => Err(BosquesError::Plot(format!(
            "log scale cannot be applied to categorical {} values",
            axis
        ))),
        Some(vs) => {
            if vs.iter().any(|v| v.is_finite() && *v <= 0.0) {
                Err(BosquesError::Plot(format!(
                    "log scale requires positive {} values",
                    axis
                )))
            } else {
                Ok(())
            }
        }
    }
}

fn build_legend(series: &[Series]) -> Vec<LegendEntry> {
    series
        .iter()
        .filter_map(|s| {
            s.label.as_ref().map(|label| LegendEntry {
                label: label.clone(),
                color: s.color,
                marker: match &s.geometry {
                    SeriesGeometry::Points { marker, .. } => Some(*marker),
                    SeriesGeometry::Line { marker, .. } => Some(*marker),
                    SeriesGeometry::Bars { .. } => None,
                },
                visible: true,
            })
        })
        .collect()
}

fn to_plot_err(err: PolarsError) -> BosquesError {
    BosquesError::Plot(err.to_string())
}
