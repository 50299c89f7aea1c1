//! Bars, with mean aggregation over repeated x values.
//!
//! Categorical x values become integer positions with tick labels. Repeated
//! x values collapse to their mean, and a color grouping draws clustered
//! sub-bars around each position.

use super::{ChannelFrame, ChannelValues, GroupSpec, KindOutput, KindTrait, KindType};
use crate::grammar::Channel;
use crate::naming;
use crate::plot::types::{Series, SeriesGeometry};
use crate::{BosquesError, Result};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Total width of one bar cluster, in x units.
const BAR_WIDTH: f64 = 0.6;

/// Vertical bars per x position.
#[derive(Debug, Clone, Copy)]
pub struct BarKind;

impl fmt::Display for BarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind_type())
    }
}

impl KindTrait for BarKind {
    fn kind_type(&self) -> KindType {
        KindType::Bar
    }

    fn uses_channel(&self, channel: Channel) -> bool {
        matches!(channel, Channel::X | Channel::Y | Channel::Color)
    }

    fn synthesize(&self, frame: &ChannelFrame) -> Result<KindOutput> {
        let ys = frame.y.as_deref().ok_or_else(|| {
            BosquesError::Plot("bar plots require y values".to_string())
        })?;
        match &frame.x {
            ChannelValues::Categorical(categories) => {
                categorical_bars(categories, ys, &frame.groups)
            }
            ChannelValues::Numeric(xs) | ChannelValues::Temporal(xs) => {
                numeric_bars(xs, ys, &frame.groups)
            }
        }
    }
}

fn bar_series(group: &GroupSpec, x: Vec<f64>, y: Vec<f64>, width: f64) -> Series {
    Series {
        label: group.label.clone(),
        x,
        y,
        geometry: SeriesGeometry::Bars { width },
        color: group.color,
        alphas: None,
        visible: true,
    }
}

/// Center of sub-bar `index` within the cluster at `position`.
fn cluster_offset(position: f64, index: usize, sub_width: f64) -> f64 {
    position - BAR_WIDTH / 2.0 + (index as f64 + 0.5) * sub_width
}

// =============================================================================
// Categorical x
// =============================================================================

fn categorical_bars(
    categories: &[Option<String>],
    ys: &[f64],
    groups: &[GroupSpec],
) -> Result<KindOutput> {
    // Rows without a category cannot be positioned
    let group_pairs: Vec<Vec<(&str, f64)>> = groups
        .iter()
        .map(|group| {
            group
                .rows
                .iter()
                .filter_map(|&i| categories[i].as_deref().map(|c| (c, ys[i])))
                .collect()
        })
        .collect();
    let dropped: usize =
        groups.iter().map(|g| g.rows.len()).sum::<usize>()
            - group_pairs.iter().map(|p| p.len()).sum::<usize>();
    if dropped > 0 {
        tracing::debug!(dropped, "ignored rows with missing categories");
    }

    let grouped = groups.iter().any(|g| g.label.is_some());
    if !grouped {
        let pairs = &group_pairs[0];
        let mut seen = HashSet::new();
        let has_duplicates = pairs.iter().any(|&(c, _)| !seen.insert(c));

        let (labels, values) = if has_duplicates {
            mean_by_category(pairs)?
        } else {
            (
                pairs.iter().map(|&(c, _)| c.to_string()).collect(),
                pairs.iter().map(|&(_, v)| v).collect(),
            )
        };
        let positions: Vec<f64> = (0..labels.len()).map(|i| i as f64).collect();
        let ticks = positions.iter().copied().zip(labels).collect();
        let series = vec![bar_series(&groups[0], positions, values, BAR_WIDTH)];
        return Ok(KindOutput {
            series,
            x_ticks: Some(ticks),
            y_label: None,
        });
    }

    // Clustered bars: categories are the sorted union across groups
    let union: Vec<&str> = group_pairs
        .iter()
        .flatten()
        .map(|&(c, _)| c)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let sub_width = BAR_WIDTH / groups.len() as f64;

    let mut series = Vec::with_capacity(groups.len());
    for (j, (group, pairs)) in groups.iter().zip(&group_pairs).enumerate() {
        let (labels, means) = mean_by_category(pairs)?;
        let by_category: HashMap<&str, f64> = labels
            .iter()
            .map(|c| c.as_str())
            .zip(means.iter().copied())
            .collect();
        let x = (0..union.len())
            .map(|i| cluster_offset(i as f64, j, sub_width))
            .collect();
        let y = union
            .iter()
            .map(|c| by_category.get(c).copied().unwrap_or(f64::NAN))
            .collect();
        series.push(bar_series(group, x, y, sub_width));
    }

    let ticks = union
        .iter()
        .enumerate()
        .map(|(i, c)| (i as f64, c.to_string()))
        .collect();
    Ok(KindOutput {
        series,
        x_ticks: Some(ticks),
        y_label: None,
    })
}

// =============================================================================
// Numeric x
// =============================================================================

fn numeric_bars(xs: &[f64], ys: &[f64], groups: &[GroupSpec]) -> Result<KindOutput> {
    let grouped = groups.iter().any(|g| g.label.is_some());
    if !grouped {
        let group = &groups[0];
        let x = group.gather(xs);
        let y = group.gather(ys);

        let mut seen = HashSet::new();
        let mut nan_keys = 0usize;
        let mut has_duplicates = false;
        for &v in &x {
            if v.is_nan() {
                nan_keys += 1;
            } else if !seen.insert(v.to_bits()) {
                has_duplicates = true;
            }
        }
        has_duplicates |= nan_keys > 1;

        let (x, y) = if has_duplicates {
            let pairs: Vec<(f64, f64)> = x
                .iter()
                .copied()
                .zip(y.iter().copied())
                .filter(|(k, _)| !k.is_nan())
                .collect();
            mean_by_position(&pairs)?
        } else {
            (x, y)
        };
        return Ok(KindOutput {
            series: vec![bar_series(group, x, y, BAR_WIDTH)],
            x_ticks: None,
            y_label: None,
        });
    }

    // Clustered bars around each distinct x, one cluster slot per group
    let group_pairs: Vec<Vec<(f64, f64)>> = groups
        .iter()
        .map(|group| {
            group
                .rows
                .iter()
                .filter_map(|&i| {
                    if xs[i].is_nan() {
                        None
                    } else {
                        Some((xs[i], ys[i]))
                    }
                })
                .collect()
        })
        .collect();

    let mut union: Vec<f64> = group_pairs
        .iter()
        .flatten()
        .map(|&(k, _)| k)
        .collect();
    union.sort_by(f64::total_cmp);
    union.dedup();
    let sub_width = BAR_WIDTH / groups.len() as f64;

    let mut series = Vec::with_capacity(groups.len());
    for (j, (group, pairs)) in groups.iter().zip(&group_pairs).enumerate() {
        let (keys, means) = mean_by_position(pairs)?;
        let by_key: HashMap<u64, f64> = keys
            .iter()
            .map(|k| k.to_bits())
            .zip(means.iter().copied())
            .collect();
        let x = union
            .iter()
            .map(|&k| cluster_offset(k, j, sub_width))
            .collect();
        let y = union
            .iter()
            .map(|k| by_key.get(&k.to_bits()).copied().unwrap_or(f64::NAN))
            .collect();
        series.push(bar_series(group, x, y, sub_width));
    }

    Ok(KindOutput {
        series,
        x_ticks: None,
        y_label: None,
    })
}

// =============================================================================
// Mean aggregation
// =============================================================================

fn mean_by_category(pairs: &[(&str, f64)]) -> Result<(Vec<String>, Vec<f64>)> {
    let stat = naming::stat_column("mean");
    let categories: Vec<&str> = pairs.iter().map(|&(c, _)| c).collect();
    let values: Vec<Option<f64>> = pairs
        .iter()
        .map(|&(_, v)| if v.is_nan() { None } else { Some(v) })
        .collect();

    let df = df!("category" => categories, "value" => values).map_err(to_plot_err)?;
    let out = df
        .lazy()
        .group_by([col("category")])
        .agg([col("value").mean().alias(stat.as_str())])
        .sort(vec!["category"], SortMultipleOptions::default())
        .collect()
        .map_err(to_plot_err)?;

    let labels = out
        .column("category")
        .map_err(to_plot_err)?
        .as_materialized_series()
        .str()
        .map_err(to_plot_err)?
        .into_iter()
        .map(|c| c.unwrap_or_default().to_string())
        .collect();
    let means = extract_means(&out, stat.as_str())?;
    Ok((labels, means))
}

fn mean_by_position(pairs: &[(f64, f64)]) -> Result<(Vec<f64>, Vec<f64>)> {
    let stat = naming::stat_column("mean");
    let keys: Vec<f64> = pairs.iter().map(|&(k, _)| k).collect();
    let values: Vec<Option<f64>> = pairs
        .iter()
        .map(|&(_, v)| if v.is_nan() { None } else { Some(v) })
        .collect();

    let df = df!("position" => keys, "value" => values).map_err(to_plot_err)?;
    let out = df
        .lazy()
        .group_by([col("position")])
        .agg([col("value").mean().alias(stat.as_str())])
        .sort(vec!["position"], SortMultipleOptions::default())
        .collect()
        .map_err(to_plot_err)?;

    let positions = out
        .column("position")
        .map_err(to_plot_err)?
        .as_materialized_series()
        .f64()
        .map_err(to_plot_err)?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    let means = extract_means(&out, stat.as_str())?;
    Ok((positions, means))
}

fn extract_means(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(df
        .column(name)
        .map_err(to_plot_err)?
        .as_materialized_series()
        .f64()
        .map_err(to_plot_err)?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

fn to_plot_err(err: PolarsError) -> BosquesError {
    BosquesError::Plot(err.to_string())
}
