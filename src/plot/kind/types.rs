//! Inputs and outputs shared by every plot kind.

use crate::plot::types::{AxisKind, Marker, Rgba, Series};

/// Resolved values for a positional channel.
///
/// Numeric and temporal values carry missing entries as `NaN`; categorical
/// values carry them as `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValues {
    /// Plain numbers
    Numeric(Vec<f64>),
    /// Seconds since the Unix epoch
    Temporal(Vec<f64>),
    /// Raw category labels, one per row
    Categorical(Vec<Option<String>>),
}

impl ChannelValues {
    pub fn len(&self) -> usize {
        match self {
            ChannelValues::Numeric(v) | ChannelValues::Temporal(v) => v.len(),
            ChannelValues::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn axis_kind(&self) -> AxisKind {
        match self {
            ChannelValues::Numeric(_) => AxisKind::Numeric,
            ChannelValues::Temporal(_) => AxisKind::Temporal,
            ChannelValues::Categorical(_) => AxisKind::Categorical,
        }
    }

    /// The values as a numeric slice, unless categorical.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            ChannelValues::Numeric(v) | ChannelValues::Temporal(v) => Some(v),
            ChannelValues::Categorical(_) => None,
        }
    }

    /// The category labels, for categorical values only.
    pub fn as_categories(&self) -> Option<&[Option<String>]> {
        match self {
            ChannelValues::Categorical(v) => Some(v),
            _ => None,
        }
    }
}

/// One group of rows sharing a color and marker.
///
/// Synthesis always receives at least one group; an ungrouped plot gets a
/// single group with no label covering every row.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    /// Legend label; `None` for the implicit whole-dataset group
    pub label: Option<String>,
    pub color: Rgba,
    pub marker: Marker,
    /// Row indices into the channel vectors
    pub rows: Vec<usize>,
}

impl GroupSpec {
    /// Values of this group's rows, in row order.
    pub fn gather<T: Copy>(&self, values: &[T]) -> Vec<T> {
        self.rows.iter().map(|&i| values[i]).collect()
    }
}

/// Channel data handed to a kind for synthesis.
#[derive(Debug, Clone)]
pub struct ChannelFrame {
    pub x: ChannelValues,
    pub y: Option<Vec<f64>>,
    pub groups: Vec<GroupSpec>,
    /// Normalized per-row marker sizes
    pub sizes: Option<Vec<f64>>,
    /// Normalized per-row alphas
    pub alphas: Option<Vec<u8>>,
}

impl ChannelFrame {
    /// Number of rows in the frame.
    pub fn height(&self) -> usize {
        self.x.len()
    }
}

/// What a kind produces: the series plus axis adjustments.
#[derive(Debug, Clone, Default)]
pub struct KindOutput {
    pub series: Vec<Series>,
    /// Tick positions and labels when x is categorical
    pub x_ticks: Option<Vec<(f64, String)>>,
    /// Override for the y axis label
    pub y_label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_values_accessors() {
        let numeric = ChannelValues::Numeric(vec![1.0, 2.0]);
        assert_eq!(numeric.len(), 2);
        assert_eq!(numeric.axis_kind(), AxisKind::Numeric);
        assert_eq!(numeric.as_numeric(), Some(&[1.0, 2.0][..]));
        assert!(numeric.as_categories().is_none());

        let temporal = ChannelValues::Temporal(vec![0.0]);
        assert_eq!(temporal.axis_kind(), AxisKind::Temporal);
        assert!(temporal.as_numeric().is_some());

        let categorical =
            ChannelValues::Categorical(vec![Some("a".to_string()), None]);
        assert_eq!(categorical.len(), 2);
        assert_eq!(categorical.axis_kind(), AxisKind::Categorical);
        assert!(categorical.as_numeric().is_none());
        assert_eq!(categorical.as_categories().map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_group_gather() {
        let group = GroupSpec {
            label: None,
            color: Rgba::opaque(0, 0, 0),
            marker: Marker::Circle,
            rows: vec![2, 0],
        };
        assert_eq!(group.gather(&[10.0, 20.0, 30.0]), vec![30.0, 10.0]);
        assert_eq!(group.gather(&[1u8, 2, 3]), vec![3, 1]);
    }
}
