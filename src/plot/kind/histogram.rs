//! Histogram of a single numeric variable.

use super::{ChannelFrame, KindOutput, KindTrait, KindType};
use crate::grammar::Channel;
use crate::plot::palette::DEFAULT_POINT_COLOR;
use crate::plot::types::{Series, SeriesGeometry};
use crate::{BosquesError, Result};
use std::fmt;

const BIN_COUNT: usize = 20;

/// Bars counting values per bin.
#[derive(Debug, Clone, Copy)]
pub struct HistogramKind;

impl fmt::Display for HistogramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind_type())
    }
}

impl KindTrait for HistogramKind {
    fn kind_type(&self) -> KindType {
        KindType::Histogram
    }

    fn uses_channel(&self, channel: Channel) -> bool {
        matches!(channel, Channel::X)
    }

    fn synthesize(&self, frame: &ChannelFrame) -> Result<KindOutput> {
        let xs = frame.x.as_numeric().ok_or_else(|| {
            BosquesError::Plot(
                "histograms require numeric or temporal values".to_string(),
            )
        })?;

        let values: Vec<f64> = xs.iter().copied().filter(|v| v.is_finite()).collect();
        let dropped = xs.len() - values.len();
        if dropped > 0 {
            tracing::debug!(dropped, "ignored non-finite values");
        }
        if values.is_empty() {
            return Err(BosquesError::Plot(
                "histograms need at least one finite value".to_string(),
            ));
        }

        let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            // Degenerate range, widen by half a unit each side
            lo -= 0.5;
            hi += 0.5;
        }
        let bin_width = (hi - lo) / BIN_COUNT as f64;

        let mut counts = vec![0usize; BIN_COUNT];
        for &v in &values {
            let index = (((v - lo) / bin_width) as usize).min(BIN_COUNT - 1);
            counts[index] += 1;
        }

        let centers = (0..BIN_COUNT)
            .map(|i| lo + (i as f64 + 0.5) * bin_width)
            .collect();
        let color = frame
            .groups
            .first()
            .map(|g| g.color)
            .unwrap_or(DEFAULT_POINT_COLOR);

        Ok(KindOutput {
            series: vec![Series {
                label: None,
                x: centers,
                y: counts.into_iter().map(|c| c as f64).collect(),
                geometry: SeriesGeometry::Bars { width: bin_width },
                color,
                alphas: None,
                visible: true,
            }],
            x_ticks: None,
            y_label: Some("count".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::kind::{ChannelValues, GroupSpec};
    use crate::plot::types::Marker;

    fn frame(values: Vec<f64>) -> ChannelFrame {
        let rows = values.len();
        ChannelFrame {
            x: ChannelValues::Numeric(values),
            y: None,
            groups: vec![GroupSpec {
                label: None,
                color: DEFAULT_POINT_COLOR,
                marker: Marker::Circle,
                rows: (0..rows).collect(),
            }],
            sizes: None,
            alphas: None,
        }
    }

    #[test]
    fn test_counts_cover_all_values() {
        let values: Vec<f64> = (0..100).map(|i| i as f64 / 5.0).collect();
        let out = HistogramKind.synthesize(&frame(values)).unwrap();
        let s = &out.series[0];
        assert_eq!(s.x.len(), 20);
        assert_eq!(s.y.iter().sum::<f64>(), 100.0);
        assert_eq!(out.y_label.as_deref(), Some("count"));
    }

    #[test]
    fn test_maximum_lands_in_last_bin() {
        let out = HistogramKind
            .synthesize(&frame(vec![0.0, 10.0]))
            .unwrap();
        let s = &out.series[0];
        assert_eq!(s.y[0], 1.0);
        assert_eq!(s.y[19], 1.0);
        match s.geometry {
            SeriesGeometry::Bars { width } => assert!((width - 0.5).abs() < 1e-9),
            ref other => panic!("expected bars, got {:?}", other),
        }
    }

    #[test]
    fn test_constant_values_widen_range() {
        let out = HistogramKind
            .synthesize(&frame(vec![4.0, 4.0, 4.0]))
            .unwrap();
        let s = &out.series[0];
        assert_eq!(s.y.iter().sum::<f64>(), 3.0);
        // All mass in one bin, centered inside (3.5, 4.5)
        let peak = s
            .y
            .iter()
            .position(|&c| c == 3.0)
            .map(|i| s.x[i])
            .unwrap();
        assert!(peak > 3.5 && peak < 4.5);
    }

    #[test]
    fn test_nan_values_ignored() {
        let out = HistogramKind
            .synthesize(&frame(vec![1.0, f64::NAN, 2.0]))
            .unwrap();
        assert_eq!(out.series[0].y.iter().sum::<f64>(), 2.0);
    }

    #[test]
    fn test_no_finite_values_rejected() {
        let err = HistogramKind
            .synthesize(&frame(vec![f64::NAN]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("finite"));
    }

    #[test]
    fn test_categorical_rejected() {
        let mut f = frame(vec![]);
        f.x = ChannelValues::Categorical(vec![Some("a".to_string())]);
        assert!(HistogramKind.synthesize(&f).is_err());
    }
}
