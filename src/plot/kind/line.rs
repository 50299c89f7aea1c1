//! Connected lines with point markers.

use super::{ChannelFrame, KindOutput, KindTrait, KindType};
use crate::grammar::Channel;
use crate::plot::types::{Series, SeriesGeometry};
use crate::{BosquesError, Result};
use std::fmt;

const LINE_WIDTH: f64 = 1.0;
const MARKER_SIZE: f64 = 7.0;

/// One polyline per group, points ordered by x.
#[derive(Debug, Clone, Copy)]
pub struct LineKind;

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind_type())
    }
}

impl KindTrait for LineKind {
    fn kind_type(&self) -> KindType {
        KindType::Line
    }

    fn uses_channel(&self, channel: Channel) -> bool {
        matches!(
            channel,
            Channel::X | Channel::Y | Channel::Color | Channel::Shape
        )
    }

    fn synthesize(&self, frame: &ChannelFrame) -> Result<KindOutput> {
        let xs = frame.x.as_numeric().ok_or_else(|| {
            BosquesError::Plot(
                "line plots require numeric or temporal x values".to_string(),
            )
        })?;
        let ys = frame.y.as_deref().ok_or_else(|| {
            BosquesError::Plot("line plots require y values".to_string())
        })?;

        let mut series = Vec::with_capacity(frame.groups.len());
        for group in &frame.groups {
            let x = group.gather(xs);
            let y = group.gather(ys);

            // Connect points left to right; NaN x sorts to the end
            let mut order: Vec<usize> = (0..x.len()).collect();
            order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));

            series.push(Series {
                label: group.label.clone(),
                x: order.iter().map(|&i| x[i]).collect(),
                y: order.iter().map(|&i| y[i]).collect(),
                geometry: SeriesGeometry::Line {
                    width: LINE_WIDTH,
                    marker: group.marker,
                    marker_size: MARKER_SIZE,
                },
                color: group.color,
                alphas: None,
                visible: true,
            });
        }

        Ok(KindOutput {
            series,
            x_ticks: None,
            y_label: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::kind::{ChannelValues, GroupSpec};
    use crate::plot::palette::DEFAULT_POINT_COLOR;
    use crate::plot::types::Marker;

    fn single_group(rows: usize) -> Vec<GroupSpec> {
        vec![GroupSpec {
            label: None,
            color: DEFAULT_POINT_COLOR,
            marker: Marker::Circle,
            rows: (0..rows).collect(),
        }]
    }

    #[test]
    fn test_points_sorted_by_x() {
        let frame = ChannelFrame {
            x: ChannelValues::Numeric(vec![3.0, 1.0, 2.0]),
            y: Some(vec![30.0, 10.0, 20.0]),
            groups: single_group(3),
            sizes: None,
            alphas: None,
        };
        let out = LineKind.synthesize(&frame).unwrap();
        assert_eq!(out.series[0].x, vec![1.0, 2.0, 3.0]);
        assert_eq!(out.series[0].y, vec![10.0, 20.0, 30.0]);
        match out.series[0].geometry {
            SeriesGeometry::Line {
                width, marker_size, ..
            } => {
                assert_eq!(width, 1.0);
                assert_eq!(marker_size, 7.0);
            }
            ref other => panic!("expected line, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_x_sorts_last() {
        let frame = ChannelFrame {
            x: ChannelValues::Numeric(vec![f64::NAN, 2.0, 1.0]),
            y: Some(vec![0.0, 20.0, 10.0]),
            groups: single_group(3),
            sizes: None,
            alphas: None,
        };
        let out = LineKind.synthesize(&frame).unwrap();
        assert_eq!(out.series[0].x[0], 1.0);
        assert_eq!(out.series[0].x[1], 2.0);
        assert!(out.series[0].x[2].is_nan());
    }

    #[test]
    fn test_groups_sorted_independently() {
        let frame = ChannelFrame {
            x: ChannelValues::Numeric(vec![2.0, 9.0, 1.0, 8.0]),
            y: Some(vec![20.0, 90.0, 10.0, 80.0]),
            groups: vec![
                GroupSpec {
                    label: Some("A".to_string()),
                    color: DEFAULT_POINT_COLOR,
                    marker: Marker::Circle,
                    rows: vec![0, 2],
                },
                GroupSpec {
                    label: Some("B".to_string()),
                    color: DEFAULT_POINT_COLOR,
                    marker: Marker::Square,
                    rows: vec![1, 3],
                },
            ],
            sizes: None,
            alphas: None,
        };
        let out = LineKind.synthesize(&frame).unwrap();
        assert_eq!(out.series[0].x, vec![1.0, 2.0]);
        assert_eq!(out.series[1].x, vec![8.0, 9.0]);
        assert_eq!(out.series[1].y, vec![80.0, 90.0]);
    }

    #[test]
    fn test_categorical_x_rejected() {
        let frame = ChannelFrame {
            x: ChannelValues::Categorical(vec![Some("a".to_string())]),
            y: Some(vec![1.0]),
            groups: single_group(1),
            sizes: None,
            alphas: None,
        };
        assert!(LineKind.synthesize(&frame).is_err());
    }
}
