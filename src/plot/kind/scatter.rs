//! Scatter points.

use super::{ChannelFrame, KindOutput, KindTrait, KindType};
use crate::grammar::Channel;
use crate::plot::types::{Series, SeriesGeometry};
use crate::{BosquesError, Result};
use std::fmt;

/// Base marker size, in pixels.
const POINT_SIZE: f64 = 10.0;

/// One point per row, optionally grouped by color and shape.
#[derive(Debug, Clone, Copy)]
pub struct ScatterKind;

impl fmt::Display for ScatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind_type())
    }
}

impl KindTrait for ScatterKind {
    fn kind_type(&self) -> KindType {
        KindType::Scatter
    }

    fn uses_channel(&self, channel: Channel) -> bool {
        !matches!(channel, Channel::FacetRow | Channel::FacetCol)
    }

    fn synthesize(&self, frame: &ChannelFrame) -> Result<KindOutput> {
        let xs = frame.x.as_numeric().ok_or_else(|| {
            BosquesError::Plot(
                "scatter plots require numeric or temporal x values".to_string(),
            )
        })?;
        let ys = frame.y.as_deref().ok_or_else(|| {
            BosquesError::Plot("scatter plots require y values".to_string())
        })?;

        let mut series = Vec::with_capacity(frame.groups.len());
        for group in &frame.groups {
            series.push(Series {
                label: group.label.clone(),
                x: group.gather(xs),
                y: group.gather(ys),
                geometry: SeriesGeometry::Points {
                    marker: group.marker,
                    size: POINT_SIZE,
                    sizes: frame.sizes.as_deref().map(|s| group.gather(s)),
                },
                color: group.color,
                alphas: frame.alphas.as_deref().map(|a| group.gather(a)),
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
