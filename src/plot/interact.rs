//! Viewport math behind the interactive plot view.
//!
//! A [`Viewport`] tracks the visible data window of a rendered plot. The
//! renderer maps pixels to data coordinates and calls into here for zooming
//! around the cursor, panning by drag deltas, refitting to the data, and
//! resolving the point under the cursor for tooltips.

use crate::plot::types::{Axis, AxisKind, PlotSpec};

/// Margin added around the data when fitting, as a fraction of the span.
const FIT_PADDING: f64 = 0.05;

/// The visible data window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Fit the viewport to a plot's visible data, with a margin.
    ///
    /// Falls back to the unit window when nothing is visible.
    pub fn fit(spec: &PlotSpec) -> Self {
        match spec.data_bounds() {
            Some((x0, x1, y0, y1)) => {
                let x_pad = pad_for_span(x1 - x0);
                let y_pad = pad_for_span(y1 - y0);
                Self {
                    x_min: x0 - x_pad,
                    x_max: x1 + x_pad,
                    y_min: y0 - y_pad,
                    y_max: y1 + y_pad,
                }
            }
            None => Self::default(),
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Scale the window by `factor` keeping `anchor` fixed.
    ///
    /// Factors below one zoom in. Non-finite or non-positive factors are
    /// ignored.
    pub fn zoom(&mut self, factor: f64, anchor: (f64, f64)) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let (ax, ay) = anchor;
        self.x_min = ax + (self.x_min - ax) * factor;
        self.x_max = ax + (self.x_max - ax) * factor;
        self.y_min = ay + (self.y_min - ay) * factor;
        self.y_max = ay + (self.y_max - ay) * factor;
    }

    /// Scale the window by `factor` around its center.
    pub fn zoom_centered(&mut self, factor: f64) {
        let center = self.center();
        self.zoom(factor, center);
    }

    /// Shift the window by data-unit deltas.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x_min += dx;
        self.x_max += dx;
        self.y_min += dy;
        self.y_max += dy;
    }

    /// Refit the window to the plot's visible data.
    pub fn reset(&mut self, spec: &PlotSpec) {
        *self = Self::fit(spec);
    }

    /// Nearest visible point within `radius` of `(x, y)`.
    ///
    /// Distances are measured after normalizing each axis by the current
    /// window span, so the radius is a fraction of the view rather than a
    /// data distance.
    pub fn hit_test(&self, spec: &PlotSpec, x: f64, y: f64, radius: f64) -> Option<HitPoint> {
        let width = self.width();
        let height = self.height();
        if width <= 0.0 || height <= 0.0 {
            return None;
        }

        let mut best: Option<(f64, HitPoint)> = None;
        for (series_index, series) in spec.series.iter().enumerate() {
            if !series.visible {
                continue;
            }
            for (point_index, (&px, &py)) in series.x.iter().zip(&series.y).enumerate() {
                if !px.is_finite() || !py.is_finite() {
                    continue;
                }
                let dx = (px - x) / width;
                let dy = (py - y) / height;
                let distance = (dx * dx + dy * dy).sqrt();
                let closer = match &best {
                    Some((current, _)) => distance < *current,
                    None => true,
                };
                if distance <= radius && closer {
                    best = Some((
                        distance,
                        HitPoint {
                            series: series_index,
                            point: point_index,
                            x: px,
                            y: py,
                            label: series.label.clone(),
                        },
                    ));
                }
            }
        }
        best.map(|(_, hit)| hit)
    }
}

fn pad_for_span(span: f64) -> f64 {
    if span > 0.0 {
        span * FIT_PADDING
    } else {
        // Degenerate span, open up a visible window
        0.5
    }
}

/// A point resolved by [`Viewport::hit_test`].
#[derive(Debug, Clone, PartialEq)]
pub struct HitPoint {
    /// Index of the series within the plot
    pub series: usize,
    /// Index of the point within the series
    pub point: usize,
    pub x: f64,
    pub y: f64,
    pub label: Option<String>,
}

impl HitPoint {
    /// Multi-line tooltip text for this point.
    ///
    /// Categorical positions resolve to their tick labels and temporal
    /// values format as dates.
    pub fn tooltip_text(&self, spec: &PlotSpec) -> String {
        let mut lines = Vec::new();
        if let Some(label) = &self.label {
            lines.push(label.clone());
        }
        lines.push(format!(
            "{}: {}",
            spec.x_axis.label,
            format_axis_value(&spec.x_axis, self.x)
        ));
        lines.push(format!(
            "{}: {}",
            spec.y_axis.label,
            format_axis_value(&spec.y_axis, self.y)
        ));
        lines.join("\n")
    }
}

fn format_axis_value(axis: &Axis, value: f64) -> String {
    if let Some(ticks) = &axis.ticks {
        if let Some((_, label)) = ticks.iter().find(|(pos, _)| (pos - value).abs() < 1e-9) {
            return label.clone();
        }
    }
    match axis.kind {
        AxisKind::Temporal => {
            let seconds = value as i64;
            match chrono::DateTime::<chrono::Utc>::from_timestamp(seconds, 0) {
                Some(dt) if seconds % 86_400 == 0 => dt.format("%Y-%m-%d").to_string(),
                Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => value.to_string(),
            }
        }
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{AxisScale, CoordSystem};
    use crate::plot::kind::KindType;
    use crate::plot::types::{Marker, Rgba, Series, SeriesGeometry};

    fn spec_with(series: Vec<Series>) -> PlotSpec {
        PlotSpec {
            id: "p".to_string(),
            kind: KindType::Scatter,
            title: "t".to_string(),
            x_axis: Axis::new("x", AxisKind::Numeric, AxisScale::Linear),
            y_axis: Axis::new("y", AxisKind::Numeric, AxisScale::Linear),
            coords: CoordSystem::Cartesian,
            series,
            legend: vec![],
        }
    }

    fn points_series(label: Option<&str>, x: Vec<f64>, y: Vec<f64>) -> Series {
        Series {
            label: label.map(|s| s.to_string()),
            x,
            y,
            geometry: SeriesGeometry::Points {
                marker: Marker::Circle,
                size: 10.0,
                sizes: None,
            },
            color: Rgba::opaque(0, 0, 0),
            alphas: None,
            visible: true,
        }
    }

    #[test]
    fn test_fit_pads_by_five_percent() {
        let spec = spec_with(vec![points_series(
            None,
            vec![0.0, 10.0],
            vec![0.0, 100.0],
        )]);
        let vp = Viewport::fit(&spec);
        assert_eq!(vp, Viewport::new(-0.5, 10.5, -5.0, 105.0));
    }

    #[test]
    fn test_fit_single_point_opens_window() {
        let spec = spec_with(vec![points_series(None, vec![3.0], vec![7.0])]);
        let vp = Viewport::fit(&spec);
        assert_eq!(vp, Viewport::new(2.5, 3.5, 6.5, 7.5));
    }

    #[test]
    fn test_fit_empty_falls_back_to_unit() {
        let spec = spec_with(vec![]);
        assert_eq!(Viewport::fit(&spec), Viewport::default());
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut vp = Viewport::new(0.0, 10.0, 0.0, 10.0);
        vp.zoom(0.5, (10.0, 0.0));
        assert_eq!(vp, Viewport::new(5.0, 10.0, 0.0, 5.0));
    }

    #[test]
    fn test_zoom_centered_halves_span() {
        let mut vp = Viewport::new(0.0, 10.0, 0.0, 20.0);
        vp.zoom_centered(0.5);
        assert_eq!(vp, Viewport::new(2.5, 7.5, 5.0, 15.0));
    }

    #[test]
    fn test_zoom_rejects_bad_factors() {
        let mut vp = Viewport::new(0.0, 10.0, 0.0, 10.0);
        let before = vp;
        vp.zoom(0.0, (5.0, 5.0));
        vp.zoom(-1.0, (5.0, 5.0));
        vp.zoom(f64::NAN, (5.0, 5.0));
        assert_eq!(vp, before);
    }

    #[test]
    fn test_pan_shifts_window() {
        let mut vp = Viewport::new(0.0, 10.0, 0.0, 10.0);
        vp.pan(2.0, -3.0);
        assert_eq!(vp, Viewport::new(2.0, 12.0, -3.0, 7.0));
    }

    #[test]
    fn test_reset_refits() {
        let spec = spec_with(vec![points_series(
            None,
            vec![0.0, 10.0],
            vec![0.0, 10.0],
        )]);
        let mut vp = Viewport::new(100.0, 200.0, 100.0, 200.0);
        vp.reset(&spec);
        assert_eq!(vp, Viewport::fit(&spec));
    }

    #[test]
    fn test_hit_test_finds_nearest_visible() {
        let mut hidden = points_series(Some("hidden"), vec![5.0], vec![50.0]);
        hidden.visible = false;
        let spec = spec_with(vec![
            points_series(Some("a"), vec![0.0, 5.0], vec![0.0, 50.0]),
            hidden,
        ]);
        let vp = Viewport::new(0.0, 10.0, 0.0, 100.0);

        let hit = vp.hit_test(&spec, 5.2, 52.0, 0.1).unwrap();
        assert_eq!(hit.series, 0);
        assert_eq!(hit.point, 1);
        assert_eq!(hit.x, 5.0);
        assert_eq!(hit.label.as_deref(), Some("a"));

        assert!(vp.hit_test(&spec, 9.9, 99.0, 0.05).is_none());
    }

    #[test]
    fn test_hit_test_skips_nan_points() {
        let spec = spec_with(vec![points_series(
            None,
            vec![f64::NAN, 5.0],
            vec![1.0, 50.0],
        )]);
        let vp = Viewport::new(0.0, 10.0, 0.0, 100.0);
        let hit = vp.hit_test(&spec, 5.0, 50.0, 0.5).unwrap();
        assert_eq!(hit.point, 1);
    }

    #[test]
    fn test_tooltip_text_numeric() {
        let spec = spec_with(vec![points_series(Some("A"), vec![1.5], vec![2.0])]);
        let hit = HitPoint {
            series: 0,
            point: 0,
            x: 1.5,
            y: 2.0,
            label: Some("A".to_string()),
        };
        assert_eq!(hit.tooltip_text(&spec), "A\nx: 1.5\ny: 2");
    }

    #[test]
    fn test_tooltip_text_resolves_ticks_and_dates() {
        let mut spec = spec_with(vec![]);
        spec.x_axis.kind = AxisKind::Categorical;
        spec.x_axis.ticks = Some(vec![(0.0, "north".to_string()), (1.0, "south".to_string())]);
        spec.y_axis.kind = AxisKind::Temporal;

        let hit = HitPoint {
            series: 0,
            point: 0,
            x: 1.0,
            // 2023-01-02 at midnight
            y: 19_359.0 * 86_400.0,
            label: None,
        };
        let text = hit.tooltip_text(&spec);
        assert!(text.contains("x: south"));
        assert!(text.contains("y: 2023-01-02"));
    }
}
