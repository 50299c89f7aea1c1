//! Value types describing a synthesized plot.
//!
//! A [`PlotSpec`] is the renderer-independent output of plot synthesis: axes,
//! one or more [`Series`], and legend entries. Everything here serializes to
//! plain JSON/YAML so a front end can draw it without touching the dataset.

use crate::grammar::{AxisScale, CoordSystem};
use crate::plot::kind::KindType;
use crate::{BosquesError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// Colors and markers
// =============================================================================

/// An RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Hex form: `#rrggbb` when fully opaque, `#rrggbbaa` otherwise.
    ///
    /// # Example
    /// ```
    /// use bosques::plot::Rgba;
    /// assert_eq!(Rgba::opaque(0, 114, 189).hex(), "#0072bd");
    /// assert_eq!(Rgba::new(0, 114, 189, 150).hex(), "#0072bd96");
    /// ```
    pub fn hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Parse a `#rrggbb` or `#rrggbbaa` hex string.
    ///
    /// # Errors
    ///
    /// Returns a plot error when the string is not 6 or 8 hex digits after
    /// the optional leading `#`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let invalid = || BosquesError::Plot(format!("invalid hex color '{}'", s));
        let digits = s.strip_prefix('#').unwrap_or(s);
        if !digits.is_ascii() {
            return Err(invalid());
        }
        let byte = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };
        match digits.len() {
            6 => Ok(Self::opaque(byte(0..2)?, byte(2..4)?, byte(4..6)?)),
            8 => Ok(Self::new(byte(0..2)?, byte(2..4)?, byte(4..6)?, byte(6..8)?)),
            _ => Err(invalid()),
        }
    }
}

impl Serialize for Rgba {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Rgba::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Point marker shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    Circle,
    Square,
    Triangle,
    Diamond,
    Plus,
    Cross,
    Star,
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Marker::Circle => "circle",
            Marker::Square => "square",
            Marker::Triangle => "triangle",
            Marker::Diamond => "diamond",
            Marker::Plus => "plus",
            Marker::Cross => "cross",
            Marker::Star => "star",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Axes
// =============================================================================

/// How a dimension of the data maps onto an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    /// Plain numeric values
    Numeric,
    /// Seconds since the Unix epoch
    Temporal,
    /// Integer positions with tick labels
    Categorical,
}

/// One plot axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub label: String,
    pub kind: AxisKind,
    #[serde(default)]
    pub scale: AxisScale,
    /// Explicit tick positions and labels, for categorical axes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks: Option<Vec<(f64, String)>>,
}

impl Axis {
    pub fn new(label: impl Into<String>, kind: AxisKind, scale: AxisScale) -> Self {
        Self {
            label: label.into(),
            kind,
            scale,
            ticks: None,
        }
    }
}

// =============================================================================
// Series
// =============================================================================

/// Geometry of a single series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SeriesGeometry {
    /// Scatter points
    Points {
        marker: Marker,
        /// Base marker size in pixels
        size: f64,
        /// Per-point sizes when the size channel is mapped
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sizes: Option<Vec<f64>>,
    },
    /// Connected line with point markers
    Line {
        width: f64,
        marker: Marker,
        marker_size: f64,
    },
    /// Vertical bars centered on each x position
    Bars { width: f64 },
}

fn default_true() -> bool {
    true
}

/// One drawable series: paired x/y values plus styling.
///
/// `x` and `y` always have the same length. Missing values are carried as
/// `NaN` so indices keep lining up with the source rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Group label, present when the series came from a color/shape grouping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub geometry: SeriesGeometry,
    pub color: Rgba,
    /// Per-point alpha overrides when the alpha channel is mapped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alphas: Option<Vec<u8>>,
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl Series {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

// =============================================================================
// Plot
// =============================================================================

/// One legend row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgba,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(default = "default_true")]
    pub visible: bool,
}

/// A fully synthesized plot, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    /// Unique id for referencing the plot from tasks and reports
    pub id: String,
    pub kind: KindType,
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    #[serde(default)]
    pub coords: CoordSystem,
    pub series: Vec<Series>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legend: Vec<LegendEntry>,
}

impl PlotSpec {
    /// Series currently toggled visible.
    pub fn visible_series(&self) -> impl Iterator<Item = &Series> {
        self.series.iter().filter(|s| s.visible)
    }

    /// Flip the visibility of a legend entry and its series.
    ///
    /// Returns the new visibility, or `None` when no entry matches.
    pub fn toggle_legend_entry(&mut self, label: &str) -> Option<bool> {
        let visible = !self.legend.iter().find(|e| e.label == label)?.visible;
        self.set_series_visible(label, visible);
        Some(visible)
    }

    /// Set the visibility of a legend entry and every series it labels.
    ///
    /// Returns `false` when no entry matches.
    pub fn set_series_visible(&mut self, label: &str, visible: bool) -> bool {
        let Some(entry) = self.legend.iter_mut().find(|e| e.label == label) else {
            return false;
        };
        entry.visible = visible;
        for series in self
            .series
            .iter_mut()
            .filter(|s| s.label.as_deref() == Some(label))
        {
            series.visible = visible;
        }
        tracing::debug!(label, visible, "set series visibility");
        true
    }

    /// Bounding box of all finite points in visible series, as
    /// `(x_min, x_max, y_min, y_max)`.
    ///
    /// Bar series extend the box to their full bar width and to the zero
    /// baseline. Returns `None` when nothing is visible.
    pub fn data_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for series in self.visible_series() {
            let (half_width, baseline) = match series.geometry {
                SeriesGeometry::Bars { width } => (width / 2.0, true),
                _ => (0.0, false),
            };
            for (&x, &y) in series.x.iter().zip(series.y.iter()) {
                if !x.is_finite() || !y.is_finite() {
                    continue;
                }
                let (x_lo, x_hi) = (x - half_width, x + half_width);
                let (y_lo, y_hi) = if baseline {
                    (y.min(0.0), y.max(0.0))
                } else {
                    (y, y)
                };
                bounds = Some(match bounds {
                    None => (x_lo, x_hi, y_lo, y_hi),
                    Some((x0, x1, y0, y1)) => {
                        (x0.min(x_lo), x1.max(x_hi), y0.min(y_lo), y1.max(y_hi))
                    }
                });
            }
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(size: f64) -> SeriesGeometry {
        SeriesGeometry::Points {
            marker: Marker::Circle,
            size,
            sizes: None,
        }
    }

    fn series(label: Option<&str>, x: Vec<f64>, y: Vec<f64>) -> Series {
        Series {
            label: label.map(|s| s.to_string()),
            x,
            y,
            geometry: points(10.0),
            color: Rgba::opaque(0, 0, 0),
            alphas: None,
            visible: true,
        }
    }

    fn spec(series: Vec<Series>, legend: Vec<LegendEntry>) -> PlotSpec {
        PlotSpec {
            id: "p1".to_string(),
            kind: KindType::Scatter,
            title: "t".to_string(),
            x_axis: Axis::new("x", AxisKind::Numeric, AxisScale::Linear),
            y_axis: Axis::new("y", AxisKind::Numeric, AxisScale::Linear),
            coords: CoordSystem::Cartesian,
            series,
            legend,
        }
    }

    #[test]
    fn test_hex_round_trip() {
        let c = Rgba::new(217, 83, 25, 150);
        assert_eq!(c.hex(), "#d9531996");
        assert_eq!(Rgba::from_hex("#d9531996").unwrap(), c);
        assert_eq!(Rgba::from_hex("d95319").unwrap(), Rgba::opaque(217, 83, 25));
    }

    #[test]
    fn test_hex_invalid() {
        assert!(Rgba::from_hex("#12345").is_err());
        assert!(Rgba::from_hex("#gghhii").is_err());
        assert!(Rgba::from_hex("").is_err());
        assert!(Rgba::from_hex("#ááááéé").is_err());
    }

    #[test]
    fn test_rgba_serde_as_hex_string() {
        let c = Rgba::new(0, 114, 189, 150);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"#0072bd96\"");
        let back: Rgba = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_toggle_legend_entry() {
        let legend = vec![
            LegendEntry {
                label: "A".to_string(),
                color: Rgba::opaque(0, 0, 0),
                marker: Some(Marker::Circle),
                visible: true,
            },
            LegendEntry {
                label: "B".to_string(),
                color: Rgba::opaque(0, 0, 0),
                marker: Some(Marker::Circle),
                visible: true,
            },
        ];
        let mut spec = spec(
            vec![
                series(Some("A"), vec![1.0], vec![2.0]),
                series(Some("B"), vec![3.0], vec![4.0]),
            ],
            legend,
        );

        assert_eq!(spec.toggle_legend_entry("A"), Some(false));
        assert!(!spec.series[0].visible);
        assert!(spec.series[1].visible);
        assert!(!spec.legend[0].visible);
        assert_eq!(spec.visible_series().count(), 1);

        assert_eq!(spec.toggle_legend_entry("A"), Some(true));
        assert!(spec.series[0].visible);
        assert_eq!(spec.toggle_legend_entry("missing"), None);
    }

    #[test]
    fn test_set_series_visible() {
        let legend = vec![LegendEntry {
            label: "A".to_string(),
            color: Rgba::opaque(0, 0, 0),
            marker: None,
            visible: true,
        }];
        let mut spec = spec(vec![series(Some("A"), vec![1.0], vec![2.0])], legend);

        assert!(spec.set_series_visible("A", false));
        assert!(!spec.series[0].visible);
        assert!(!spec.legend[0].visible);
        // Idempotent
        assert!(spec.set_series_visible("A", false));
        assert!(!spec.series[0].visible);
        assert!(!spec.set_series_visible("missing", true));
    }

    #[test]
    fn test_data_bounds_skips_nan_and_hidden() {
        let mut hidden = series(Some("hidden"), vec![100.0], vec![100.0]);
        hidden.visible = false;
        let mut spec = spec(
            vec![
                series(None, vec![1.0, 2.0, f64::NAN], vec![10.0, f64::NAN, 30.0]),
                hidden,
            ],
            vec![],
        );

        assert_eq!(spec.data_bounds(), Some((1.0, 1.0, 10.0, 10.0)));
        spec.series[1].visible = true;
        assert_eq!(spec.data_bounds(), Some((1.0, 100.0, 10.0, 100.0)));
    }

    #[test]
    fn test_data_bounds_empty() {
        let spec = spec(vec![series(None, vec![f64::NAN], vec![1.0])], vec![]);
        assert_eq!(spec.data_bounds(), None);
    }

    #[test]
    fn test_data_bounds_bars_include_baseline_and_width() {
        let mut bars = series(None, vec![0.0, 1.0], vec![5.0, 8.0]);
        bars.geometry = SeriesGeometry::Bars { width: 0.6 };
        let spec = spec(vec![bars], vec![]);

        let (x0, x1, y0, y1) = spec.data_bounds().unwrap();
        assert!((x0 - (-0.3)).abs() < 1e-9);
        assert!((x1 - 1.3).abs() < 1e-9);
        assert_eq!(y0, 0.0);
        assert_eq!(y1, 8.0);
    }

    #[test]
    fn test_series_geometry_serde_tag() {
        let geom = SeriesGeometry::Bars { width: 0.6 };
        let json = serde_json::to_string(&geom).unwrap();
        assert_eq!(json, r#"{"type":"bars","width":0.6}"#);
        let back: SeriesGeometry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, geom);
    }
}
