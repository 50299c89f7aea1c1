//! Fixed styling tables for series.
//!
//! Grouped series cycle through a seven-color palette and a seven-marker
//! cycle; both wrap around when a grouping produces more levels than the
//! table holds.

use crate::plot::types::{Marker, Rgba};

/// Alpha applied to every series color.
pub const SERIES_ALPHA: u8 = 150;

/// Color used when no grouping is active.
pub const DEFAULT_POINT_COLOR: Rgba = Rgba::new(0, 114, 189, SERIES_ALPHA);

/// Colors assigned to grouped series, in order.
pub const SERIES_PALETTE: [Rgba; 7] = [
    Rgba::new(0, 114, 189, SERIES_ALPHA),
    Rgba::new(217, 83, 25, SERIES_ALPHA),
    Rgba::new(237, 177, 32, SERIES_ALPHA),
    Rgba::new(126, 47, 142, SERIES_ALPHA),
    Rgba::new(119, 172, 48, SERIES_ALPHA),
    Rgba::new(77, 190, 238, SERIES_ALPHA),
    Rgba::new(162, 20, 47, SERIES_ALPHA),
];

/// Markers assigned to shape-grouped series, in order.
pub const MARKER_CYCLE: [Marker; 7] = [
    Marker::Circle,
    Marker::Square,
    Marker::Triangle,
    Marker::Diamond,
    Marker::Plus,
    Marker::Cross,
    Marker::Star,
];

/// Color for the `index`-th group.
///
/// # Example
/// ```
/// use bosques::plot::palette;
/// assert_eq!(palette::series_color(0), palette::series_color(7));
/// ```
pub fn series_color(index: usize) -> Rgba {
    SERIES_PALETTE[index % SERIES_PALETTE.len()]
}

/// Marker for the `index`-th shape group.
pub fn series_marker(index: usize) -> Marker {
    MARKER_CYCLE[index % MARKER_CYCLE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        assert_eq!(series_color(1), Rgba::new(217, 83, 25, 150));
        assert_eq!(series_color(8), series_color(1));
        assert_eq!(series_marker(2), Marker::Triangle);
        assert_eq!(series_marker(9), Marker::Triangle);
    }

    #[test]
    fn test_default_color_is_first_palette_entry() {
        assert_eq!(DEFAULT_POINT_COLOR, SERIES_PALETTE[0]);
    }

    #[test]
    fn test_palette_entries_distinct() {
        for (i, a) in SERIES_PALETTE.iter().enumerate() {
            for b in SERIES_PALETTE.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
