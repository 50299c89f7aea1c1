//! Plot kinds and their synthesis rules.
//!
//! Each kind of plot (scatter, line, bar, histogram) knows which channels it
//! requires, which it can use, and how to turn resolved channel data into
//! drawable series. Kinds are addressed through the [`Kind`] wrapper, which
//! hides the concrete implementation behind a trait object; new kinds only
//! need a [`KindTrait`] impl and a factory constructor.

mod bar;
mod histogram;
mod line;
mod scatter;
mod types;

pub use bar::BarKind;
pub use histogram::HistogramKind;
pub use line::LineKind;
pub use scatter::ScatterKind;
pub use types::{ChannelFrame, ChannelValues, GroupSpec, KindOutput};

use crate::grammar::Channel;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Kind type enum
// =============================================================================

/// The supported plot kinds.
///
/// Deserialization accepts the Spanish labels used by older saved analyses
/// alongside the canonical lowercase names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindType {
    #[default]
    #[serde(alias = "Dispersión", alias = "Dispersion")]
    Scatter,
    #[serde(alias = "Líneas", alias = "Lineas")]
    Line,
    #[serde(alias = "Barras")]
    Bar,
    #[serde(alias = "Histograma")]
    Histogram,
}

impl KindType {
    /// All kinds, in display order.
    pub fn all() -> &'static [KindType] {
        &[
            KindType::Scatter,
            KindType::Line,
            KindType::Bar,
            KindType::Histogram,
        ]
    }

    /// Channels that must be mapped before this kind can be synthesized.
    pub fn required_channels(&self) -> &'static [Channel] {
        match self {
            KindType::Scatter | KindType::Line | KindType::Bar => {
                &[Channel::X, Channel::Y]
            }
            KindType::Histogram => &[Channel::X],
        }
    }
}

impl fmt::Display for KindType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KindType::Scatter => "scatter",
            KindType::Line => "line",
            KindType::Bar => "bar",
            KindType::Histogram => "histogram",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Kind trait
// =============================================================================

/// Behavior each plot kind implements.
pub trait KindTrait: fmt::Debug + fmt::Display + Send + Sync {
    /// Which kind this is.
    fn kind_type(&self) -> KindType;

    /// Channels that must be mapped before synthesis.
    fn required_channels(&self) -> &'static [Channel] {
        self.kind_type().required_channels()
    }

    /// Whether a mapped channel contributes to this kind's output.
    ///
    /// Mappings to unused channels are ignored with a warning.
    fn uses_channel(&self, channel: Channel) -> bool {
        matches!(channel, Channel::X | Channel::Y)
    }

    /// Turn resolved channel data into drawable series.
    fn synthesize(&self, frame: &ChannelFrame) -> Result<KindOutput>;
}

// =============================================================================
// Kind wrapper
// =============================================================================

/// A plot kind, wrapped for dynamic dispatch.
#[derive(Clone)]
pub struct Kind(Arc<dyn KindTrait>);

impl Kind {
    pub fn scatter() -> Self {
        Self(Arc::new(ScatterKind))
    }

    pub fn line() -> Self {
        Self(Arc::new(LineKind))
    }

    pub fn bar() -> Self {
        Self(Arc::new(BarKind))
    }

    pub fn histogram() -> Self {
        Self(Arc::new(HistogramKind))
    }

    /// Construct the kind for a [`KindType`].
    pub fn from_type(kind_type: KindType) -> Self {
        match kind_type {
            KindType::Scatter => Self::scatter(),
            KindType::Line => Self::line(),
            KindType::Bar => Self::bar(),
            KindType::Histogram => Self::histogram(),
        }
    }

    pub fn kind_type(&self) -> KindType {
        self.0.kind_type()
    }

    pub fn required_channels(&self) -> &'static [Channel] {
        self.0.required_channels()
    }

    pub fn uses_channel(&self, channel: Channel) -> bool {
        self.0.uses_channel(channel)
    }

    pub fn synthesize(&self, frame: &ChannelFrame) -> Result<KindOutput> {
        self.0.synthesize(frame)
    }
}

impl Default for Kind {
    fn default() -> Self {
        Self::scatter()
    }
}

impl From<KindType> for Kind {
    fn from(kind_type: KindType) -> Self {
        Self::from_type(kind_type)
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({:?})", self.kind_type())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        self.kind_type() == other.kind_type()
    }
}

impl Eq for Kind {}

impl Serialize for Kind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.kind_type().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Kind {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        KindType::deserialize(deserializer).map(Kind::from_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_type_serde() {
        assert_eq!(
            serde_json::to_string(&KindType::Scatter).unwrap(),
            "\"scatter\""
        );
        let from_spanish: KindType = serde_json::from_str("\"Histograma\"").unwrap();
        assert_eq!(from_spanish, KindType::Histogram);
        let from_accented: KindType = serde_json::from_str("\"Líneas\"").unwrap();
        assert_eq!(from_accented, KindType::Line);
    }

    #[test]
    fn test_required_channels() {
        assert_eq!(
            KindType::Scatter.required_channels(),
            &[Channel::X, Channel::Y]
        );
        assert_eq!(KindType::Histogram.required_channels(), &[Channel::X]);
    }

    #[test]
    fn test_from_type_round_trip() {
        for &kind_type in KindType::all() {
            assert_eq!(Kind::from_type(kind_type).kind_type(), kind_type);
        }
    }

    #[test]
    fn test_kind_display_and_debug() {
        assert_eq!(Kind::bar().to_string(), "bar");
        assert_eq!(format!("{:?}", Kind::bar()), "Kind(Bar)");
    }

    #[test]
    fn test_kind_equality() {
        assert_eq!(Kind::line(), Kind::from_type(KindType::Line));
        assert_ne!(Kind::line(), Kind::scatter());
    }

    #[test]
    fn test_kind_serde_round_trip() {
        let json = serde_json::to_string(&Kind::histogram()).unwrap();
        assert_eq!(json, "\"histogram\"");
        let back: Kind = serde_json::from_str("\"Barras\"").unwrap();
        assert_eq!(back, Kind::bar());
    }

    #[test]
    fn test_default_uses_channel() {
        assert!(Kind::line().uses_channel(Channel::X));
        assert!(!Kind::line().uses_channel(Channel::FacetRow));
        assert!(!Kind::histogram().uses_channel(Channel::Y));
    }
}
