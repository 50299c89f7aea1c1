//! Grammar of graphics state: the mapping from visual channels to variables.
//!
//! A [`GrammarState`] holds what the user has composed so far: which variable
//! drives each channel (x, y, color, size, shape, alpha, facets), the plot
//! kind, axis scales, and the coordinate system. The state is deliberately
//! untyped with respect to the dataset; validation against actual columns
//! happens when a plot is synthesized.
//!
//! Saved analyses from older tooling carry Spanish labels for plot kinds,
//! scales, and coordinate systems. Those spellings are accepted when
//! deserializing; serialization always emits the canonical lowercase English
//! forms.

use crate::plot::kind::KindType;
use crate::variables::Statistic;
use crate::{BosquesError, Result};
use serde::{Deserialize, Serialize};

/// Visual channels a variable can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    X,
    Y,
    Color,
    Size,
    Shape,
    Alpha,
    FacetRow,
    FacetCol,
}

impl Channel {
    /// All channels, in display order.
    pub fn all() -> &'static [Channel] {
        &[
            Channel::X,
            Channel::Y,
            Channel::Color,
            Channel::Size,
            Channel::Shape,
            Channel::Alpha,
            Channel::FacetRow,
            Channel::FacetCol,
        ]
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Color => "color",
            Channel::Size => "size",
            Channel::Shape => "shape",
            Channel::Alpha => "alpha",
            Channel::FacetRow => "facet_row",
            Channel::FacetCol => "facet_col",
        };
        write!(f, "{}", s)
    }
}

/// Axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    #[default]
    #[serde(alias = "lineal")]
    Linear,
    Log,
}

impl std::fmt::Display for AxisScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxisScale::Linear => write!(f, "linear"),
            AxisScale::Log => write!(f, "log"),
        }
    }
}

/// Coordinate system for the plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordSystem {
    #[default]
    #[serde(alias = "cartesiano")]
    Cartesian,
    Polar,
    /// Axes swapped: x becomes vertical, y horizontal
    #[serde(alias = "invertido", alias = "flip")]
    Flipped,
}

impl std::fmt::Display for CoordSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordSystem::Cartesian => write!(f, "cartesian"),
            CoordSystem::Polar => write!(f, "polar"),
            CoordSystem::Flipped => write!(f, "flipped"),
        }
    }
}

/// The current grammar of graphics composition.
///
/// Channel fields hold variable display names from the registry. A fresh
/// state has no mappings and defaults to a scatter plot on linear cartesian
/// axes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GrammarState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_row: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_col: Option<String>,
    /// What kind of plot to draw
    #[serde(default)]
    pub plot_type: KindType,
    /// Aggregation statistic, reserved for stat-transformed kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<Statistic>,
    #[serde(default)]
    pub x_scale: AxisScale,
    #[serde(default)]
    pub y_scale: AxisScale,
    #[serde(default)]
    pub coords: CoordSystem,
}

impl GrammarState {
    /// Create a fresh state with no mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a variable to a channel, replacing any existing mapping.
    pub fn set(&mut self, channel: Channel, variable: impl Into<String>) {
        *self.slot_mut(channel) = Some(variable.into());
    }

    /// Clear a channel's mapping.
    pub fn clear(&mut self, channel: Channel) {
        *self.slot_mut(channel) = None;
    }

    /// Variable mapped to a channel, if any.
    pub fn get(&self, channel: Channel) -> Option<&str> {
        self.slot(channel).as_deref()
    }

    /// All mapped channels with their variables, in display order.
    pub fn mapped(&self) -> Vec<(Channel, &str)> {
        Channel::all()
            .iter()
            .filter_map(|&channel| self.get(channel).map(|variable| (channel, variable)))
            .collect()
    }

    /// Distinct variable names referenced by any channel.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (_, variable) in self.mapped() {
            if !names.contains(&variable) {
                names.push(variable);
            }
        }
        names
    }

    /// One-line description of the composition.
    ///
    /// # Example
    /// ```
    /// use bosques::grammar::{Channel, GrammarState};
    /// let mut state = GrammarState::new();
    /// assert_eq!(state.summary(), "No mapping");
    /// state.set(Channel::X, "Fecha");
    /// state.set(Channel::Color, "Estación");
    /// assert_eq!(state.summary(), "Plot: scatter; x: Fecha; color: Estación");
    /// ```
    pub fn summary(&self) -> String {
        let mapped = self.mapped();
        if mapped.is_empty() {
            return "No mapping".to_string();
        }
        let mut parts = vec![format!("Plot: {}", self.plot_type)];
        for (channel, variable) in mapped {
            parts.push(format!("{}: {}", channel, variable));
        }
        parts.join("; ")
    }

    /// Check that every channel the plot kind requires is mapped.
    ///
    /// # Errors
    ///
    /// Returns a grammar error naming the first missing channel.
    pub fn validate(&self) -> Result<()> {
        for &channel in self.plot_type.required_channels() {
            if self.get(channel).is_none() {
                return Err(BosquesError::Grammar(format!(
                    "{} plots require the {} channel to be mapped",
                    self.plot_type, channel
                )));
            }
        }
        Ok(())
    }

    fn slot(&self, channel: Channel) -> &Option<String> {
        match channel {
            Channel::X => &self.x,
            Channel::Y => &self.y,
            Channel::Color => &self.color,
            Channel::Size => &self.size,
            Channel::Shape => &self.shape,
            Channel::Alpha => &self.alpha,
            Channel::FacetRow => &self.facet_row,
            Channel::FacetCol => &self.facet_col,
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut Option<String> {
        match channel {
            Channel::X => &mut self.x,
            Channel::Y => &mut self.y,
            Channel::Color => &mut self.color,
            Channel::Size => &mut self.size,
            Channel::Shape => &mut self.shape,
            Channel::Alpha => &mut self.alpha,
            Channel::FacetRow => &mut self.facet_row,
            Channel::FacetCol => &mut self.facet_col,
        }
    }
}
