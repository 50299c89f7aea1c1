//! Plot synthesis: from grammar state to renderer-independent plots.
//!
//! # Architecture
//!
//! The module is organized into submodules:
//!
//! - `types` - Value types: PlotSpec, Series, Axis, colors and markers
//! - `kind` - Plot kinds (scatter, line, bar, histogram) and their synthesis
//! - `palette` - Fixed color and marker tables for grouped series
//! - `synthesize` - The pipeline resolving channels against a dataset
//! - `interact` - Viewport math for zoom, pan and point hit testing

pub mod interact;
pub mod kind;
pub mod palette;
pub mod synthesize;
pub mod types;

pub use interact::{HitPoint, Viewport};
pub use kind::{Kind, KindType};
pub use synthesize::synthesize;
pub use types::*;
