//! Output writer abstraction layer.
//!
//! Writers turn a synthesized [`PlotSpec`] into an external format. The
//! built-in [`JsonWriter`] emits the draw instructions as JSON for
//! downstream renderers; the [`Writer`] trait keeps the output side
//! pluggable.
//!
//! # Example
//!
//! ```rust,ignore
//! use bosques::writer::{JsonWriter, Writer};
//!
//! let spec = bosques::plot::synthesize(&table, &state)?;
//! let json = JsonWriter::pretty().write(&spec)?;
//! println!("{json}");
//! ```

use crate::plot::PlotSpec;
use crate::{BosquesError, Result};

/// Trait for plot output writers.
///
/// # Associated Types
///
/// * `Output` - What `write()` produces. `String` for text formats,
///   `Vec<u8>` for binary ones.
pub trait Writer {
    /// The output type produced by this writer.
    type Output;

    /// Generate output from a synthesized plot.
    ///
    /// # Errors
    ///
    /// Returns `BosquesError::Plot` if the plot cannot be rendered in
    /// this writer's format.
    fn write(&self, spec: &PlotSpec) -> Result<Self::Output>;

    /// Check whether this writer can render `spec` without producing
    /// output. Writers that refuse some plots override this.
    fn validate(&self, _spec: &PlotSpec) -> Result<()> {
        Ok(())
    }
}

/// Serializes plots as JSON.
///
/// Colors are written as hex strings and temporal values as seconds since
/// the epoch, matching the [`PlotSpec`] serde layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWriter {
    pretty: bool,
}

impl JsonWriter {
    /// Compact single-line output.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented output for humans.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Writer for JsonWriter {
    type Output = String;

    fn write(&self, spec: &PlotSpec) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(spec)
        } else {
            serde_json::to_string(spec)
        };
        json.map_err(|e| BosquesError::Plot(format!("cannot serialize plot: {e}")))
    }
}
