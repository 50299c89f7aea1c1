/*!
# Bosques - Forest Measurement Data Plotting

Unifies heterogeneous forest measurement workbooks into one table and
synthesizes renderer-independent plots from grammar-of-graphics mappings.

Field campaigns deliver one workbook per site with sheets for
temperatures, dendrometers, litterfall, and insect captures, each in its
own layout with its own spelling of the join keys. This crate cleans
those sheets, joins them on date and station, and turns channel mappings
(`x = Fecha`, `y = Temperatura media`, `color = Estación`) into concrete
plot specifications.

## Example

```rust,ignore
use bosques::grammar::{Channel, GrammarState};
use bosques::reader::{CsvDirReader, Reader};
use bosques::variables::VariableRegistry;
use bosques::writer::{JsonWriter, Writer};

let registry = VariableRegistry::from_path("variables.yaml".as_ref())?;
let workbook = CsvDirReader::new("data/campo").read()?;
let unified = workbook.unify(&workbook.sheet_names(), &registry)?;

let mut state = GrammarState::new();
state.set(Channel::X, "Fecha");
state.set(Channel::Y, "Temperatura media");
state.set(Channel::Color, "Estación");

let spec = bosques::plot::synthesize(&unified.table, &state)?;
let json = JsonWriter::pretty().write(&spec)?;
```

## Architecture

The pipeline runs in stages, each in its own module:

- [`variables`] - Registry describing every known variable
- [`reader`] - Data source abstraction loading raw sheets
- [`dataset`] - Cleaning, per-sheet transforms, and unification
- [`grammar`] - The channel-to-variable mapping state
- [`plot`] - Plot synthesis, palettes, and viewport interaction
- [`task`] - Plot queue with YAML persistence and text reports
- [`writer`] - Output format abstraction (JSON)
*/

pub mod dataset;
pub mod grammar;
pub mod logging;
pub mod naming;
pub mod plot;
pub mod reader;
pub mod task;
pub mod variables;
pub mod writer;

// Re-export key types for convenience
pub use dataset::{UnifiedDataset, Workbook};
pub use grammar::{Channel, GrammarState};
pub use plot::{PlotSpec, Viewport};
pub use task::TaskQueue;
pub use variables::VariableRegistry;

// DataFrame abstraction (wraps Polars)
pub use polars::prelude::DataFrame;

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum BosquesError {
    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Grammar error: {0}")]
    Grammar(String),

    #[error("Plot error: {0}")]
    Plot(String),

    #[error("Task error: {0}")]
    Task(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, BosquesError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
