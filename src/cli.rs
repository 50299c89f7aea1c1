/*!
Bosques command line interface.

Provides commands for checking the variable registry, unifying workbook
sheets, and rendering saved analyses to JSON plots and text reports.
*/

use clap::{Parser, Subcommand};
use polars::prelude::{CsvWriter, SerWriter};
use std::path::PathBuf;

use bosques::reader::{CsvDirReader, Reader};
use bosques::task::TaskQueue;
use bosques::variables::VariableRegistry;
use bosques::writer::{JsonWriter, Writer};
use bosques::{logging, plot, VERSION};

#[derive(Parser)]
#[command(name = "bosques")]
#[command(about = "Forest measurement data unification and plot synthesis")]
#[command(version = VERSION)]
pub struct Cli {
    /// Directory for rolling log files (stderr only when omitted)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a variable registry file and list its variables
    Validate {
        /// Path to variables.yaml
        registry: PathBuf,
    },

    /// Unify workbook sheets into one table
    Unify {
        /// Directory of CSV sheets
        data: PathBuf,

        /// Path to variables.yaml
        #[arg(long)]
        registry: PathBuf,

        /// Sheets to include, comma separated (all by default)
        #[arg(long, value_delimiter = ',')]
        sheets: Vec<String>,

        /// Write the unified table as CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Render every plot in a saved analysis to JSON
    Render {
        /// Path to the analysis YAML
        analysis: PathBuf,

        /// Directory of CSV sheets
        #[arg(long)]
        data: PathBuf,

        /// Path to variables.yaml
        #[arg(long)]
        registry: PathBuf,

        /// Sheets to include, comma separated (all by default)
        #[arg(long, value_delimiter = ',')]
        sheets: Vec<String>,

        /// Directory for the JSON files
        #[arg(long, default_value = "plots")]
        output: PathBuf,

        /// Also write the plot list report into the output directory
        #[arg(long)]
        report: bool,
    },

    /// Write the plot list report for a saved analysis
    Report {
        /// Path to the analysis YAML
        analysis: PathBuf,

        /// Directory for the report file
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = match &cli.log_dir {
        Some(dir) => Some(logging::init_with_file(dir)?),
        None => {
            logging::init();
            None
        }
    };

    match cli.command {
        Commands::Validate { registry } => {
            let registry = VariableRegistry::from_path(&registry)?;
            println!("Registry OK: {} variables", registry.len());
            for (origin, variables) in registry.by_origin() {
                println!("\n{origin}:");
                for var in variables {
                    match &var.unit {
                        Some(unit) => println!("  - {} ({}, {})", var.name, var.var_type, unit),
                        None => println!("  - {} ({})", var.name, var.var_type),
                    }
                }
            }
        }

        Commands::Unify {
            data,
            registry,
            sheets,
            output,
        } => {
            let registry = VariableRegistry::from_path(&registry)?;
            let workbook = CsvDirReader::new(&data).read()?;
            let selected = select_sheets(&sheets, workbook.sheet_names());
            let mut unified = workbook.unify(&selected, &registry)?;

            println!("{}", unified.report);
            println!(
                "\nUnified table: {} rows x {} columns",
                unified.table.height(),
                unified.table.width()
            );
            if let Some(path) = output {
                let mut file = std::fs::File::create(&path)?;
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .finish(&mut unified.table)?;
                println!("Wrote {}", path.display());
            }
        }

        Commands::Render {
            analysis,
            data,
            registry,
            sheets,
            output,
            report,
        } => {
            let registry = VariableRegistry::from_path(&registry)?;
            let workbook = CsvDirReader::new(&data).read()?;
            let selected = select_sheets(&sheets, workbook.sheet_names());
            let unified = workbook.unify(&selected, &registry)?;

            let mut queue = TaskQueue::new();
            queue.load_analysis(&analysis)?;

            std::fs::create_dir_all(&output)?;
            let writer = JsonWriter::pretty();

            // One bad task should not stop the rest of the queue
            let mut failed = 0usize;
            for (index, task) in queue.iter().enumerate() {
                let result = plot::synthesize(&unified.table, &task.grammar_state)
                    .and_then(|spec| writer.write(&spec));
                match result {
                    Ok(json) => {
                        let path =
                            output.join(format!("{:02}_{}.json", index + 1, file_slug(&task.name)));
                        std::fs::write(&path, json)?;
                        println!("Wrote {}", path.display());
                    }
                    Err(err) => {
                        failed += 1;
                        tracing::error!(task = %task.name, error = %err, "failed to render plot");
                        eprintln!("Failed '{}': {}", task.name, err);
                    }
                }
            }

            if report {
                let path = queue.write_report(&output)?;
                println!("Wrote {}", path.display());
            }
            println!("\nRendered {} of {} plots", queue.len() - failed, queue.len());
            if failed > 0 {
                anyhow::bail!("{failed} plots failed to render");
            }
        }

        Commands::Report { analysis, output } => {
            let mut queue = TaskQueue::new();
            queue.load_analysis(&analysis)?;
            let path = queue.write_report(&output)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

/// Use the whole workbook when no sheets were named.
fn select_sheets<'a>(requested: &'a [String], available: Vec<&'a str>) -> Vec<&'a str> {
    if requested.is_empty() {
        available
    } else {
        requested.iter().map(|s| s.as_str()).collect()
    }
}

/// Turn a task name into a safe file name fragment.
fn file_slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let slug = slug.trim_matches('_').to_string();
    if slug.is_empty() {
        "plot".to_string()
    } else {
        slug
    }
}
