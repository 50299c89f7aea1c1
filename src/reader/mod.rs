//! Data source abstraction layer.
//!
//! Readers load raw field data into a [`Workbook`] for unification. The
//! only built-in source is a directory of CSV files, one file per sheet,
//! but the [`Reader`] trait keeps the loading side pluggable.
//!
//! # Example
//!
//! ```rust,ignore
//! use bosques::reader::{CsvDirReader, Reader};
//!
//! let workbook = CsvDirReader::new("data/campo").read()?;
//! for name in workbook.sheet_names() {
//!     println!("{name}");
//! }
//! ```

use std::path::{Path, PathBuf};

use polars::prelude::*;

use crate::dataset::Workbook;
use crate::{BosquesError, Result};

/// Trait for data sources that produce a [`Workbook`].
pub trait Reader {
    /// Load every sheet from the source.
    ///
    /// # Errors
    ///
    /// Returns `BosquesError::Dataset` if the source does not exist or a
    /// sheet cannot be parsed.
    fn read(&self) -> Result<Workbook>;
}

/// Reads a directory of CSV files as one workbook.
///
/// Each `*.csv` file becomes a sheet named after the file stem, so
/// `ESFP_dendrometros.csv` loads as the sheet `ESFP_dendrometros`.
/// Sheets are ordered by file name for stable results.
#[derive(Debug, Clone)]
pub struct CsvDirReader {
    dir: PathBuf,
}

impl CsvDirReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_sheet(path: &Path) -> Result<DataFrame> {
        LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_has_header(true)
            .with_try_parse_dates(true)
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| BosquesError::Dataset(format!("cannot read {}: {e}", path.display())))
    }
}

impl Reader for CsvDirReader {
    fn read(&self) -> Result<Workbook> {
        if !self.dir.is_dir() {
            return Err(BosquesError::Dataset(format!(
                "data directory {} does not exist",
                self.dir.display()
            )));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)
            .map_err(|e| {
                BosquesError::Dataset(format!("cannot list {}: {e}", self.dir.display()))
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        paths.sort();

        let name = self
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.dir.display().to_string());
        let mut workbook = Workbook::new(name);

        for path in &paths {
            let sheet = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let df = Self::read_sheet(path)?;
            tracing::debug!(sheet = %sheet, rows = df.height(), cols = df.width(), "loaded sheet");
            workbook.add_sheet(sheet, df);
        }

        if workbook.is_empty() {
            tracing::warn!(dir = %self.dir.display(), "no csv files found");
        }
        tracing::info!(
            dir = %self.dir.display(),
            sheets = workbook.len(),
            "loaded workbook"
        );
        Ok(workbook)
    }
}
