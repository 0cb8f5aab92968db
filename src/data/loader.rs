//! CSV Data Loader Module
//! Reads the four CSO exports with Polars and hands them to the processor.

use super::labels::LabelMap;
use super::processor::{DataProcessor, ProcessorError, RawRow, SourceSchema};
use super::tables::{NormalizedTables, PriceTable};
use crate::config::SourceFiles;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Data file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load CSV {path}: {source}")]
    CsvError { path: PathBuf, source: PolarsError },
    #[error(transparent)]
    Normalize(#[from] ProcessorError),
}

/// Schemas for the four sources.
#[derive(Debug, Clone)]
pub struct SourceSchemas {
    pub annual_cpi: SourceSchema,
    pub monthly_cpi: SourceSchema,
    pub household_income: SourceSchema,
    pub consumption: SourceSchema,
}

impl Default for SourceSchemas {
    fn default() -> Self {
        Self {
            annual_cpi: SourceSchema::annual_cpi(),
            monthly_cpi: SourceSchema::monthly_cpi(),
            household_income: SourceSchema::household_income(),
            consumption: SourceSchema::consumption(),
        }
    }
}

/// Loads the CSO datasets from a data directory into normalized tables.
pub struct DataLoader {
    data_dir: PathBuf,
    files: SourceFiles,
    schemas: SourceSchemas,
}

impl DataLoader {
    pub fn new(data_dir: impl Into<PathBuf>, files: SourceFiles) -> Self {
        Self {
            data_dir: data_dir.into(),
            files,
            schemas: SourceSchemas::default(),
        }
    }

    /// Load a CSV file using Polars.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        let csv_error = |source| LoaderError::CsvError {
            path: path.to_path_buf(),
            source,
        };

        LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(csv_error)
    }

    /// Load and normalize all four sources.
    ///
    /// Any unmapped category label aborts the whole load.
    pub fn load_all(&self, labels: &LabelMap) -> Result<NormalizedTables, LoaderError> {
        let annual_rows = self.read_rows(&self.files.annual_cpi, &self.schemas.annual_cpi)?;
        let annual =
            DataProcessor::normalize_prices(&annual_rows, &self.schemas.annual_cpi, labels)?;

        let monthly_rows = self.read_rows(&self.files.monthly_cpi, &self.schemas.monthly_cpi)?;
        let monthly =
            DataProcessor::normalize_prices(&monthly_rows, &self.schemas.monthly_cpi, labels)?;

        let income_rows =
            self.read_rows(&self.files.household_income, &self.schemas.household_income)?;
        let income = DataProcessor::normalize_income(&income_rows);

        let consumption_rows =
            self.read_rows(&self.files.consumption, &self.schemas.consumption)?;
        let consumption = DataProcessor::normalize_consumption(
            &consumption_rows,
            &self.schemas.consumption,
            labels,
        )?;

        let tables = NormalizedTables {
            annual_prices: PriceTable::new(annual),
            monthly_prices: PriceTable::new(monthly),
            income,
            consumption,
        };

        for (name, count) in [
            ("annual_cpi", tables.annual_prices.len()),
            ("monthly_cpi", tables.monthly_prices.len()),
            ("household_income", tables.income.len()),
            ("consumption", tables.consumption.len()),
        ] {
            if count == 0 {
                warn!(source = name, "source produced no rows after normalization");
            }
        }

        info!(
            annual = tables.annual_prices.len(),
            monthly = tables.monthly_prices.len(),
            income = tables.income.len(),
            consumption = tables.consumption.len(),
            "datasets loaded"
        );

        Ok(tables)
    }

    fn read_rows(
        &self,
        file_name: &str,
        schema: &SourceSchema,
    ) -> Result<Vec<RawRow>, LoaderError> {
        let path = self.data_dir.join(file_name);
        let df = Self::load_csv(&path)?;
        info!(source = %schema.name, path = %path.display(), rows = df.height(), "read csv");
        Ok(DataProcessor::extract_rows(&df, schema)?)
    }
}
