//! Dashboard Configuration
//! Baseline year, period table, data file names, label overrides and spending weights.
//!
//! Everything has a compiled-in default; a TOML file may override any part of it:
//!
//! ```toml
//! baseline_year = 2015
//! weight_tolerance = 0.001
//!
//! [periods]
//! pre_covid = [2015, 2019]
//! covid = [2020, 2021]
//! inflation_surge = [2022, 2023]
//!
//! [labels]
//! "Energy products" = "skip"
//!
//! [weights."Renters"]
//! "Housing & Utilities" = 0.4
//! "Food & Beverages" = 0.6
//! ```

use crate::data::{Category, LabelMap, LabelTarget};
use crate::stats::{SpendingWeights, WeightsError, DEFAULT_WEIGHT_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reference year for "change since" metrics (HICP base 2015 = 100).
pub const DEFAULT_BASELINE_YEAR: i32 = 2015;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Weights(#[from] WeightsError),
    #[error("Unknown category '{label}' in {context}")]
    UnknownCategory { context: String, label: String },
    #[error("Period {period} has start {start} after end {end}")]
    InvalidPeriod {
        period: Period,
        start: i32,
        end: i32,
    },
}

/// Named analysis periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Period {
    PreCovid,
    Covid,
    InflationSurge,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::PreCovid, Period::Covid, Period::InflationSurge];

    pub fn label(self) -> &'static str {
        match self {
            Period::PreCovid => "Pre-COVID",
            Period::Covid => "COVID",
            Period::InflationSurge => "Inflation Surge",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct YearSpan {
    pub start: i32,
    pub end: i32,
}

impl YearSpan {
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}

impl From<[i32; 2]> for YearSpan {
    fn from([start, end]: [i32; 2]) -> Self {
        Self { start, end }
    }
}

impl From<YearSpan> for [i32; 2] {
    fn from(span: YearSpan) -> Self {
        [span.start, span.end]
    }
}

/// Year ranges of the named periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodTable {
    pub pre_covid: YearSpan,
    pub covid: YearSpan,
    pub inflation_surge: YearSpan,
}

impl Default for PeriodTable {
    fn default() -> Self {
        Self {
            pre_covid: YearSpan::new(2015, 2019),
            covid: YearSpan::new(2020, 2021),
            inflation_surge: YearSpan::new(2022, 2023),
        }
    }
}

impl PeriodTable {
    pub fn span(&self, period: Period) -> YearSpan {
        match period {
            Period::PreCovid => self.pre_covid,
            Period::Covid => self.covid,
            Period::InflationSurge => self.inflation_surge,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for period in Period::ALL {
            let span = self.span(period);
            if span.start > span.end {
                return Err(ConfigError::InvalidPeriod {
                    period,
                    start: span.start,
                    end: span.end,
                });
            }
        }
        Ok(())
    }
}

/// File names of the four CSO exports inside the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub annual_cpi: String,
    pub monthly_cpi: String,
    pub household_income: String,
    pub consumption: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            annual_cpi: "Annual EU Index of Consumer Prices.csv".to_string(),
            monthly_cpi: "Monthly EU Consumer Prices by Consumer Price .csv".to_string(),
            household_income: "Annual estimates of household income.csv".to_string(),
            consumption: "Annual consumption of persional income by item.csv".to_string(),
        }
    }
}

/// Raw TOML layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    baseline_year: Option<i32>,
    weight_tolerance: Option<f64>,
    periods: PeriodTable,
    files: SourceFiles,
    labels: BTreeMap<String, String>,
    weights: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Validated, immutable configuration shared by the loader and the engine.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub baseline_year: i32,
    pub weight_tolerance: f64,
    pub periods: PeriodTable,
    pub files: SourceFiles,
    pub labels: LabelMap,
    pub weights: SpendingWeights,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            baseline_year: DEFAULT_BASELINE_YEAR,
            weight_tolerance: DEFAULT_WEIGHT_TOLERANCE,
            periods: PeriodTable::default(),
            files: SourceFiles::default(),
            labels: LabelMap::canonical(),
            weights: SpendingWeights::default(),
        }
    }
}

impl DashboardConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: ConfigFile = toml::from_str(content)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: ConfigFile) -> Result<Self, ConfigError> {
        raw.periods.validate()?;

        let mut labels = LabelMap::canonical();
        for (label, target) in &raw.labels {
            let target = labels
                .parse_target(target)
                .ok_or_else(|| ConfigError::UnknownCategory {
                    context: format!("label override for '{label}'"),
                    label: target.clone(),
                })?;
            labels.insert(label, target);
        }

        let weight_tolerance = raw.weight_tolerance.unwrap_or(DEFAULT_WEIGHT_TOLERANCE);
        let mut groups: BTreeMap<String, BTreeMap<Category, f64>> = BTreeMap::new();
        for (group, entries) in raw.weights {
            let mut weights = BTreeMap::new();
            for (name, weight) in entries {
                let category = match labels.lookup(&name) {
                    Some(LabelTarget::Category(cat)) => cat,
                    _ => {
                        return Err(ConfigError::UnknownCategory {
                            context: format!("weights for group '{group}'"),
                            label: name,
                        })
                    }
                };
                *weights.entry(category).or_insert(0.0) += weight;
            }
            groups.insert(group, weights);
        }
        let weights = SpendingWeights::new(groups, weight_tolerance)?;

        Ok(Self {
            baseline_year: raw.baseline_year.unwrap_or(DEFAULT_BASELINE_YEAR),
            weight_tolerance,
            periods: raw.periods,
            files: raw.files,
            labels,
            weights,
        })
    }
}
