//! Data Processor Module
//! Maps source-specific CSV columns onto tidy tables (column mapping, label
//! normalization, time-grain parsing).

use super::category::Category;
use super::labels::{LabelMap, LabelResolution};
use super::tables::{ConsumptionObservation, IncomeMeasure, IncomeObservation, PriceObservation};
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Source '{source_name}' has no column for {role} (tried {aliases:?})")]
    MissingColumn {
        source_name: String,
        role: &'static str,
        aliases: Vec<String>,
    },
    #[error("Unknown category label '{label}' in source '{source_name}'")]
    UnknownCategory { label: String, source_name: String },
}

/// Time grain of a source's period column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeGrain {
    /// `2015`
    Annual,
    /// `2015 January`, `2015M01` or `2015-01`
    Monthly,
}

/// How to find one column: header aliases, then a positional fallback.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub role: &'static str,
    pub aliases: Vec<String>,
    pub position: Option<usize>,
}

impl ColumnSpec {
    fn new(role: &'static str, aliases: &[&str], position: usize) -> Self {
        Self {
            role,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            position: Some(position),
        }
    }
}

/// Column layout and row selection for one CSO export.
#[derive(Debug, Clone)]
pub struct SourceSchema {
    pub name: String,
    pub grain: TimeGrain,
    pub statistic: ColumnSpec,
    pub period: ColumnSpec,
    pub label: ColumnSpec,
    pub value: ColumnSpec,
    /// Keep only rows whose statistic equals this (case-insensitive).
    pub statistic_filter: Option<String>,
}

impl SourceSchema {
    fn cso(name: &str, grain: TimeGrain, period_aliases: &[&str], label_aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            grain,
            statistic: ColumnSpec::new("statistic", &["Statistic Label", "Statistic", "STATISTIC"], 0),
            period: ColumnSpec::new("period", period_aliases, 1),
            label: ColumnSpec::new("label", label_aliases, 2),
            value: ColumnSpec::new("value", &["VALUE", "Value"], 4),
            statistic_filter: None,
        }
    }

    /// Annual HICP by COICOP division.
    pub fn annual_cpi() -> Self {
        let mut schema = Self::cso(
            "annual_cpi",
            TimeGrain::Annual,
            &["Year", "TLIST(A1)"],
            &["Consumer Price Index Category", "Commodity Group", "Category", "C02363V03422"],
        );
        schema.statistic_filter = Some("Harmonised Index of Consumer Prices".to_string());
        schema
    }

    /// Monthly HICP by COICOP division.
    pub fn monthly_cpi() -> Self {
        let mut schema = Self::cso(
            "monthly_cpi",
            TimeGrain::Monthly,
            &["Month", "TLIST(M1)"],
            &["Consumer Price Index Category", "Commodity Group", "Category", "C02363V03422"],
        );
        schema.statistic_filter = Some("EU HICP".to_string());
        schema
    }

    /// Household income by NUTS 2 region.
    pub fn household_income() -> Self {
        Self::cso(
            "household_income",
            TimeGrain::Annual,
            &["Year", "TLIST(A1)"],
            &["NUTS 2 Region", "Region", "NUTS2 Region", "Regions"],
        )
    }

    /// Personal consumption by COICOP item.
    pub fn consumption() -> Self {
        Self::cso(
            "consumption",
            TimeGrain::Annual,
            &["Year", "TLIST(A1)"],
            &["Item", "Items", "Consumption Item"],
        )
    }
}

/// One source row with the mapped columns pulled out as text/number.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub statistic: Option<String>,
    pub period: Option<String>,
    pub label: Option<String>,
    pub value: Option<f64>,
}

/// Handles column mapping and normalization of the CSO exports.
pub struct DataProcessor;

impl DataProcessor {
    /// Find the column filling a role: alias match first, then position.
    pub fn resolve_column(
        df: &DataFrame,
        source_name: &str,
        spec: &ColumnSpec,
    ) -> Result<String, ProcessorError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let wanted = |alias: &str| alias.trim().to_lowercase();
        for alias in &spec.aliases {
            if let Some(name) = names
                .iter()
                .find(|n| n.trim().to_lowercase() == wanted(alias))
            {
                return Ok(name.clone());
            }
        }

        if let Some(name) = spec.position.and_then(|pos| names.get(pos)) {
            debug!(source = source_name, role = spec.role, column = %name, "column resolved by position");
            return Ok(name.clone());
        }

        Err(ProcessorError::MissingColumn {
            source_name: source_name.to_string(),
            role: spec.role,
            aliases: spec.aliases.clone(),
        })
    }

    /// Pull the mapped columns out of a DataFrame as plain rows.
    pub fn extract_rows(df: &DataFrame, schema: &SourceSchema) -> Result<Vec<RawRow>, ProcessorError> {
        let statistic_col = Self::resolve_column(df, &schema.name, &schema.statistic).ok();
        let period_col = Self::resolve_column(df, &schema.name, &schema.period)?;
        let label_col = Self::resolve_column(df, &schema.name, &schema.label)?;
        let value_col = Self::resolve_column(df, &schema.name, &schema.value)?;

        let statistics = match &statistic_col {
            Some(name) => Some(Self::text_column(df, name)?),
            None => None,
        };
        let periods = Self::text_column(df, &period_col)?;
        let labels = Self::text_column(df, &label_col)?;

        let value_f64 = df.column(&value_col)?.cast(&DataType::Float64)?;
        let value_ca = value_f64.f64()?;

        let rows = (0..df.height())
            .map(|i| RawRow {
                statistic: statistics.as_ref().and_then(|s| s[i].clone()),
                period: periods[i].clone(),
                label: labels[i].clone(),
                value: value_ca.get(i).filter(|v| v.is_finite()),
            })
            .collect();

        Ok(rows)
    }

    fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, ProcessorError> {
        let column = df.column(name)?.cast(&DataType::String)?;
        let ca = column.as_materialized_series().str()?;
        Ok(ca
            .into_iter()
            .map(|v| {
                v.map(|s| s.trim().trim_matches('"').trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .collect())
    }

    fn keep_statistic(row: &RawRow, filter: Option<&str>) -> bool {
        match (filter, row.statistic.as_deref()) {
            (None, _) => true,
            (Some(wanted), Some(stat)) => stat.trim().eq_ignore_ascii_case(wanted.trim()),
            // Exports without a statistic column carry a single statistic
            (Some(_), None) => true,
        }
    }

    /// Resolve a row's label; `Ok(None)` for rows that are deliberately left out.
    fn map_label(
        label: &str,
        labels: &LabelMap,
        source_name: &str,
    ) -> Result<Option<Category>, ProcessorError> {
        match labels.resolve(label) {
            LabelResolution::Mapped(cat) => Ok(Some(cat)),
            LabelResolution::Skipped | LabelResolution::SubDivision => {
                debug!(source = source_name, label, "skipping non-division label");
                Ok(None)
            }
            LabelResolution::Unknown => Err(ProcessorError::UnknownCategory {
                label: label.to_string(),
                source_name: source_name.to_string(),
            }),
        }
    }

    /// HICP rows → price observations.
    ///
    /// Fails on the first label that the mapping table does not know.
    pub fn normalize_prices(
        rows: &[RawRow],
        schema: &SourceSchema,
        labels: &LabelMap,
    ) -> Result<Vec<PriceObservation>, ProcessorError> {
        let mut out = Vec::new();

        for row in rows
            .iter()
            .filter(|r| Self::keep_statistic(r, schema.statistic_filter.as_deref()))
        {
            let Some(label) = row.label.as_deref() else {
                continue;
            };
            let Some(category) = Self::map_label(label, labels, &schema.name)? else {
                continue;
            };

            let period = row.period.as_deref().and_then(|p| match schema.grain {
                TimeGrain::Annual => parse_year(p).map(|y| (y, None)),
                TimeGrain::Monthly => parse_month_period(p).map(|(y, m)| (y, Some(m))),
            });

            if let (Some((year, month)), Some(index_value)) = (period, row.value) {
                out.push(PriceObservation {
                    category,
                    year,
                    month,
                    index_value,
                });
            }
        }

        Ok(out)
    }

    /// Income rows → income observations for the two tracked measures.
    pub fn normalize_income(rows: &[RawRow]) -> Vec<IncomeObservation> {
        rows.iter()
            .filter_map(|row| {
                let measure = income_measure(row.statistic.as_deref()?)?;
                let region = row.label.clone()?;
                let year = parse_year(row.period.as_deref()?)?;
                let value = row.value?;
                Some(IncomeObservation {
                    region,
                    measure,
                    year,
                    value,
                })
            })
            .collect()
    }

    /// Consumption rows → consumption observations keyed by division.
    pub fn normalize_consumption(
        rows: &[RawRow],
        schema: &SourceSchema,
        labels: &LabelMap,
    ) -> Result<Vec<ConsumptionObservation>, ProcessorError> {
        let mut out = Vec::new();

        for row in rows
            .iter()
            .filter(|r| Self::keep_statistic(r, schema.statistic_filter.as_deref()))
        {
            let Some(label) = row.label.as_deref() else {
                continue;
            };
            let Some(category) = Self::map_label(label, labels, &schema.name)? else {
                continue;
            };
            let year = row.period.as_deref().and_then(parse_year);

            if let (Some(year), Some(value)) = (year, row.value) {
                out.push(ConsumptionObservation {
                    category,
                    year,
                    value,
                });
            }
        }

        Ok(out)
    }
}

fn income_measure(statistic: &str) -> Option<IncomeMeasure> {
    let stat = statistic.to_lowercase();
    if stat.contains("compensation of employees") {
        Some(IncomeMeasure::Compensation)
    } else if stat.contains("disposable income per person") {
        Some(IncomeMeasure::DisposableIndex)
    } else {
        None
    }
}

/// `2015`, or `2015.0` when the column was read as floating point.
pub fn parse_year(text: &str) -> Option<i32> {
    let text = text.trim();
    if let Ok(year) = text.parse::<i32>() {
        return Some(year);
    }
    let value = text.parse::<f64>().ok()?;
    (value.fract() == 0.0 && value.abs() < 10_000.0).then_some(value as i32)
}

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// `2015 January`, `2015M01` or `2015-01` → (2015, 1).
pub fn parse_month_period(text: &str) -> Option<(i32, u32)> {
    let text = text.trim();

    if let Some((year, month)) = text.split_once(' ') {
        let year = year.trim().parse::<i32>().ok()?;
        let month = month.trim().to_lowercase();
        let index = MONTH_NAMES
            .iter()
            .position(|name| *name == month || (month.len() >= 3 && name.starts_with(&month)))?;
        return Some((year, index as u32 + 1));
    }

    let (year, month) = text
        .split_once('M')
        .or_else(|| text.split_once('-'))?;
    let year = year.parse::<i32>().ok()?;
    let month = month.parse::<u32>().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}
