//! Normalized Tables Module
//! Tidy in-memory tables produced by the loader and read by the derivation engine.

use super::category::Category;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// One HICP index reading (base 2015 = 100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceObservation {
    pub category: Category,
    pub year: i32,
    /// 1-12 for monthly readings, `None` for annual ones.
    pub month: Option<u32>,
    pub index_value: f64,
}

/// Which household income statistic a row carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum IncomeMeasure {
    /// Compensation of employees, € million.
    Compensation,
    /// Disposable income per person, index State = 100.
    DisposableIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeObservation {
    pub region: String,
    pub measure: IncomeMeasure,
    pub year: i32,
    pub value: f64,
}

impl IncomeObservation {
    /// National totals are published alongside the NUTS 2 regions.
    pub fn is_national_total(&self) -> bool {
        let region = self.region.trim();
        region.eq_ignore_ascii_case("ireland") || region.eq_ignore_ascii_case("state")
    }
}

/// Household spending on one division, € million.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsumptionObservation {
    pub category: Category,
    pub year: i32,
    pub value: f64,
}

/// Price observations unique per (category, year, month), sorted by that key.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    rows: Vec<PriceObservation>,
}

impl PriceTable {
    /// Build a table, keeping the first reading for any repeated key.
    pub fn new(rows: Vec<PriceObservation>) -> Self {
        let mut unique: BTreeMap<(Category, i32, Option<u32>), PriceObservation> = BTreeMap::new();
        let mut duplicates = 0usize;

        for row in rows {
            let key = (row.category, row.year, row.month);
            if unique.contains_key(&key) {
                duplicates += 1;
                continue;
            }
            unique.insert(key, row);
        }

        if duplicates > 0 {
            warn!(duplicates, "dropped repeated price readings, first reading kept");
        }

        Self {
            rows: unique.into_values().collect(),
        }
    }

    pub fn rows(&self) -> &[PriceObservation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows for one category, in (year, month) order.
    pub fn category_rows(&self, category: Category) -> impl Iterator<Item = &PriceObservation> {
        self.rows.iter().filter(move |r| r.category == category)
    }

    /// Year → index for one category, annual readings only.
    pub fn annual_series(&self, category: Category) -> BTreeMap<i32, f64> {
        self.category_rows(category)
            .filter(|r| r.month.is_none())
            .map(|r| (r.year, r.index_value))
            .collect()
    }

    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        bounds(self.rows.iter().map(|r| r.year))
    }
}

/// The four normalized sources.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTables {
    pub annual_prices: PriceTable,
    pub monthly_prices: PriceTable,
    pub income: Vec<IncomeObservation>,
    pub consumption: Vec<ConsumptionObservation>,
}

impl NormalizedTables {
    /// Smallest and largest year across every table.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let years = self
            .annual_prices
            .rows()
            .iter()
            .map(|r| r.year)
            .chain(self.monthly_prices.rows().iter().map(|r| r.year))
            .chain(self.income.iter().map(|r| r.year))
            .chain(self.consumption.iter().map(|r| r.year));
        bounds(years)
    }

    /// Year → value for one region and measure.
    pub fn income_series(&self, region: &str, measure: IncomeMeasure) -> BTreeMap<i32, f64> {
        self.income
            .iter()
            .filter(|r| r.measure == measure && r.region == region)
            .map(|r| (r.year, r.value))
            .collect()
    }

    /// Regions carrying a measure, national total excluded, sorted.
    pub fn regions(&self, measure: IncomeMeasure) -> Vec<String> {
        let regions: BTreeSet<&str> = self
            .income
            .iter()
            .filter(|r| r.measure == measure && !r.is_national_total())
            .map(|r| r.region.as_str())
            .collect();
        regions.into_iter().map(str::to_string).collect()
    }
}

fn bounds(years: impl Iterator<Item = i32>) -> Option<(i32, i32)> {
    years.fold(None, |acc, y| match acc {
        None => Some((y, y)),
        Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(category: Category, year: i32, month: Option<u32>, index_value: f64) -> PriceObservation {
        PriceObservation {
            category,
            year,
            month,
            index_value,
        }
    }

    #[test]
    fn test_price_table_keeps_first_duplicate() {
        let table = PriceTable::new(vec![
            obs(Category::Food, 2016, None, 101.0),
            obs(Category::Food, 2015, None, 100.0),
            obs(Category::Food, 2016, None, 999.0),
        ]);

        assert_eq!(table.len(), 2);
        let series = table.annual_series(Category::Food);
        assert_eq!(series.get(&2016), Some(&101.0));
        assert_eq!(table.rows()[0].year, 2015);
    }

    #[test]
    fn test_annual_series_ignores_monthly_rows() {
        let table = PriceTable::new(vec![
            obs(Category::Health, 2015, Some(1), 99.0),
            obs(Category::Health, 2015, None, 100.0),
        ]);
        let series = table.annual_series(Category::Health);
        assert_eq!(series.len(), 1);
        assert_eq!(series[&2015], 100.0);
    }

    #[test]
    fn test_year_bounds_span_all_tables() {
        let tables = NormalizedTables {
            annual_prices: PriceTable::new(vec![obs(Category::Food, 2015, None, 100.0)]),
            monthly_prices: PriceTable::new(vec![obs(Category::Food, 2012, Some(3), 95.0)]),
            income: vec![IncomeObservation {
                region: "Southern".into(),
                measure: IncomeMeasure::Compensation,
                year: 2024,
                value: 1.0,
            }],
            consumption: Vec::new(),
        };
        assert_eq!(tables.year_bounds(), Some((2012, 2024)));
        assert_eq!(NormalizedTables::default().year_bounds(), None);
    }

    #[test]
    fn test_regions_exclude_national_total() {
        let row = |region: &str| IncomeObservation {
            region: region.into(),
            measure: IncomeMeasure::Compensation,
            year: 2020,
            value: 10.0,
        };
        let tables = NormalizedTables {
            income: vec![row("Southern"), row("Ireland"), row("Eastern and Midland")],
            ..Default::default()
        };
        assert_eq!(
            tables.regions(IncomeMeasure::Compensation),
            vec!["Eastern and Midland".to_string(), "Southern".to_string()]
        );
        assert!(tables.regions(IncomeMeasure::DisposableIndex).is_empty());
    }
}
