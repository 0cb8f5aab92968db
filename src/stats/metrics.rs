//! Metric Derivation Engine
//! Pure derivations over the normalized tables, restricted by a [`Scope`].
//!
//! Nothing is cached: every call recomputes from the tables, so identical
//! inputs always give identical output (all intermediate maps are ordered).

use super::calculator::{GroupStats, StatsCalculator};
use super::weights::SpendingWeights;
use crate::config::{DashboardConfig, Period};
use crate::data::{Category, CategoryClass, IncomeMeasure, NormalizedTables};
use crate::filter::{PeriodSelection, Scope};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeriveError {
    #[error("No {baseline_year} baseline value for '{category}'")]
    MissingBaseline { category: Category, baseline_year: i32 },
}

/// What a derived value measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetricKind {
    PctChangeSinceBaseline,
    YoyPctChange,
    PeriodAvgPctChange,
    WeightedBurden,
    /// Annual mean of month-on-same-month-last-year changes.
    MonthlyYoyAverage,
    IncomeGrowth,
    CpiGrowth,
    RealIncomeChange,
    SpendingShare,
}

/// Time key of a derived value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum PeriodOrYear {
    Year(i32),
    Period(Period),
}

/// One computed value handed to the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetric {
    /// Category short name, region or demographic group.
    pub category: String,
    pub period_or_year: PeriodOrYear,
    pub metric_kind: MetricKind,
    pub value: f64,
}

impl DerivedMetric {
    fn new(category: impl Into<String>, key: PeriodOrYear, kind: MetricKind, value: f64) -> Self {
        Self {
            category: category.into(),
            period_or_year: key,
            metric_kind: kind,
            value,
        }
    }
}

/// Change-since-baseline results across a selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BaselineReport {
    pub metrics: Vec<DerivedMetric>,
    /// Selected categories without a baseline value ("insufficient data").
    pub insufficient: Vec<Category>,
}

/// Computes every dashboard metric from read-only tables and configuration.
pub struct MetricEngine<'a> {
    tables: &'a NormalizedTables,
    config: &'a DashboardConfig,
}

fn pct_change(from: f64, to: f64) -> Option<f64> {
    (from != 0.0).then(|| (to - from) / from * 100.0)
}

impl<'a> MetricEngine<'a> {
    pub fn new(tables: &'a NormalizedTables, config: &'a DashboardConfig) -> Self {
        Self { tables, config }
    }

    /// Annual index series for a category, restricted to the scope.
    fn scoped_series(&self, category: Category, scope: &Scope) -> BTreeMap<i32, f64> {
        if !scope.includes(category) {
            return BTreeMap::new();
        }
        self.tables
            .annual_prices
            .annual_series(category)
            .into_iter()
            .filter(|(year, _)| scope.years.contains(*year))
            .collect()
    }

    /// `(v[y] - v[baseline]) / v[baseline] * 100` for every year in scope.
    ///
    /// A category outside the scope yields an empty list; a selected category
    /// with no usable baseline reading is [`DeriveError::MissingBaseline`].
    pub fn pct_change_since_baseline(
        &self,
        category: Category,
        scope: &Scope,
    ) -> Result<Vec<DerivedMetric>, DeriveError> {
        if !scope.includes(category) {
            return Ok(Vec::new());
        }

        let baseline_year = self.config.baseline_year;
        let series = self.scoped_series(category, scope);
        let base = series
            .get(&baseline_year)
            .copied()
            .filter(|v| *v != 0.0)
            .ok_or(DeriveError::MissingBaseline {
                category,
                baseline_year,
            })?;

        Ok(series
            .iter()
            .filter_map(|(&year, &value)| {
                let change = pct_change(base, value)?;
                Some(DerivedMetric::new(
                    category.short_name(),
                    PeriodOrYear::Year(year),
                    MetricKind::PctChangeSinceBaseline,
                    change,
                ))
            })
            .collect())
    }

    /// Change between consecutive years; years without a predecessor are left out.
    pub fn yoy_pct_change(&self, category: Category, scope: &Scope) -> Vec<DerivedMetric> {
        let series = self.scoped_series(category, scope);
        series
            .iter()
            .filter_map(|(&year, &value)| {
                let prev = series.get(&(year - 1))?;
                let change = pct_change(*prev, value)?;
                Some(DerivedMetric::new(
                    category.short_name(),
                    PeriodOrYear::Year(year),
                    MetricKind::YoyPctChange,
                    change,
                ))
            })
            .collect()
    }

    /// Mean YoY change within each selected period; periods with no YoY value are omitted.
    pub fn period_average(
        &self,
        category: Category,
        scope: &Scope,
        selection: PeriodSelection,
    ) -> Vec<DerivedMetric> {
        let yoy = self.yoy_pct_change(category, scope);

        selection
            .periods()
            .into_iter()
            .filter_map(|period| {
                let span = self.config.periods.span(period);
                let values: Vec<f64> = yoy
                    .iter()
                    .filter_map(|m| match m.period_or_year {
                        PeriodOrYear::Year(y) if span.contains(y) => Some(m.value),
                        _ => None,
                    })
                    .collect();
                let avg = StatsCalculator::mean(&values)?;
                Some(DerivedMetric::new(
                    category.short_name(),
                    PeriodOrYear::Period(period),
                    MetricKind::PeriodAvgPctChange,
                    avg,
                ))
            })
            .collect()
    }

    /// `Σ weight[group][c] * price_change[c]` over the selected categories.
    ///
    /// Empty when the group is unknown, when no weighted category is selected,
    /// or when a selected, weighted category has no price change.
    pub fn weighted_burden(
        &self,
        group: &str,
        weights: &SpendingWeights,
        price_changes: &BTreeMap<Category, f64>,
        scope: &Scope,
    ) -> Vec<DerivedMetric> {
        let Some(group_weights) = weights.group(group) else {
            return Vec::new();
        };

        let mut burden = 0.0;
        let mut used = 0usize;
        for (&category, &weight) in group_weights {
            if weight == 0.0 || !scope.includes(category) {
                continue;
            }
            let Some(change) = price_changes.get(&category) else {
                return Vec::new();
            };
            burden += weight * change;
            used += 1;
        }

        if used == 0 {
            return Vec::new();
        }

        vec![DerivedMetric::new(
            group,
            PeriodOrYear::Year(scope.years.end),
            MetricKind::WeightedBurden,
            burden,
        )]
    }

    // ----------------------------------------------------------------------
    // Selection-wide derivations
    // ----------------------------------------------------------------------

    /// Change since baseline for every selected category, missing baselines reported.
    pub fn pct_change_all(&self, scope: &Scope) -> BaselineReport {
        let mut report = BaselineReport::default();
        for &category in &scope.categories {
            match self.pct_change_since_baseline(category, scope) {
                Ok(metrics) => report.metrics.extend(metrics),
                Err(err) => {
                    warn!(%err, "category excluded: insufficient data");
                    report.insufficient.push(category);
                }
            }
        }
        report
    }

    pub fn yoy_all(&self, scope: &Scope) -> Vec<DerivedMetric> {
        scope
            .categories
            .iter()
            .flat_map(|&c| self.yoy_pct_change(c, scope))
            .collect()
    }

    pub fn period_average_all(&self, scope: &Scope, selection: PeriodSelection) -> Vec<DerivedMetric> {
        scope
            .categories
            .iter()
            .flat_map(|&c| self.period_average(c, scope, selection))
            .collect()
    }

    /// Change since baseline at the end of the year range, per category.
    pub fn price_changes_at_end(&self, scope: &Scope) -> BTreeMap<Category, f64> {
        let end = PeriodOrYear::Year(scope.years.end);
        scope
            .categories
            .iter()
            .filter_map(|&category| {
                let metrics = self.pct_change_since_baseline(category, scope).ok()?;
                let at_end = metrics.iter().find(|m| m.period_or_year == end)?;
                Some((category, at_end.value))
            })
            .collect()
    }

    /// Change from the first to the last year of the range, per selected category.
    ///
    /// Categories missing either endpoint, or with a zero start reading, are left out.
    pub fn range_changes(&self, scope: &Scope) -> BTreeMap<Category, f64> {
        let (start, end) = (scope.years.start, scope.years.end);
        scope
            .categories
            .iter()
            .filter_map(|&category| {
                let series = self.scoped_series(category, scope);
                let change = pct_change(*series.get(&start)?, *series.get(&end)?)?;
                Some((category, change))
            })
            .collect()
    }

    /// Burden of every weight group against the price changes at the range end.
    pub fn burden_all(&self, scope: &Scope, weights: &SpendingWeights) -> Vec<DerivedMetric> {
        let changes = self.price_changes_at_end(scope);
        weights
            .group_names()
            .iter()
            .flat_map(|group| self.weighted_burden(group, weights, &changes, scope))
            .collect()
    }

    /// Month vs same month a year earlier, averaged per (category, year).
    pub fn monthly_yoy_averages(&self, scope: &Scope) -> Vec<DerivedMetric> {
        let mut out = Vec::new();

        for &category in &scope.categories {
            let readings: BTreeMap<(i32, u32), f64> = self
                .tables
                .monthly_prices
                .category_rows(category)
                .filter(|r| scope.years.contains(r.year))
                .filter_map(|r| Some(((r.year, r.month?), r.index_value)))
                .collect();

            let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
            for (&(year, month), &value) in &readings {
                let Some(&prev) = readings.get(&(year - 1, month)) else {
                    continue;
                };
                if let Some(change) = pct_change(prev, value) {
                    by_year.entry(year).or_default().push(change);
                }
            }

            for (year, changes) in by_year {
                if let Some(avg) = StatsCalculator::mean(&changes) {
                    out.push(DerivedMetric::new(
                        category.short_name(),
                        PeriodOrYear::Year(year),
                        MetricKind::MonthlyYoyAverage,
                        avg,
                    ));
                }
            }
        }

        out
    }

    /// Per-region compensation growth over the range, national CPI growth, and their gap.
    ///
    /// Regions missing either endpoint are left out; without CPI endpoints
    /// only the income growth figures are returned.
    pub fn income_vs_cpi(&self, scope: &Scope) -> Vec<DerivedMetric> {
        let (start, end) = (scope.years.start, scope.years.end);
        let key = PeriodOrYear::Year(end);

        let cpi = self.tables.annual_prices.annual_series(Category::AllItems);
        let cpi_growth = match (cpi.get(&start), cpi.get(&end)) {
            (Some(&from), Some(&to)) if from > 0.0 => pct_change(from, to),
            _ => None,
        };

        let mut out = Vec::new();
        for region in self.tables.regions(IncomeMeasure::Compensation) {
            let series = self.tables.income_series(&region, IncomeMeasure::Compensation);
            let income_growth = match (series.get(&start), series.get(&end)) {
                (Some(&from), Some(&to)) if from > 0.0 => pct_change(from, to),
                _ => None,
            };
            let Some(income_growth) = income_growth else {
                continue;
            };

            out.push(DerivedMetric::new(&region, key, MetricKind::IncomeGrowth, income_growth));
            if let Some(cpi_growth) = cpi_growth {
                out.push(DerivedMetric::new(&region, key, MetricKind::CpiGrowth, cpi_growth));
                out.push(DerivedMetric::new(
                    &region,
                    key,
                    MetricKind::RealIncomeChange,
                    income_growth - cpi_growth,
                ));
            }
        }
        out
    }

    /// Each selected division's share of that year's selected spending, in percent.
    pub fn spending_shares(&self, scope: &Scope) -> Vec<DerivedMetric> {
        let rows: Vec<_> = self
            .tables
            .consumption
            .iter()
            .filter(|r| r.category.is_division() && scope.admits(r.category, r.year))
            .collect();

        let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
        for row in &rows {
            *totals.entry(row.year).or_insert(0.0) += row.value;
        }

        let mut shares: BTreeMap<(i32, Category), f64> = BTreeMap::new();
        for row in &rows {
            let total = totals[&row.year];
            if total > 0.0 {
                *shares.entry((row.year, row.category)).or_insert(0.0) += row.value / total * 100.0;
            }
        }

        shares
            .into_iter()
            .map(|((year, category), share)| {
                DerivedMetric::new(
                    category.short_name(),
                    PeriodOrYear::Year(year),
                    MetricKind::SpendingShare,
                    share,
                )
            })
            .collect()
    }

    /// Start-to-end price changes of the selected divisions, grouped by essential/non-essential.
    pub fn class_summary(&self, scope: &Scope) -> Vec<(CategoryClass, GroupStats)> {
        let changes = self.range_changes(scope);

        [CategoryClass::Essential, CategoryClass::NonEssential]
            .into_iter()
            .filter_map(|class| {
                let values: Vec<f64> = changes
                    .iter()
                    .filter(|(c, _)| c.is_division() && c.class() == class)
                    .map(|(_, v)| *v)
                    .collect();
                if values.is_empty() {
                    return None;
                }
                Some((class, StatsCalculator::compute_descriptive_stats(class.label(), &values)))
            })
            .collect()
    }
}
