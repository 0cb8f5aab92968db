//! Dashboard Snapshot
//! Series for the six linked charts plus the key-insights panel, ready for a
//! rendering layer. Rebuilt from scratch on every filter change.

use super::palette::{CategoryPalette, Rgb};
use crate::config::DashboardConfig;
use crate::data::{Category, CategoryClass, IncomeMeasure, NormalizedTables};
use crate::filter::FilterState;
use crate::stats::{
    DerivedMetric, GroupStats, MetricEngine, MetricKind, PeriodOrYear, SpendingWeights,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// How many categories the key-insights panel lists.
pub const TOP_INCREASES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub category: Category,
    pub label: &'static str,
    pub color: Rgb,
}

/// Chart 1: price change since baseline, one bar per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChangeBar {
    pub category: Category,
    pub label: &'static str,
    pub change: f64,
    pub base_value: f64,
    pub latest_value: f64,
    pub class: CategoryClass,
    pub color: Rgb,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceChangeChart {
    pub baseline_year: i32,
    pub end_year: i32,
    /// Sorted by change, highest first.
    pub bars: Vec<PriceChangeBar>,
    /// Categories reported as "insufficient data".
    pub insufficient: Vec<Category>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub month: u32,
    pub value: f64,
}

/// Chart 2: monthly index lines. Missing months are absent, not interpolated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub category: Category,
    pub label: &'static str,
    pub color: Rgb,
    pub points: Vec<TrendPoint>,
}

/// Chart 3: year-over-year heatmap and period comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YoyChart {
    pub monthly_yoy: Vec<DerivedMetric>,
    pub annual_yoy: Vec<DerivedMetric>,
    pub period_averages: Vec<DerivedMetric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSeries {
    pub region: String,
    pub color: Rgb,
    pub points: Vec<(i32, f64)>,
}

/// Chart 4: regional income and the income-vs-CPI comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionalChart {
    pub compensation: Vec<RegionSeries>,
    pub disposable_index: Vec<RegionSeries>,
    pub growth: Vec<DerivedMetric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EssentialPoint {
    pub category: Category,
    pub label: &'static str,
    pub class: CategoryClass,
    pub change: f64,
    pub color: Rgb,
}

/// Chart 5: essential vs non-essential distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EssentialsChart {
    pub points: Vec<EssentialPoint>,
    pub summaries: Vec<(CategoryClass, GroupStats)>,
}

/// Chart 6: spending shares plus the demographic burden bars.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpendingChart {
    pub shares: Vec<DerivedMetric>,
    pub burden: Vec<DerivedMetric>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyInsights {
    pub top_increases: Vec<(String, f64)>,
    pub essential_avg: Option<f64>,
    pub non_essential_avg: Option<f64>,
    pub essentials_rising_faster: bool,
    pub most_affected_region: Option<String>,
    pub least_affected_region: Option<String>,
}

/// Everything the rendering layer needs for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub filter: FilterState,
    pub legend: Vec<LegendEntry>,
    pub price_change: PriceChangeChart,
    pub trends: Vec<TrendSeries>,
    pub yoy: YoyChart,
    pub regional: RegionalChart,
    pub essentials: EssentialsChart,
    pub spending: SpendingChart,
    pub insights: KeyInsights,
}

impl DashboardSnapshot {
    /// Derive every chart series for the given filter state.
    pub fn build(
        tables: &NormalizedTables,
        config: &DashboardConfig,
        palette: &CategoryPalette,
        filter: &FilterState,
    ) -> Self {
        let engine = MetricEngine::new(tables, config);
        let scope = filter.scope();

        let legend = scope
            .categories
            .iter()
            .map(|&category| LegendEntry {
                category,
                label: category.short_name(),
                color: palette.color(category),
            })
            .collect();

        let price_change = Self::price_change_chart(tables, config, palette, &engine, filter);

        let trends: Vec<TrendSeries> = scope
            .categories
            .iter()
            .map(|&category| TrendSeries {
                category,
                label: category.short_name(),
                color: palette.color(category),
                points: tables
                    .monthly_prices
                    .category_rows(category)
                    .filter(|r| scope.years.contains(r.year))
                    .filter_map(|r| {
                        Some(TrendPoint {
                            year: r.year,
                            month: r.month?,
                            value: r.index_value,
                        })
                    })
                    .collect(),
            })
            .filter(|s| !s.points.is_empty())
            .collect();

        let yoy = YoyChart {
            monthly_yoy: engine.monthly_yoy_averages(&scope),
            annual_yoy: engine.yoy_all(&scope),
            period_averages: engine.period_average_all(&scope, filter.selected_period()),
        };

        let regional = RegionalChart {
            compensation: Self::region_series(tables, palette, &scope, IncomeMeasure::Compensation),
            disposable_index: Self::region_series(
                tables,
                palette,
                &scope,
                IncomeMeasure::DisposableIndex,
            ),
            growth: engine.income_vs_cpi(&scope),
        };

        let essentials = EssentialsChart {
            points: engine
                .range_changes(&scope)
                .into_iter()
                .filter(|(category, _)| category.is_division())
                .map(|(category, change)| EssentialPoint {
                    category,
                    label: category.short_name(),
                    class: category.class(),
                    change,
                    color: palette.class_color(category.class()),
                })
                .collect(),
            summaries: engine.class_summary(&scope),
        };

        let weights = Self::burden_weights(tables, config, filter);
        let spending = SpendingChart {
            shares: engine.spending_shares(&scope),
            burden: engine.burden_all(&scope, &weights),
        };

        let insights = Self::insights(&price_change, &essentials, &regional);

        debug!(
            bars = price_change.bars.len(),
            trends = trends.len(),
            burden = spending.burden.len(),
            "dashboard snapshot built"
        );

        Self {
            filter: filter.clone(),
            legend,
            price_change,
            trends,
            yoy,
            regional,
            essentials,
            spending,
            insights,
        }
    }

    fn price_change_chart(
        tables: &NormalizedTables,
        config: &DashboardConfig,
        palette: &CategoryPalette,
        engine: &MetricEngine<'_>,
        filter: &FilterState,
    ) -> PriceChangeChart {
        let scope = filter.scope();
        let end_year = scope.years.end;
        let report = engine.pct_change_all(&scope);

        let mut bars: Vec<PriceChangeBar> = report
            .metrics
            .iter()
            .filter(|m| m.period_or_year == PeriodOrYear::Year(end_year))
            .filter_map(|m| {
                let category = scope
                    .categories
                    .iter()
                    .copied()
                    .find(|c| c.short_name() == m.category)?;
                let series = tables.annual_prices.annual_series(category);
                Some(PriceChangeBar {
                    category,
                    label: category.short_name(),
                    change: m.value,
                    base_value: *series.get(&config.baseline_year)?,
                    latest_value: *series.get(&end_year)?,
                    class: category.class(),
                    color: palette.color(category),
                })
            })
            .collect();
        bars.sort_by(|a, b| b.change.total_cmp(&a.change).then(a.category.cmp(&b.category)));

        PriceChangeChart {
            baseline_year: config.baseline_year,
            end_year,
            bars,
            insufficient: report.insufficient,
        }
    }

    fn region_series(
        tables: &NormalizedTables,
        palette: &CategoryPalette,
        scope: &crate::filter::Scope,
        measure: IncomeMeasure,
    ) -> Vec<RegionSeries> {
        tables
            .regions(measure)
            .into_iter()
            .enumerate()
            .map(|(i, region)| {
                let points = tables
                    .income_series(&region, measure)
                    .into_iter()
                    .filter(|(year, _)| scope.years.contains(*year))
                    .collect();
                RegionSeries {
                    color: palette.region_color(i),
                    region,
                    points,
                }
            })
            .filter(|s| !s.points.is_empty())
            .collect()
    }

    /// Configured groups plus one derived from the latest consumption year in range.
    fn burden_weights(
        tables: &NormalizedTables,
        config: &DashboardConfig,
        filter: &FilterState,
    ) -> SpendingWeights {
        let range = filter.year_range();
        let latest = tables
            .consumption
            .iter()
            .map(|r| r.year)
            .filter(|y| range.contains(*y))
            .max();

        match latest.and_then(|year| SpendingWeights::from_consumption(&tables.consumption, year)) {
            Some(derived) => config.weights.clone().merged(derived),
            None => config.weights.clone(),
        }
    }

    fn insights(
        price_change: &PriceChangeChart,
        essentials: &EssentialsChart,
        regional: &RegionalChart,
    ) -> KeyInsights {
        let top_increases = price_change
            .bars
            .iter()
            .take(TOP_INCREASES)
            .map(|b| (b.label.to_string(), b.change))
            .collect();

        let avg = |class: CategoryClass| {
            essentials
                .summaries
                .iter()
                .find(|(c, _)| *c == class)
                .map(|(_, s)| s.mean)
        };
        let essential_avg = avg(CategoryClass::Essential);
        let non_essential_avg = avg(CategoryClass::NonEssential);

        let real: BTreeMap<&str, f64> = regional
            .growth
            .iter()
            .filter(|m| m.metric_kind == MetricKind::RealIncomeChange)
            .map(|m| (m.category.as_str(), m.value))
            .collect();
        let most_affected = real
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(r, _)| r.to_string());
        let least_affected = real
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(r, _)| r.to_string());

        KeyInsights {
            top_increases,
            essential_avg,
            non_essential_avg,
            essentials_rising_faster: matches!(
                (essential_avg, non_essential_avg),
                (Some(e), Some(n)) if e > n
            ),
            most_affected_region: most_affected,
            least_affected_region: least_affected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YearSpan;
    use crate::data::{ConsumptionObservation, IncomeObservation, PriceObservation, PriceTable};
    use crate::filter::{FilterEvent, PeriodSelection};

    fn annual(category: Category, year: i32, index_value: f64) -> PriceObservation {
        PriceObservation {
            category,
            year,
            month: None,
            index_value,
        }
    }

    fn tables() -> NormalizedTables {
        let mut prices = Vec::new();
        for (category, end) in [
            (Category::Housing, 145.0),
            (Category::Food, 125.0),
            (Category::Clothing, 98.0),
            (Category::Recreation, 112.0),
            (Category::AllItems, 122.0),
        ] {
            prices.push(annual(category, 2015, 100.0));
            prices.push(annual(category, 2024, end));
        }

        let monthly = (1..=12)
            .map(|month| PriceObservation {
                category: Category::Housing,
                year: 2024,
                month: Some(month),
                index_value: 140.0 + month as f64 * 0.5,
            })
            .collect();

        let income = |region: &str, year: i32, value: f64| IncomeObservation {
            region: region.to_string(),
            measure: IncomeMeasure::Compensation,
            year,
            value,
        };

        NormalizedTables {
            annual_prices: PriceTable::new(prices),
            monthly_prices: PriceTable::new(monthly),
            income: vec![
                income("Southern", 2015, 100.0),
                income("Southern", 2024, 140.0),
                income("Northern and Western", 2015, 100.0),
                income("Northern and Western", 2024, 115.0),
            ],
            consumption: vec![
                ConsumptionObservation { category: Category::Housing, year: 2024, value: 600.0 },
                ConsumptionObservation { category: Category::Food, year: 2024, value: 400.0 },
            ],
        }
    }

    fn filter() -> FilterState {
        FilterState::with_defaults(YearSpan::new(2015, 2024)).unwrap()
    }

    #[test]
    fn test_price_change_bars_sorted_with_colors() {
        let tables = tables();
        let config = DashboardConfig::default();
        let palette = CategoryPalette::standard();
        let snapshot = DashboardSnapshot::build(&tables, &config, &palette, &filter());

        let labels: Vec<_> = snapshot.price_change.bars.iter().map(|b| b.label).collect();
        assert_eq!(
            labels,
            vec!["Housing & Utilities", "Food & Beverages", "Recreation & Culture", "Clothing & Footwear"]
        );
        let housing = &snapshot.price_change.bars[0];
        assert!((housing.change - 45.0).abs() < 1e-12);
        assert_eq!(housing.color, palette.color(Category::Housing));
        // Selected divisions with no data are reported, not dropped silently
        assert!(snapshot.price_change.insufficient.contains(&Category::Health));
    }

    #[test]
    fn test_insights_and_regions() {
        let tables = tables();
        let config = DashboardConfig::default();
        let snapshot =
            DashboardSnapshot::build(&tables, &config, &CategoryPalette::standard(), &filter());

        assert_eq!(snapshot.insights.top_increases.len(), TOP_INCREASES);
        assert!(snapshot.insights.essentials_rising_faster);
        // CPI growth is 22%: Southern +18 real, Northern and Western -7 real
        assert_eq!(
            snapshot.insights.most_affected_region.as_deref(),
            Some("Northern and Western")
        );
        assert_eq!(snapshot.insights.least_affected_region.as_deref(), Some("Southern"));
        assert_eq!(snapshot.regional.compensation.len(), 2);
    }

    #[test]
    fn test_trends_and_burden_follow_selection() {
        let tables = tables();
        let config = DashboardConfig::default();
        let palette = CategoryPalette::standard();
        let state = filter()
            .apply(FilterEvent::SelectCategories(vec![Category::Housing, Category::Food]))
            .unwrap()
            .apply(FilterEvent::SetPeriod(PeriodSelection::PreCovid))
            .unwrap();

        let snapshot = DashboardSnapshot::build(&tables, &config, &palette, &state);
        assert_eq!(snapshot.trends.len(), 1);
        assert_eq!(snapshot.trends[0].points.len(), 12);
        assert_eq!(snapshot.legend.len(), 2);

        // Consumption-derived weights: 0.6 * 45 + 0.4 * 25
        assert_eq!(snapshot.spending.burden.len(), 1);
        assert!((snapshot.spending.burden[0].value - 37.0).abs() < 1e-9);
    }

    #[test]
    fn test_essentials_follow_range_start() {
        let mut tables = tables();
        let mut prices: Vec<PriceObservation> = tables.annual_prices.rows().to_vec();
        prices.push(annual(Category::Housing, 2020, 125.0));
        prices.push(annual(Category::Clothing, 2020, 100.0));
        tables.annual_prices = PriceTable::new(prices);

        let config = DashboardConfig::default();
        let state = filter()
            .apply(FilterEvent::SetYearRange { start: 2020, end: 2024 })
            .unwrap();
        let snapshot =
            DashboardSnapshot::build(&tables, &config, &CategoryPalette::standard(), &state);

        // No 2015 readings in range, yet the essentials chart still has both endpoints
        assert!(snapshot.price_change.bars.is_empty());
        let points: Vec<_> = snapshot
            .essentials
            .points
            .iter()
            .map(|p| (p.category, p.change))
            .collect();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].0, Category::Clothing);
        assert!((points[0].1 + 2.0).abs() < 1e-9);
        assert_eq!(points[1].0, Category::Housing);
        assert!((points[1].1 - 16.0).abs() < 1e-9);
        let essential_avg = snapshot.insights.essential_avg.unwrap();
        assert!((essential_avg - 16.0).abs() < 1e-9);
        assert!(snapshot.insights.essentials_rising_faster);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let tables = tables();
        let config = DashboardConfig::default();
        let palette = CategoryPalette::standard();
        let a = DashboardSnapshot::build(&tables, &config, &palette, &filter());
        let b = DashboardSnapshot::build(&tables, &config, &palette, &filter());
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
