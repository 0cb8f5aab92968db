//! End-to-end: CSV exports → normalized tables → filtered dashboard snapshot.

use col_dashboard::charts::{CategoryPalette, DashboardSnapshot};
use col_dashboard::config::{DashboardConfig, SourceFiles, YearSpan};
use col_dashboard::data::{Category, DataLoader};
use col_dashboard::filter::{FilterEvent, FilterState, PeriodSelection};
use col_dashboard::stats::{MetricEngine, MetricKind, PeriodOrYear};
use std::fmt::Write as _;
use std::fs;
use tempfile::TempDir;

fn write_sources(dir: &std::path::Path) {
    let files = SourceFiles::default();

    let mut annual = String::from("Statistic Label,Year,Consumer Price Index Category,UNIT,VALUE\n");
    let food = [100.0, 102.1, 103.9, 104.8, 106.3, 106.0, 107.5, 114.0, 122.0, 124.0];
    for (i, value) in food.iter().enumerate() {
        let year = 2015 + i as i32;
        writeln!(
            annual,
            "Harmonised Index of Consumer Prices,{year},Food and non-alcoholic beverages (COICOP 01),Base 2015=100,{value}"
        )
        .unwrap();
        writeln!(
            annual,
            "Harmonised Index of Consumer Prices,{year},All-items HICP (COICOP 00),Base 2015=100,{}",
            100.0 + i as f64 * 2.0
        )
        .unwrap();
    }
    writeln!(
        annual,
        "Harmonised Index of Consumer Prices,2024,Education (COICOP 10),Base 2015=100,118.0"
    )
    .unwrap();
    fs::write(dir.join(&files.annual_cpi), annual).unwrap();

    let mut monthly = String::from("Statistic Label,Month,Consumer Price Index Category,UNIT,VALUE\n");
    for (year, base) in [(2022, 110.0), (2023, 120.0)] {
        for (m, name) in ["January", "February", "March"].iter().enumerate() {
            writeln!(
                monthly,
                "EU HICP,{year} {name},Food and non-alcoholic beverages (COICOP 01),Base 2015=100,{}",
                base + m as f64
            )
            .unwrap();
        }
    }
    fs::write(dir.join(&files.monthly_cpi), monthly).unwrap();

    fs::write(
        dir.join(&files.household_income),
        "Statistic Label,Year,NUTS 2 Region,UNIT,VALUE\n\
         Compensation of Employees (Euro Million),2015,Southern,Euro Million,20000\n\
         Compensation of Employees (Euro Million),2024,Southern,Euro Million,30000\n\
         Compensation of Employees (Euro Million),2015,Ireland,Euro Million,80000\n",
    )
    .unwrap();

    fs::write(
        dir.join(&files.consumption),
        "Statistic Label,Year,Item,UNIT,VALUE\n\
         Personal consumption,2024,CP01 - Food and non-alcoholic beverages,Euro Million,8000\n\
         Personal consumption,2024,CP10 - Education,Euro Million,2000\n",
    )
    .unwrap();
}

#[test]
fn test_full_pipeline() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());

    let config = DashboardConfig::default();
    let tables = DataLoader::new(dir.path(), config.files.clone())
        .load_all(&config.labels)
        .unwrap();
    assert_eq!(tables.year_bounds(), Some((2015, 2024)));

    let filter = FilterState::with_defaults(YearSpan::new(2015, 2024))
        .unwrap()
        .apply(FilterEvent::SelectCategories(vec![Category::Food, Category::Education]))
        .unwrap()
        .apply(FilterEvent::SetPeriod(PeriodSelection::PreCovid))
        .unwrap();

    let engine = MetricEngine::new(&tables, &config);
    let pre_covid = engine.period_average(Category::Food, &filter.scope(), filter.selected_period());
    assert_eq!(pre_covid.len(), 1);
    assert_eq!(pre_covid[0].metric_kind, MetricKind::PeriodAvgPctChange);

    let palette = CategoryPalette::standard();
    let snapshot = DashboardSnapshot::build(&tables, &config, &palette, &filter);

    // Education has no 2015 reading
    assert_eq!(snapshot.price_change.insufficient, vec![Category::Education]);
    assert_eq!(snapshot.price_change.bars.len(), 1);
    assert!((snapshot.price_change.bars[0].change - 24.0).abs() < 1e-9);

    // Monthly heatmap only has 2023 (2022 is the first year of readings)
    assert!(snapshot
        .yoy
        .monthly_yoy
        .iter()
        .all(|m| m.period_or_year == PeriodOrYear::Year(2023)));

    // 50% income growth against 18% CPI growth
    let real = snapshot
        .regional
        .growth
        .iter()
        .find(|m| m.metric_kind == MetricKind::RealIncomeChange)
        .unwrap();
    assert_eq!(real.category, "Southern");
    assert!((real.value - 32.0).abs() < 1e-9);

    // Education lacks a price change, so the consumption-weighted burden is absent
    assert!(snapshot.spending.burden.is_empty());
    assert_eq!(snapshot.spending.shares.len(), 2);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["legend"][0]["color"], palette.color(Category::Food).to_hex());
}

#[test]
fn test_unknown_label_stops_load() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let files = SourceFiles::default();
    let mut consumption = fs::read_to_string(dir.path().join(&files.consumption)).unwrap();
    consumption.push_str("Personal consumption,2024,Lottery tickets,Euro Million,5\n");
    fs::write(dir.path().join(&files.consumption), consumption).unwrap();

    let config = DashboardConfig::default();
    let err = DataLoader::new(dir.path(), config.files.clone())
        .load_all(&config.labels)
        .unwrap_err();
    assert!(err.to_string().contains("Lottery tickets"));
}
