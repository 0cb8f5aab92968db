//! Cost of Living Dashboard - CSO dataset loading & metric derivation
//!
//! Loads the Irish CSO price, income and consumption exports, normalizes them
//! into tidy tables and derives the series behind the dashboard charts for a
//! given filter state.

pub mod charts;
pub mod config;
pub mod data;
pub mod filter;
pub mod stats;

pub use charts::{CategoryPalette, DashboardSnapshot};
pub use config::{ConfigError, DashboardConfig, Period, PeriodTable, YearSpan};
pub use data::{Category, DataLoader, LoaderError, NormalizedTables};
pub use filter::{FilterError, FilterEvent, FilterState, PeriodSelection, Scope};
pub use stats::{DeriveError, DerivedMetric, MetricEngine, MetricKind, SpendingWeights};
