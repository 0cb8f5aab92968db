//! Stats module - Metric derivation

mod calculator;
mod metrics;
mod weights;

pub use calculator::{GroupStats, StatsCalculator};
pub use metrics::{
    BaselineReport, DeriveError, DerivedMetric, MetricEngine, MetricKind, PeriodOrYear,
};
pub use weights::{SpendingWeights, WeightsError, CONSUMPTION_GROUP, DEFAULT_WEIGHT_TOLERANCE};
