//! Statistics Calculator Module
//! Descriptive statistics for groups of derived values.

use serde::Serialize;
use statrs::statistics::{Data, Median, Statistics};

/// Descriptive statistics for one group of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub group_name: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; absent below two values.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl Default for GroupStats {
    fn default() -> Self {
        Self {
            group_name: String::new(),
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: None,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Handles descriptive statistics.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(group_name: &str, values: &[f64]) -> GroupStats {
        let n = values.len();
        if n == 0 {
            return GroupStats {
                group_name: group_name.to_string(),
                ..GroupStats::default()
            };
        }

        let std = (n > 1).then(|| values.iter().std_dev());

        GroupStats {
            group_name: group_name.to_string(),
            count: n,
            mean: values.iter().mean(),
            median: Data::new(values.to_vec()).median(),
            std,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Arithmetic mean, `None` for an empty slice.
    pub fn mean(values: &[f64]) -> Option<f64> {
        (!values.is_empty()).then(|| values.iter().mean())
    }
}
