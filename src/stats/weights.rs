//! Spending Weights Module
//! Per-group spending shares across the COICOP divisions.

use crate::data::{Category, ConsumptionObservation};
use std::collections::BTreeMap;
use thiserror::Error;

/// Default tolerance on the sum of a group's weights.
pub const DEFAULT_WEIGHT_TOLERANCE: f64 = 1e-3;

/// Group name used for weights derived from national consumption data.
pub const CONSUMPTION_GROUP: &str = "All households (consumption shares)";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeightsError {
    #[error("Invalid weights for group '{group}': sum is {sum:.6}, expected 1.0")]
    InvalidWeights { group: String, sum: f64 },
    #[error("Negative weight {weight} for '{category}' in group '{group}'")]
    NegativeWeight {
        group: String,
        category: Category,
        weight: f64,
    },
    #[error("Weight for '{category}' in group '{group}' is not a COICOP division")]
    NotADivision { group: String, category: Category },
}

/// Validated weight table: every group's weights are non-negative and sum to 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpendingWeights {
    groups: BTreeMap<String, BTreeMap<Category, f64>>,
}

impl SpendingWeights {
    pub fn new(
        groups: BTreeMap<String, BTreeMap<Category, f64>>,
        tolerance: f64,
    ) -> Result<Self, WeightsError> {
        for (group, weights) in &groups {
            for (&category, &weight) in weights {
                if !category.is_division() {
                    return Err(WeightsError::NotADivision {
                        group: group.clone(),
                        category,
                    });
                }
                if weight < 0.0 || weight.is_nan() {
                    return Err(WeightsError::NegativeWeight {
                        group: group.clone(),
                        category,
                        weight,
                    });
                }
            }

            let sum: f64 = weights.values().sum();
            if (sum - 1.0).abs() > tolerance {
                return Err(WeightsError::InvalidWeights {
                    group: group.clone(),
                    sum,
                });
            }
        }

        Ok(Self { groups })
    }

    /// Weights from one year's consumption shares over the 12 divisions.
    ///
    /// Returns `None` when the year has no positive spending.
    pub fn from_consumption(consumption: &[ConsumptionObservation], year: i32) -> Option<Self> {
        let mut spend: BTreeMap<Category, f64> = BTreeMap::new();
        for row in consumption
            .iter()
            .filter(|r| r.year == year && r.category.is_division() && r.value > 0.0)
        {
            *spend.entry(row.category).or_insert(0.0) += row.value;
        }

        let total: f64 = spend.values().sum();
        if total <= 0.0 {
            return None;
        }

        let shares = spend.into_iter().map(|(c, v)| (c, v / total)).collect();
        let mut groups = BTreeMap::new();
        groups.insert(CONSUMPTION_GROUP.to_string(), shares);
        Some(Self { groups })
    }

    pub fn group(&self, name: &str) -> Option<&BTreeMap<Category, f64>> {
        self.groups.get(name)
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Union of two tables; groups in `other` replace same-named groups.
    pub fn merged(mut self, other: SpendingWeights) -> Self {
        self.groups.extend(other.groups);
        self
    }
}
