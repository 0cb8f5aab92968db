//! Filter State
//! Sidebar selections as validated, immutable state with pure transitions.

use crate::config::{Period, YearSpan};
use crate::data::Category;
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Year range start {start} is after end {end}")]
    InvertedRange { start: i32, end: i32 },
    #[error("Year range {start}-{end} falls outside the data years {min}-{max}")]
    OutOfBounds { start: i32, end: i32, min: i32, max: i32 },
    #[error("At least one category must stay selected")]
    EmptySelection,
}

/// Period dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PeriodSelection {
    #[default]
    All,
    PreCovid,
    Covid,
    InflationSurge,
}

impl PeriodSelection {
    /// Periods covered by the selection, in chronological order.
    pub fn periods(self) -> Vec<Period> {
        match self {
            PeriodSelection::All => Period::ALL.to_vec(),
            PeriodSelection::PreCovid => vec![Period::PreCovid],
            PeriodSelection::Covid => vec![Period::Covid],
            PeriodSelection::InflationSurge => vec![Period::InflationSurge],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PeriodSelection::All => "All Periods",
            PeriodSelection::PreCovid => Period::PreCovid.label(),
            PeriodSelection::Covid => Period::Covid.label(),
            PeriodSelection::InflationSurge => Period::InflationSurge.label(),
        }
    }
}

/// User interactions that change the filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
    SetYearRange { start: i32, end: i32 },
    SelectCategories(Vec<Category>),
    ToggleCategory(Category),
    SelectAllCategories,
    SetPeriod(PeriodSelection),
}

/// The rows a derivation may see: a year range and a category set.
///
/// Unlike [`FilterState`] the category set may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub years: YearSpan,
    pub categories: BTreeSet<Category>,
}

impl Scope {
    pub fn new(years: YearSpan, categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            years,
            categories: categories.into_iter().collect(),
        }
    }

    pub fn includes(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    pub fn admits(&self, category: Category, year: i32) -> bool {
        self.includes(category) && self.years.contains(year)
    }
}

/// Validated sidebar state: ordered year range within the data years,
/// non-empty category selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    #[serde(skip)]
    year_bounds: YearSpan,
    year_range: YearSpan,
    selected_categories: BTreeSet<Category>,
    selected_period: PeriodSelection,
}

impl FilterState {
    pub fn new(
        year_range: YearSpan,
        categories: impl IntoIterator<Item = Category>,
        selected_period: PeriodSelection,
    ) -> Result<Self, FilterError> {
        let state = Self {
            year_bounds: year_range,
            year_range,
            selected_categories: categories.into_iter().collect(),
            selected_period,
        };
        state.validate()?;
        Ok(state)
    }

    /// Session defaults: the given year bounds (which later ranges must stay inside), all 12 divisions, all periods.
    pub fn with_defaults(year_bounds: YearSpan) -> Result<Self, FilterError> {
        Self::new(year_bounds, Category::DIVISIONS, PeriodSelection::All)
    }

    fn validate(&self) -> Result<(), FilterError> {
        if self.year_range.start > self.year_range.end {
            return Err(FilterError::InvertedRange {
                start: self.year_range.start,
                end: self.year_range.end,
            });
        }
        let (range, bounds) = (self.year_range, self.year_bounds);
        if range.start < bounds.start || range.end > bounds.end {
            return Err(FilterError::OutOfBounds {
                start: range.start,
                end: range.end,
                min: bounds.start,
                max: bounds.end,
            });
        }
        if self.selected_categories.is_empty() {
            return Err(FilterError::EmptySelection);
        }
        Ok(())
    }

    /// Old state + event → new validated state. `self` is never modified.
    pub fn apply(&self, event: FilterEvent) -> Result<FilterState, FilterError> {
        let mut next = self.clone();
        match event {
            FilterEvent::SetYearRange { start, end } => {
                next.year_range = YearSpan::new(start, end);
            }
            FilterEvent::SelectCategories(categories) => {
                next.selected_categories = categories.into_iter().collect();
            }
            FilterEvent::ToggleCategory(category) => {
                if !next.selected_categories.remove(&category) {
                    next.selected_categories.insert(category);
                }
            }
            FilterEvent::SelectAllCategories => {
                next.selected_categories = Category::DIVISIONS.into_iter().collect();
            }
            FilterEvent::SetPeriod(period) => {
                next.selected_period = period;
            }
        }
        next.validate()?;
        Ok(next)
    }

    pub fn year_range(&self) -> YearSpan {
        self.year_range
    }

    pub fn year_bounds(&self) -> YearSpan {
        self.year_bounds
    }

    pub fn selected_categories(&self) -> &BTreeSet<Category> {
        &self.selected_categories
    }

    pub fn selected_period(&self) -> PeriodSelection {
        self.selected_period
    }

    pub fn scope(&self) -> Scope {
        Scope {
            years: self.year_range,
            categories: self.selected_categories.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> FilterState {
        FilterState::with_defaults(YearSpan::new(2015, 2024)).unwrap()
    }

    #[test]
    fn test_defaults_select_all_divisions() {
        let state = defaults();
        assert_eq!(state.selected_categories().len(), 12);
        assert!(!state.selected_categories().contains(&Category::AllItems));
        assert_eq!(state.selected_period(), PeriodSelection::All);
    }

    #[test]
    fn test_inverted_range_rejected_and_state_kept() {
        let state = defaults();
        let err = state
            .apply(FilterEvent::SetYearRange {
                start: 2020,
                end: 2018,
            })
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::InvertedRange {
                start: 2020,
                end: 2018
            }
        );
        assert_eq!(state.year_range(), YearSpan::new(2015, 2024));
    }

    #[test]
    fn test_year_range_must_stay_within_data_years() {
        let state = defaults();
        assert_eq!(
            state.apply(FilterEvent::SetYearRange {
                start: 1900,
                end: 2020
            }),
            Err(FilterError::OutOfBounds {
                start: 1900,
                end: 2020,
                min: 2015,
                max: 2024
            })
        );
        assert!(state
            .apply(FilterEvent::SetYearRange {
                start: 2018,
                end: 2030
            })
            .is_err());

        let narrowed = state
            .apply(FilterEvent::SetYearRange {
                start: 2018,
                end: 2020,
            })
            .unwrap();
        assert_eq!(narrowed.year_bounds(), YearSpan::new(2015, 2024));
        // Widening back to the full bounds is still allowed
        assert!(narrowed
            .apply(FilterEvent::SetYearRange {
                start: 2015,
                end: 2024
            })
            .is_ok());
    }

    #[test]
    fn test_cannot_deselect_last_category() {
        let state = defaults()
            .apply(FilterEvent::SelectCategories(vec![Category::Health]))
            .unwrap();
        assert_eq!(
            state.apply(FilterEvent::ToggleCategory(Category::Health)),
            Err(FilterError::EmptySelection)
        );
        assert_eq!(
            state.apply(FilterEvent::SelectCategories(Vec::new())),
            Err(FilterError::EmptySelection)
        );
    }

    #[test]
    fn test_toggle_and_period_transitions() {
        let state = defaults()
            .apply(FilterEvent::ToggleCategory(Category::Food))
            .unwrap()
            .apply(FilterEvent::ToggleCategory(Category::AllItems))
            .unwrap()
            .apply(FilterEvent::SetPeriod(PeriodSelection::Covid))
            .unwrap();

        assert!(!state.selected_categories().contains(&Category::Food));
        assert!(state.selected_categories().contains(&Category::AllItems));
        assert_eq!(state.selected_period().periods(), vec![Period::Covid]);

        let reset = state.apply(FilterEvent::SelectAllCategories).unwrap();
        assert_eq!(reset.selected_categories().len(), 12);
    }

    #[test]
    fn test_scope_admits_rows_in_range_and_selection() {
        let scope = defaults()
            .apply(FilterEvent::SetYearRange {
                start: 2018,
                end: 2020,
            })
            .unwrap()
            .scope();
        assert!(scope.admits(Category::Food, 2019));
        assert!(!scope.admits(Category::Food, 2021));
        assert!(!scope.admits(Category::AllItems, 2019));
    }
}
