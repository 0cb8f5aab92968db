//! Category Label Mapping
//! Explicit table from source label spellings to the canonical category vocabulary.

use super::category::Category;
use std::collections::HashMap;

/// Where a source label lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelTarget {
    Category(Category),
    /// Known label deliberately left out of the tables.
    Skip,
}

/// Outcome of resolving one label from source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelResolution {
    Mapped(Category),
    Skipped,
    /// Carries a COICOP code below division level, e.g. `01.1`.
    SubDivision,
    Unknown,
}

/// Lookup key: trimmed, lower-cased, inner whitespace collapsed.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Label → target table. Keys are stored normalized.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    entries: HashMap<String, LabelTarget>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every spelling the CSO sources and the dashboard use for each category.
    pub fn canonical() -> Self {
        let mut map = Self::new();
        for cat in Category::ALL {
            let target = LabelTarget::Category(cat);
            map.insert(&cat.full_label(), target);
            map.insert(cat.title(), target);
            map.insert(cat.short_name(), target);
            if cat.is_division() {
                map.insert(&format!("CP{:02} - {}", cat.code(), cat.title()), target);
                map.insert(&format!("CP{:02}", cat.code()), target);
            }
        }
        map.insert("All items", LabelTarget::Category(Category::AllItems));
        map
    }

    pub fn insert(&mut self, label: &str, target: LabelTarget) {
        self.entries.insert(normalize_label(label), target);
    }

    pub fn lookup(&self, label: &str) -> Option<LabelTarget> {
        self.entries.get(&normalize_label(label)).copied()
    }

    /// Explicit entries first, then the sub-division rule.
    pub fn resolve(&self, label: &str) -> LabelResolution {
        match self.lookup(label) {
            Some(LabelTarget::Category(cat)) => LabelResolution::Mapped(cat),
            Some(LabelTarget::Skip) => LabelResolution::Skipped,
            None if is_subdivision(label) => LabelResolution::SubDivision,
            None => LabelResolution::Unknown,
        }
    }

    /// Parse a target spelling used in configuration: a category name or `skip`.
    pub fn parse_target(&self, value: &str) -> Option<LabelTarget> {
        if normalize_label(value) == "skip" {
            return Some(LabelTarget::Skip);
        }
        self.lookup(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `(COICOP 01.1)` style codes, or `CP011` style item codes.
fn is_subdivision(label: &str) -> bool {
    let normalized = normalize_label(label);

    if let Some(pos) = normalized.find("coicop ") {
        let code: String = normalized[pos + "coicop ".len()..]
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if code.contains('.') {
            return true;
        }
    }

    if let Some(rest) = normalized.strip_prefix("cp") {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 2 {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_case_and_spacing() {
        assert_eq!(normalize_label("  Health   (COICOP 06) "), "health (coicop 06)");
    }

    #[test]
    fn test_canonical_resolves_source_spellings() {
        let map = LabelMap::canonical();
        assert_eq!(
            map.resolve("Food and non-alcoholic beverages (COICOP 01)"),
            LabelResolution::Mapped(Category::Food)
        );
        assert_eq!(
            map.resolve("CP04 - Housing, water, electricity, gas and other fuels"),
            LabelResolution::Mapped(Category::Housing)
        );
        assert_eq!(
            map.resolve("housing &  UTILITIES"),
            LabelResolution::Mapped(Category::Housing)
        );
        assert_eq!(
            map.resolve("All-items HICP (COICOP 00)"),
            LabelResolution::Mapped(Category::AllItems)
        );
    }

    #[test]
    fn test_subdivision_labels_are_recognised() {
        let map = LabelMap::canonical();
        assert_eq!(
            map.resolve("Bread and cereals (COICOP 01.1.1)"),
            LabelResolution::SubDivision
        );
        assert_eq!(map.resolve("CP011 - Food"), LabelResolution::SubDivision);
        assert_eq!(map.resolve("Energy products"), LabelResolution::Unknown);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut map = LabelMap::canonical();
        map.insert("Energy products", LabelTarget::Skip);
        map.insert("Housing costs", LabelTarget::Category(Category::Housing));
        assert_eq!(map.resolve("ENERGY products"), LabelResolution::Skipped);
        assert_eq!(
            map.resolve("Housing costs"),
            LabelResolution::Mapped(Category::Housing)
        );
        assert_eq!(map.parse_target("Skip"), Some(LabelTarget::Skip));
        assert_eq!(
            map.parse_target("Transport"),
            Some(LabelTarget::Category(Category::Transport))
        );
    }
}
