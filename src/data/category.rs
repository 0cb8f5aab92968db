//! COICOP Category Vocabulary
//! The canonical category set shared by the price and consumption sources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// COICOP division (plus the all-items aggregate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// All-items HICP (COICOP 00), the national CPI series.
    AllItems,
    Food,
    AlcoholTobacco,
    Clothing,
    Housing,
    Furnishings,
    Health,
    Transport,
    Communications,
    Recreation,
    Education,
    Restaurants,
    Miscellaneous,
}

impl Category {
    /// The 12 COICOP divisions, in code order.
    pub const DIVISIONS: [Category; 12] = [
        Category::Food,
        Category::AlcoholTobacco,
        Category::Clothing,
        Category::Housing,
        Category::Furnishings,
        Category::Health,
        Category::Transport,
        Category::Communications,
        Category::Recreation,
        Category::Education,
        Category::Restaurants,
        Category::Miscellaneous,
    ];

    /// Every category, aggregate first.
    pub const ALL: [Category; 13] = [
        Category::AllItems,
        Category::Food,
        Category::AlcoholTobacco,
        Category::Clothing,
        Category::Housing,
        Category::Furnishings,
        Category::Health,
        Category::Transport,
        Category::Communications,
        Category::Recreation,
        Category::Education,
        Category::Restaurants,
        Category::Miscellaneous,
    ];

    /// Two-digit COICOP code.
    pub fn code(self) -> u8 {
        match self {
            Category::AllItems => 0,
            Category::Food => 1,
            Category::AlcoholTobacco => 2,
            Category::Clothing => 3,
            Category::Housing => 4,
            Category::Furnishings => 5,
            Category::Health => 6,
            Category::Transport => 7,
            Category::Communications => 8,
            Category::Recreation => 9,
            Category::Education => 10,
            Category::Restaurants => 11,
            Category::Miscellaneous => 12,
        }
    }

    pub fn from_code(code: u8) -> Option<Category> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Division name as published by the CSO, without the code suffix.
    pub fn title(self) -> &'static str {
        match self {
            Category::AllItems => "All-items HICP",
            Category::Food => "Food and non-alcoholic beverages",
            Category::AlcoholTobacco => "Alcoholic beverages, tobacco and narcotics",
            Category::Clothing => "Clothing and footwear",
            Category::Housing => "Housing, water, electricity, gas and other fuels",
            Category::Furnishings => {
                "Furnishings, household equipment and routine household maintenance"
            }
            Category::Health => "Health",
            Category::Transport => "Transport",
            Category::Communications => "Communications",
            Category::Recreation => "Recreation and culture",
            Category::Education => "Education",
            Category::Restaurants => "Restaurants and hotels",
            Category::Miscellaneous => "Miscellaneous goods and services",
        }
    }

    /// Full HICP label, e.g. `Health (COICOP 06)`.
    pub fn full_label(self) -> String {
        format!("{} (COICOP {:02})", self.title(), self.code())
    }

    /// Short display name used on chart axes and legends.
    pub fn short_name(self) -> &'static str {
        match self {
            Category::AllItems => "All Items",
            Category::Food => "Food & Beverages",
            Category::AlcoholTobacco => "Alcohol & Tobacco",
            Category::Clothing => "Clothing & Footwear",
            Category::Housing => "Housing & Utilities",
            Category::Furnishings => "Furnishings",
            Category::Health => "Health",
            Category::Transport => "Transport",
            Category::Communications => "Communications",
            Category::Recreation => "Recreation & Culture",
            Category::Education => "Education",
            Category::Restaurants => "Restaurants & Hotels",
            Category::Miscellaneous => "Miscellaneous",
        }
    }

    /// Goods and services households cannot easily cut back on.
    pub fn is_essential(self) -> bool {
        matches!(
            self,
            Category::Food
                | Category::Housing
                | Category::Health
                | Category::Transport
                | Category::Education
        )
    }

    pub fn is_division(self) -> bool {
        self != Category::AllItems
    }

    pub fn class(self) -> CategoryClass {
        if self.is_essential() {
            CategoryClass::Essential
        } else {
            CategoryClass::NonEssential
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Essential vs discretionary spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CategoryClass {
    Essential,
    NonEssential,
}

impl CategoryClass {
    pub fn label(self) -> &'static str {
        match self {
            CategoryClass::Essential => "Essential",
            CategoryClass::NonEssential => "Non-Essential",
        }
    }
}
