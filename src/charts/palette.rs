//! Chart Palette Module
//! Fixed category → color mapping shared by every chart.

use crate::data::{Category, CategoryClass};
use serde::{Serialize, Serializer};

/// sRGB color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Essential categories: red.
pub const ESSENTIAL_COLOR: Rgb = Rgb::from_rgb(228, 87, 86);
/// Non-essential categories: blue.
pub const NON_ESSENTIAL_COLOR: Rgb = Rgb::from_rgb(76, 120, 168);

/// One color per category, indexed by COICOP code (00-12).
pub const CATEGORY_PALETTE: [Rgb; 13] = [
    Rgb::from_rgb(52, 73, 94),   // All items: Midnight
    Rgb::from_rgb(231, 76, 60),  // Red
    Rgb::from_rgb(46, 204, 113), // Green
    Rgb::from_rgb(155, 89, 182), // Purple
    Rgb::from_rgb(243, 156, 18), // Orange
    Rgb::from_rgb(26, 188, 156), // Teal
    Rgb::from_rgb(233, 30, 99),  // Pink
    Rgb::from_rgb(0, 188, 212),  // Cyan
    Rgb::from_rgb(255, 87, 34),  // Deep Orange
    Rgb::from_rgb(121, 85, 72),  // Brown
    Rgb::from_rgb(96, 125, 139), // Blue Grey
    Rgb::from_rgb(52, 152, 219), // Blue
    Rgb::from_rgb(241, 196, 15), // Yellow
];

/// Region lines and bars (category10).
pub const REGION_PALETTE: [Rgb; 10] = [
    Rgb::from_rgb(31, 119, 180),
    Rgb::from_rgb(255, 127, 14),
    Rgb::from_rgb(44, 160, 44),
    Rgb::from_rgb(214, 39, 40),
    Rgb::from_rgb(148, 103, 189),
    Rgb::from_rgb(140, 86, 75),
    Rgb::from_rgb(227, 119, 194),
    Rgb::from_rgb(127, 127, 127),
    Rgb::from_rgb(188, 189, 34),
    Rgb::from_rgb(23, 190, 207),
];

/// Immutable category → color table, built once and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPalette {
    colors: [Rgb; 13],
}

impl Default for CategoryPalette {
    fn default() -> Self {
        Self::standard()
    }
}

impl CategoryPalette {
    pub fn standard() -> Self {
        Self {
            colors: CATEGORY_PALETTE,
        }
    }

    pub fn color(&self, category: Category) -> Rgb {
        self.colors[category.code() as usize]
    }

    pub fn class_color(&self, class: CategoryClass) -> Rgb {
        match class {
            CategoryClass::Essential => ESSENTIAL_COLOR,
            CategoryClass::NonEssential => NON_ESSENTIAL_COLOR,
        }
    }

    /// Color for the n-th region in sorted order.
    pub fn region_color(&self, index: usize) -> Rgb {
        REGION_PALETTE[index % REGION_PALETTE.len()]
    }
}
