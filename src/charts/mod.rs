//! Charts module - Chart series and colors handed to the rendering layer

mod dashboard;
mod palette;

pub use dashboard::{
    DashboardSnapshot, EssentialPoint, EssentialsChart, KeyInsights, LegendEntry, PriceChangeBar,
    PriceChangeChart, RegionSeries, RegionalChart, SpendingChart, TrendPoint, TrendSeries,
    YoyChart, TOP_INCREASES,
};
pub use palette::{
    CategoryPalette, Rgb, CATEGORY_PALETTE, ESSENTIAL_COLOR, NON_ESSENTIAL_COLOR, REGION_PALETTE,
};
