//! Data module - CSV loading and normalization

mod category;
mod labels;
mod loader;
mod processor;
mod tables;

pub use category::{Category, CategoryClass};
pub use labels::{normalize_label, LabelMap, LabelResolution, LabelTarget};
pub use loader::{DataLoader, LoaderError, SourceSchemas};
pub use processor::{
    parse_month_period, parse_year, ColumnSpec, DataProcessor, ProcessorError, RawRow,
    SourceSchema, TimeGrain,
};
pub use tables::{
    ConsumptionObservation, IncomeMeasure, IncomeObservation, NormalizedTables, PriceObservation,
    PriceTable,
};
