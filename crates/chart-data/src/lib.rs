// File: crates/chart-data/src/lib.rs
// Summary: Core library entry point; exports the data model, histogram binning and series API.

pub mod value;
pub mod property;
pub mod error;
pub mod extent;
pub mod ticks;
pub mod data_model;
pub mod histogram;
pub mod scale;
pub mod series;

pub use value::{Row, Value};
pub use property::{validation, ColumnDef, DataModelOptions, PropertyDef, PropertyKind, ReducerDef, SumDef, ValueType};
pub use error::ConfigError;
pub use extent::{fix_numeric_extent, numeric_extent};
pub use data_model::{DataModel, GroupedDatum, ProcessedData, ProcessedDomain, ProcessedRows, Reduced, UngroupedDatum};
pub use histogram::{
    aggregate, bin_rows, derive_bins, place_data_in_bins, HistogramAggregation, HistogramBin, HistogramData,
    HistogramOptions, DEFAULT_BIN_COUNT,
};
pub use scale::{LinearScale, Scale};
pub use series::{ChartAxisDirection, HistogramNodeDatum, HistogramSeries, LineData, LineNodeDatum, LineSeries};
