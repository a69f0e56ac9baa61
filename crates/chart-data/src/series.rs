// File: crates/chart-data/src/series.rs
// Summary: Series that own a row snapshot and their last processed result (histogram, line),
// and map that result to node geometry through axis scales.
// Notes:
// - Each process_data() call computes a new result and replaces the previous
//   Arc in a single assignment; earlier results are never mutated.

use std::sync::Arc;

use serde::Serialize;

use crate::data_model::{DataModel, ProcessedData};
use crate::error::ConfigError;
use crate::extent::{fix_numeric_extent, numeric_extent};
use crate::histogram::{bin_validated, HistogramData, HistogramOptions};
use crate::property::{validation, ColumnDef, DataModelOptions, PropertyDef, ReducerDef, ValueType};
use crate::scale::Scale;
use crate::value::{Row, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartAxisDirection {
    X,
    Y,
}

/// Rectangle for one histogram bin, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramNodeDatum {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub aggregated_value: f64,
    pub frequency: usize,
    pub domain: [f64; 2],
    pub mid_point: (f64, f64),
}

pub struct HistogramSeries {
    options: HistogramOptions,
    data: Arc<[Row]>,
    processed: Option<Arc<HistogramData>>,
}

impl HistogramSeries {
    pub fn new(options: HistogramOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self { options, data: Arc::from(Vec::new()), processed: None })
    }

    pub fn options(&self) -> &HistogramOptions {
        &self.options
    }

    pub fn set_data(&mut self, rows: impl Into<Arc<[Row]>>) {
        self.data = rows.into();
    }

    pub fn data(&self) -> &Arc<[Row]> {
        &self.data
    }

    /// Bin the current snapshot and publish the result. Options were validated in `new`.
    pub fn process_data(&mut self) -> Arc<HistogramData> {
        let result = Arc::new(bin_validated(&self.data, &self.options));
        self.processed = Some(Arc::clone(&result));
        result
    }

    pub fn processed(&self) -> Option<&Arc<HistogramData>> {
        self.processed.as_ref()
    }

    pub fn domain(&self, direction: ChartAxisDirection) -> Vec<f64> {
        match (&self.processed, direction) {
            (None, _) => Vec::new(),
            (Some(p), ChartAxisDirection::X) => p.x_domain.clone(),
            (Some(p), ChartAxisDirection::Y) => p.y_domain.to_vec(),
        }
    }

    pub fn create_node_data(&self, x_scale: &dyn Scale, y_scale: &dyn Scale) -> Vec<HistogramNodeDatum> {
        let Some(processed) = &self.processed else { return Vec::new() };
        let y_zero_px = y_scale.convert(0.0);

        processed
            .bins
            .iter()
            .map(|bin| {
                let [lo, hi] = bin.domain;
                let x_min_px = x_scale.convert(lo);
                let x_max_px = x_scale.convert(hi);
                let y_max_px = y_scale.convert(bin.y(self.options.area_plot));
                let width = x_max_px - x_min_px;
                let height = (y_max_px - y_zero_px).abs();
                HistogramNodeDatum {
                    x: x_min_px,
                    y: y_max_px,
                    width,
                    height,
                    aggregated_value: bin.aggregated_value,
                    frequency: bin.frequency,
                    domain: bin.domain,
                    mid_point: (x_min_px + width / 2.0, y_max_px + height / 2.0),
                }
            })
            .collect()
    }
}

/// Processed line data plus the axis domains derived from it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineData {
    pub processed: ProcessedData,
    pub x_domain: [f64; 2],
    pub y_domain: [f64; 2],
}

impl LineData {
    pub fn smallest_x_interval(&self) -> Option<f64> {
        self.processed.reduced.as_ref().and_then(|r| r.smallest_key_interval)
    }
}

/// One point of a line path. `move_to` starts a new sub-path after a gap.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineNodeDatum {
    pub datum: usize,
    pub x: f64,
    pub y: f64,
    pub move_to: bool,
}

pub struct LineSeries {
    x_key: String,
    y_key: String,
    model: DataModel,
    data: Arc<[Row]>,
    processed: Option<Arc<LineData>>,
}

impl LineSeries {
    pub fn new(x_key: impl Into<String>, y_key: impl Into<String>) -> Result<Self, ConfigError> {
        let (x_key, y_key) = (x_key.into(), y_key.into());
        if x_key.is_empty() {
            return Err(ConfigError::MissingKey("xKey"));
        }
        if y_key.is_empty() {
            return Err(ConfigError::MissingKey("yKey"));
        }

        let props: Vec<PropertyDef> = vec![
            ColumnDef::key(x_key.as_str(), ValueType::Range).with_validation(validation::is_continuous).into(),
            ColumnDef::value(y_key.as_str(), ValueType::Range)
                .with_validation(validation::is_number)
                .with_missing_value(Value::Null)
                .with_invalid_value(f64::NAN)
                .into(),
            ReducerDef::SmallestKeyInterval.into(),
        ];
        let model = DataModel::new(DataModelOptions::new(props))?;

        Ok(Self { x_key, y_key, model, data: Arc::from(Vec::new()), processed: None })
    }

    pub fn x_key(&self) -> &str {
        &self.x_key
    }

    pub fn y_key(&self) -> &str {
        &self.y_key
    }

    pub fn set_data(&mut self, rows: impl Into<Arc<[Row]>>) {
        self.data = rows.into();
    }

    pub fn process_data(&mut self) -> Arc<LineData> {
        let processed = self.model.process_data(&self.data);
        let rows = processed.ungrouped().unwrap_or_default();
        let x_domain = fix_numeric_extent(numeric_extent(rows.iter().filter_map(|r| r.keys[0].as_continuous())));
        let y_domain = fix_numeric_extent(numeric_extent(rows.iter().filter_map(|r| r.values[0].as_finite_number())));

        let result = Arc::new(LineData { processed, x_domain, y_domain });
        self.processed = Some(Arc::clone(&result));
        result
    }

    pub fn processed(&self) -> Option<&Arc<LineData>> {
        self.processed.as_ref()
    }

    pub fn domain(&self, direction: ChartAxisDirection) -> Vec<f64> {
        match (&self.processed, direction) {
            (None, _) => Vec::new(),
            (Some(p), ChartAxisDirection::X) => p.x_domain.to_vec(),
            (Some(p), ChartAxisDirection::Y) => p.y_domain.to_vec(),
        }
    }

    pub fn create_node_data(&self, x_scale: &dyn Scale, y_scale: &dyn Scale) -> Vec<LineNodeDatum> {
        let Some(processed) = &self.processed else { return Vec::new() };
        let rows = processed.processed.ungrouped().unwrap_or_default();

        let mut out = Vec::with_capacity(rows.len());
        let mut move_to = true;
        for r in rows {
            let (Some(x), Some(y)) = (r.keys[0].as_continuous(), r.values[0].as_finite_number()) else {
                move_to = true;
                continue;
            };
            let x_px = x_scale.convert(x);
            if x_px.is_nan() {
                move_to = true;
                continue;
            }
            out.push(LineNodeDatum { datum: r.datum, x: x_px, y: y_scale.convert(y), move_to });
            move_to = false;
        }
        out
    }
}
