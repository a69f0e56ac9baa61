// File: crates/chart-data/src/histogram.rs
// Summary: Histogram binning: bin derivation (explicit, nice ticks, fixed count),
// sort-then-sweep placement, and count/sum/mean aggregation.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::extent::{fix_numeric_extent, numeric_extent};
use crate::ticks::{tick_step, ticks};
use crate::value::Row;

/// Target bin count for automatically derived bins.
pub const DEFAULT_BIN_COUNT: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistogramAggregation {
    #[default]
    Count,
    Sum,
    Mean,
}

impl FromStr for HistogramAggregation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(HistogramAggregation::Count),
            "sum" => Ok(HistogramAggregation::Sum),
            "mean" => Ok(HistogramAggregation::Mean),
            other => Err(ConfigError::UnknownAggregation(other.to_string())),
        }
    }
}

/// Histogram series configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistogramOptions {
    pub x_key: String,
    pub y_key: Option<String>,
    /// Explicit `[lo, hi]` bins, used verbatim unless `bin_count` is set.
    pub bins: Option<Vec<[f64; 2]>>,
    pub bin_count: Option<usize>,
    pub aggregation: HistogramAggregation,
    /// Plot densities (`aggregated / width`) instead of aggregated values.
    pub area_plot: bool,
}

impl HistogramOptions {
    pub fn new(x_key: impl Into<String>) -> Self {
        Self { x_key: x_key.into(), ..Self::default() }
    }

    /// Configured y key; an empty string counts as unset.
    pub fn y_key(&self) -> Option<&str> {
        self.y_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.x_key.is_empty() {
            return Err(ConfigError::MissingKey("xKey"));
        }
        if self.bin_count == Some(0) {
            return Err(ConfigError::ZeroBinCount);
        }
        if let Some(bins) = &self.bins {
            let mut prev_hi = f64::NEG_INFINITY;
            for (index, &[lo, hi]) in bins.iter().enumerate() {
                if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                    return Err(ConfigError::InvalidBin { index, lo, hi });
                }
                if lo < prev_hi {
                    return Err(ConfigError::UnorderedBins { index });
                }
                prev_hi = hi;
            }
        }
        Ok(())
    }
}

/// One bin: the `[lo, hi]` edges, member rows, and the aggregated value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub domain: [f64; 2],
    /// Indices of the member rows in the binned input.
    pub data: Vec<usize>,
    pub frequency: usize,
    pub aggregated_value: f64,
}

impl HistogramBin {
    pub fn new(domain: [f64; 2]) -> Self {
        Self { domain, data: Vec::new(), frequency: 0, aggregated_value: 0.0 }
    }

    pub fn add_datum(&mut self, index: usize) {
        self.data.push(index);
        self.frequency += 1;
    }

    pub fn domain_width(&self) -> f64 {
        self.domain[1] - self.domain[0]
    }

    /// Density; a zero-width bin reports its aggregated value.
    pub fn relative_height(&self) -> f64 {
        let width = self.domain_width();
        if width > 0.0 {
            self.aggregated_value / width
        } else {
            self.aggregated_value
        }
    }

    pub fn calculate_aggregated_value(&mut self, rows: &[Row], aggregation: HistogramAggregation, y_key: Option<&str>) {
        self.aggregated_value = aggregate(self, rows, aggregation, y_key);
    }

    pub fn y(&self, area_plot: bool) -> f64 {
        if area_plot {
            self.relative_height()
        } else {
            self.aggregated_value
        }
    }
}

/// Reduce a bin. Without a y key the result is always the frequency.
pub fn aggregate(bin: &HistogramBin, rows: &[Row], aggregation: HistogramAggregation, y_key: Option<&str>) -> f64 {
    let Some(y_key) = y_key else {
        return bin.frequency as f64;
    };
    let sum = || -> f64 {
        bin.data
            .iter()
            .filter_map(|&i| rows.get(i)?.get(y_key)?.as_finite_number())
            .sum()
    };
    match aggregation {
        HistogramAggregation::Count => bin.frequency as f64,
        HistogramAggregation::Sum => sum(),
        HistogramAggregation::Mean if bin.frequency == 0 => 0.0,
        HistogramAggregation::Mean => sum() / bin.frequency as f64,
    }
}

fn x_of(row: &Row, x_key: &str) -> Option<f64> {
    row.get(x_key)?.as_finite_number()
}

/// Bin edges for `rows`: explicit bins (without `bin_count`), nice-tick bins, or `bin_count` nice bins.
pub fn derive_bins(rows: &[Row], x_key: &str, bins: Option<&[[f64; 2]]>, bin_count: Option<usize>) -> Vec<[f64; 2]> {
    if let (None, Some(explicit)) = (bin_count, bins) {
        return explicit.to_vec();
    }

    let Some([min, max]) = numeric_extent(rows.iter().filter_map(|r| x_of(r, x_key))) else {
        return Vec::new();
    };
    if min == max {
        return vec![[min, max]];
    }

    match bin_count {
        None => tick_bins(min, max),
        Some(count) => nice_bins(min, max, count.max(1)),
    }
}

/// One bin per nice tick, plus a leading bin of the same width before the first tick.
fn tick_bins(min: f64, max: f64) -> Vec<[f64; 2]> {
    let starts = ticks(min, max, DEFAULT_BIN_COUNT as f64);
    let step = tick_step(min, max, DEFAULT_BIN_COUNT as f64);
    let (Some(&first), Some(&last)) = (starts.first(), starts.last()) else {
        return vec![[min, max]];
    };

    let mut edges = Vec::with_capacity(starts.len() + 2);
    edges.push(first - step);
    edges.extend_from_slice(&starts);
    edges.push(last + step);
    edges.windows(2).map(|w| [w[0], w[1]]).collect()
}

/// `count` equal bins from a power-of-ten aligned start, edges rounded to one decimal.
fn nice_bins(min: f64, max: f64, count: usize) -> Vec<[f64; 2]> {
    let (start, bin_size) = nice_start(min.floor(), max, count);
    let edge = |i: usize| round1(start + i as f64 * bin_size);
    (0..count)
        .map(|i| {
            let lo = edge(i);
            let hi = if i + 1 == count { edge(i + 1).max(max) } else { edge(i + 1) };
            [lo, hi]
        })
        .collect()
}

fn nice_start(a: f64, b: f64, segments: usize) -> (f64, f64) {
    let bin_size = (b - a).abs() / segments as f64;
    let magnitude = 10f64.powf(bin_size.log10().floor());
    ((a / magnitude).floor() * magnitude, bin_size)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Assign rows to `bins` with one sweep over the rows sorted by x.
///
/// A row equal to a bin's upper edge stays in that bin. Rows without a
/// finite numeric x, rows below the first bin, rows in a gap between bins
/// and rows beyond the last bin are left out. Bins are returned up to the
/// last one the sweep reached (at least the first), so leading and interior
/// empty bins are kept and trailing ones are not.
///
/// `bins` must be ascending and non-overlapping, as checked by
/// [`HistogramOptions::validate`].
pub fn place_data_in_bins(rows: &[Row], x_key: &str, bins: &[[f64; 2]]) -> Vec<HistogramBin> {
    let mut sorted: Vec<(f64, usize)> =
        rows.iter().enumerate().filter_map(|(i, r)| x_of(r, x_key).map(|x| (x, i))).collect();
    let unusable = rows.len() - sorted.len();
    if unusable > 0 {
        debug!(unusable, x_key, "rows without a finite numeric x left out of binning");
    }
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut out: Vec<HistogramBin> = bins.iter().map(|&d| HistogramBin::new(d)).collect();
    let mut current = 0usize;
    for (x, index) in sorted {
        while current < out.len() && x > out[current].domain[1] {
            current += 1;
        }
        let Some(bin) = out.get_mut(current) else { break };
        if x >= bin.domain[0] {
            bin.add_datum(index);
        }
    }
    out.truncate(current + 1);
    out
}

/// Output of one histogram pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramData {
    pub bins: Vec<HistogramBin>,
    /// `[first.lo, last.hi]`, or empty without bins.
    pub x_domain: Vec<f64>,
    pub y_domain: [f64; 2],
}

/// Validate `options`, then derive bins, place `rows`, aggregate, and compute both axis domains.
pub fn bin_rows(rows: &[Row], options: &HistogramOptions) -> Result<HistogramData, ConfigError> {
    options.validate()?;
    Ok(bin_validated(rows, options))
}

/// [`bin_rows`] for options that already passed [`HistogramOptions::validate`].
pub(crate) fn bin_validated(rows: &[Row], options: &HistogramOptions) -> HistogramData {
    let derived = derive_bins(rows, &options.x_key, options.bins.as_deref(), options.bin_count);
    let mut bins = place_data_in_bins(rows, &options.x_key, &derived);
    for bin in &mut bins {
        bin.calculate_aggregated_value(rows, options.aggregation, options.y_key());
    }

    let y_max = numeric_extent(bins.iter().map(|b| b.y(options.area_plot))).map(|[_, hi]| hi);
    let y_domain = fix_numeric_extent(y_max.map(|hi| [0.0, hi]));
    let x_domain = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => vec![first.domain[0], last.domain[1]],
        _ => Vec::new(),
    };

    debug!(rows = rows.len(), bins = bins.len(), "binned histogram data");
    HistogramData { bins, x_domain, y_domain }
}
