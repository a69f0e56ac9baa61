// File: crates/chart-data/src/data_model.rs
// Summary: Tabular data model: extracts typed key/value columns from rows, groups by key,
// computes sums, normalisation, domains and whole-pass reductions.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::extent::{DomainAccumulator, SumExtent};
use crate::property::{ColumnDef, DataModelOptions, PropertyDef, PropertyKind, ReducerDef};
use crate::value::{Row, Value};

/// One kept input row (ungrouped mode).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UngroupedDatum {
    /// Index of the source row in the processed input.
    pub datum: usize,
    pub keys: Vec<Value>,
    pub values: Vec<Value>,
    /// `[neg, pos]` per sum definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_values: Option<Vec<[f64; 2]>>,
}

/// All rows sharing one key tuple (grouped mode).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedDatum {
    /// Source row indices, in input order.
    pub datums: Vec<usize>,
    pub keys: Vec<Value>,
    /// One value tuple per member, in input order.
    pub values: Vec<Vec<Value>>,
    /// `[min member neg, max member pos]` per sum definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_values: Option<Vec<[f64; 2]>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ProcessedRows {
    Ungrouped(Vec<UngroupedDatum>),
    Grouped(Vec<GroupedDatum>),
}

/// Per-column domains. Range columns hold `[]` or `[min, max]`; category
/// columns hold their distinct values in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDomain {
    pub keys: Vec<Vec<Value>>,
    pub values: Vec<Vec<Value>>,
    /// Present only when sum definitions are configured; each entry is `[]` or `[min, max]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_values: Option<Vec<Vec<f64>>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reduced {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smallest_key_interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum_value_extent: Option<[f64; 2]>,
}

/// Result of one processing pass; serialises as `{ type, data, domain, reduced? }`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessedData {
    #[serde(flatten)]
    pub data: ProcessedRows,
    pub domain: ProcessedDomain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduced: Option<Reduced>,
}

impl ProcessedData {
    pub fn kind(&self) -> &'static str {
        match self.data {
            ProcessedRows::Ungrouped(_) => "ungrouped",
            ProcessedRows::Grouped(_) => "grouped",
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ProcessedRows::Ungrouped(d) => d.len(),
            ProcessedRows::Grouped(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ungrouped(&self) -> Option<&[UngroupedDatum]> {
        match &self.data {
            ProcessedRows::Ungrouped(d) => Some(d),
            ProcessedRows::Grouped(_) => None,
        }
    }

    pub fn grouped(&self) -> Option<&[GroupedDatum]> {
        match &self.data {
            ProcessedRows::Grouped(d) => Some(d),
            ProcessedRows::Ungrouped(_) => None,
        }
    }
}

/// A sum definition resolved against the value columns.
#[derive(Clone, Debug)]
struct ResolvedSum {
    indices: Vec<usize>,
}

impl ResolvedSum {
    /// `[neg, pos]` of one value tuple; non-finite and non-numeric entries are skipped.
    fn sum(&self, values: &[Value]) -> [f64; 2] {
        let mut acc = [0.0, 0.0];
        for &i in &self.indices {
            match values[i].as_finite_number() {
                Some(n) if n < 0.0 => acc[0] += n,
                Some(n) if n > 0.0 => acc[1] += n,
                _ => {}
            }
        }
        acc
    }
}

struct Extracted {
    datum: usize,
    keys: Vec<Value>,
    values: Vec<Value>,
}

/// Turns arbitrary rows into validated, optionally grouped column extracts.
#[derive(Clone, Debug)]
pub struct DataModel {
    keys: Vec<ColumnDef>,
    values: Vec<ColumnDef>,
    sums: Vec<ResolvedSum>,
    reducers: Vec<ReducerDef>,
    group_by_keys: bool,
    normalise_to: Option<f64>,
}

impl DataModel {
    pub fn new(options: DataModelOptions) -> Result<Self, ConfigError> {
        let DataModelOptions { props, group_by_keys, normalise_to } = options;

        let mut keys = Vec::new();
        let mut values = Vec::new();
        let mut sum_defs = Vec::new();
        let mut reducers = Vec::new();
        for prop in props {
            match prop {
                PropertyDef::Column(def) if def.kind == PropertyKind::Key => keys.push(def),
                PropertyDef::Column(def) => values.push(def),
                PropertyDef::Sum(def) => sum_defs.push(def),
                PropertyDef::Reducer(def) => reducers.push(def),
            }
        }

        if keys.is_empty() {
            return Err(ConfigError::NoKeys);
        }

        let sums = sum_defs
            .into_iter()
            .map(|def| {
                if def.properties.is_empty() {
                    return Err(ConfigError::EmptySum);
                }
                let indices = def
                    .properties
                    .iter()
                    .map(|p| {
                        values
                            .iter()
                            .position(|v: &ColumnDef| &v.property == p)
                            .ok_or_else(|| ConfigError::UnknownSumProperty(p.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ResolvedSum { indices })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if sums.is_empty() && reducers.contains(&ReducerDef::SumValueExtent) {
            return Err(ConfigError::ReducerRequiresSum(ReducerDef::SumValueExtent.name()));
        }

        if let Some(total) = normalise_to {
            if !(total.is_finite() && total > 0.0) {
                return Err(ConfigError::InvalidNormaliseTo(total));
            }
            if !group_by_keys {
                return Err(ConfigError::NormaliseRequiresGrouping);
            }
        }

        Ok(Self { keys, values, sums, reducers, group_by_keys, normalise_to })
    }

    pub fn key_defs(&self) -> &[ColumnDef] {
        &self.keys
    }

    pub fn value_defs(&self) -> &[ColumnDef] {
        &self.values
    }

    /// Position of a value property within each extracted value tuple.
    pub fn value_index(&self, property: &str) -> Option<usize> {
        self.values.iter().position(|d| d.property == property)
    }

    /// Run one full pass over `rows`. Per-value problems are substituted or
    /// drop their row; they never fail the pass.
    pub fn process_data(&self, rows: &[Row]) -> ProcessedData {
        let extracted = self.extract(rows);

        let mut processed = if self.group_by_keys {
            ProcessedRows::Grouped(self.group(extracted))
        } else {
            ProcessedRows::Ungrouped(self.ungrouped(extracted))
        };

        if let (Some(total), ProcessedRows::Grouped(groups)) = (self.normalise_to, &mut processed) {
            self.normalise(groups, total);
        }

        let domain = self.domains(&processed);
        let reduced = self.reduce(&processed);

        let result = ProcessedData { data: processed, domain, reduced };
        debug!(rows = rows.len(), entries = result.len(), kind = result.kind(), "processed data");
        result
    }

    fn extract(&self, rows: &[Row]) -> Vec<Extracted> {
        let mut out = Vec::with_capacity(rows.len());
        for (datum, row) in rows.iter().enumerate() {
            let keys = self.keys.iter().map(|d| d.extract(row)).collect::<Option<Vec<_>>>();
            let values = self.values.iter().map(|d| d.extract(row)).collect::<Option<Vec<_>>>();
            match (keys, values) {
                (Some(keys), Some(values)) => out.push(Extracted { datum, keys, values }),
                _ => trace!(datum, "row dropped: invalid value without substitute"),
            }
        }
        out
    }

    fn row_sums(&self, values: &[Value]) -> Option<Vec<[f64; 2]>> {
        if self.sums.is_empty() {
            return None;
        }
        Some(self.sums.iter().map(|s| s.sum(values)).collect())
    }

    fn ungrouped(&self, extracted: Vec<Extracted>) -> Vec<UngroupedDatum> {
        extracted
            .into_iter()
            .map(|e| UngroupedDatum {
                sum_values: self.row_sums(&e.values),
                datum: e.datum,
                keys: e.keys,
                values: e.values,
            })
            .collect()
    }

    fn group(&self, extracted: Vec<Extracted>) -> Vec<GroupedDatum> {
        let mut groups: IndexMap<Vec<Value>, GroupedDatum> = IndexMap::new();
        for e in extracted {
            let keys = e.keys;
            let group = groups.entry(keys.clone()).or_insert_with(|| GroupedDatum {
                datums: Vec::new(),
                keys,
                values: Vec::new(),
                sum_values: None,
            });
            group.datums.push(e.datum);
            group.values.push(e.values);
        }

        let mut out: Vec<GroupedDatum> = groups.into_values().collect();
        if !self.sums.is_empty() {
            for group in &mut out {
                let sums = self
                    .sums
                    .iter()
                    .map(|s| {
                        group.values.iter().fold([0.0, 0.0], |[lo, hi], member| {
                            let [neg, pos] = s.sum(member);
                            [f64::min(lo, neg), f64::max(hi, pos)]
                        })
                    })
                    .collect();
                group.sum_values = Some(sums);
            }
        }
        out
    }

    /// Rescale each group so every sum definition totals `total`.
    fn normalise(&self, groups: &mut [GroupedDatum], total: f64) {
        for group in groups {
            let Some(sum_values) = group.sum_values.as_mut() else { continue };
            for (sum, pair) in self.sums.iter().zip(sum_values.iter_mut()) {
                let extent = pair[0].abs().max(pair[1]);
                if !(extent > 0.0 && extent.is_finite()) {
                    continue;
                }
                for member in &mut group.values {
                    for &i in &sum.indices {
                        if let Value::Number(n) = &mut member[i] {
                            *n = *n * total / extent;
                        }
                    }
                }
                pair[0] = pair[0] * total / extent;
                pair[1] = pair[1] * total / extent;
            }
        }
    }

    fn domains(&self, processed: &ProcessedRows) -> ProcessedDomain {
        let mut pass = DomainPass {
            keys: self.keys.iter().map(|d| DomainAccumulator::new(d.value_type)).collect(),
            values: self.values.iter().map(|d| DomainAccumulator::new(d.value_type)).collect(),
            sums: self.sums.iter().map(|_| SumExtent::default()).collect(),
        };

        match processed {
            ProcessedRows::Ungrouped(rows) => {
                for r in rows {
                    pass.visit(&r.keys, std::slice::from_ref(&r.values), r.sum_values.as_deref());
                }
            }
            ProcessedRows::Grouped(groups) => {
                for g in groups {
                    pass.visit(&g.keys, &g.values, g.sum_values.as_deref());
                }
            }
        }

        ProcessedDomain {
            keys: pass.keys.into_iter().map(DomainAccumulator::finish).collect(),
            values: pass.values.into_iter().map(DomainAccumulator::finish).collect(),
            sum_values: (!self.sums.is_empty())
                .then(|| pass.sums.iter().map(|s| s.get().map(|p| p.to_vec()).unwrap_or_default()).collect()),
        }
    }

    fn reduce(&self, processed: &ProcessedRows) -> Option<Reduced> {
        if self.reducers.is_empty() {
            return None;
        }

        let entries: Vec<(&[Value], Option<&Vec<[f64; 2]>>)> = match processed {
            ProcessedRows::Ungrouped(rows) => rows.iter().map(|r| (&r.keys[..], r.sum_values.as_ref())).collect(),
            ProcessedRows::Grouped(groups) => groups.iter().map(|g| (&g.keys[..], g.sum_values.as_ref())).collect(),
        };

        let mut reduced = Reduced::default();
        for reducer in &self.reducers {
            match reducer {
                ReducerDef::SmallestKeyInterval => {
                    reduced.smallest_key_interval =
                        smallest_interval(entries.iter().map(|(k, _)| k.first().and_then(Value::as_continuous)));
                }
                ReducerDef::SumValueExtent => {
                    let mut extent = SumExtent::seeded([0.0, 0.0]);
                    for pair in entries.iter().filter_map(|(_, s)| *s).flatten() {
                        extent.push(*pair);
                    }
                    reduced.sum_value_extent = extent.get();
                }
            }
        }
        Some(reduced)
    }
}

struct DomainPass {
    keys: Vec<DomainAccumulator>,
    values: Vec<DomainAccumulator>,
    sums: Vec<SumExtent>,
}

impl DomainPass {
    fn visit(&mut self, keys: &[Value], tuples: &[Vec<Value>], sums: Option<&[[f64; 2]]>) {
        for (acc, v) in self.keys.iter_mut().zip(keys) {
            acc.push(v);
        }
        for tuple in tuples {
            for (acc, v) in self.values.iter_mut().zip(tuple) {
                acc.push(v);
            }
        }
        for (acc, pair) in self.sums.iter_mut().zip(sums.unwrap_or_default()) {
            acc.push(*pair);
        }
    }
}

/// Smallest positive gap between consecutive keys, in processing order.
fn smallest_interval<I>(keys: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut prev: Option<f64> = None;
    let mut smallest: Option<f64> = None;
    for key in keys {
        if let (Some(a), Some(b)) = (prev, key) {
            let interval = (b - a).abs();
            if interval > 0.0 && interval.is_finite() && smallest.map_or(true, |s| interval < s) {
                smallest = Some(interval);
            }
        }
        prev = key;
    }
    smallest
}
