// File: crates/chart-data/src/extent.rs
// Summary: Numeric extents and the per-column domain accumulators used by the data model.

use indexmap::IndexSet;

use crate::property::ValueType;
use crate::value::Value;

/// `[min, max]` over the finite values, or `None` if there are none.
pub fn numeric_extent<I>(values: I) -> Option<[f64; 2]>
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some([v, v]),
        Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
    })
}

/// Make an extent usable as an axis domain: missing, non-finite or `[0, 0]` become `[0, 1]`.
pub fn fix_numeric_extent(extent: Option<[f64; 2]>) -> [f64; 2] {
    match extent {
        Some([lo, hi]) if lo.is_finite() && hi.is_finite() && !(lo == 0.0 && hi == 0.0) => [lo, hi],
        _ => [0.0, 1.0],
    }
}

/// Accumulates one column's domain across a pass.
#[derive(Debug)]
pub(crate) enum DomainAccumulator {
    Range(Option<(Value, Value)>),
    Category(IndexSet<Value>),
}

impl DomainAccumulator {
    pub(crate) fn new(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Range => DomainAccumulator::Range(None),
            ValueType::Category => DomainAccumulator::Category(IndexSet::new()),
        }
    }

    pub(crate) fn push(&mut self, v: &Value) {
        match self {
            DomainAccumulator::Range(extent) => {
                if !v.is_extent_candidate() {
                    return;
                }
                // Numbers and dates outrank text; text only survives in a column without them
                let restart = match extent {
                    None => true,
                    Some((lo, _)) => continuous(v) && !continuous(lo),
                };
                if restart {
                    *extent = Some((v.clone(), v.clone()));
                } else if let Some((lo, hi)) = extent {
                    if v.range_cmp(lo) == Some(std::cmp::Ordering::Less) {
                        *lo = v.clone();
                    }
                    if v.range_cmp(hi) == Some(std::cmp::Ordering::Greater) {
                        *hi = v.clone();
                    }
                }
            }
            DomainAccumulator::Category(seen) => {
                if !v.is_null() && !seen.contains(v) {
                    seen.insert(v.clone());
                }
            }
        }
    }

    /// `[]` or `[min, max]` for ranges; first-seen distinct values for categories.
    pub(crate) fn finish(self) -> Vec<Value> {
        match self {
            DomainAccumulator::Range(None) => Vec::new(),
            DomainAccumulator::Range(Some((lo, hi))) => vec![lo, hi],
            DomainAccumulator::Category(seen) => seen.into_iter().collect(),
        }
    }
}

fn continuous(v: &Value) -> bool {
    matches!(v, Value::Number(_) | Value::Date(_))
}

/// `[min, max]` accumulator for `[neg, pos]` sum pairs.
#[derive(Debug, Default)]
pub(crate) struct SumExtent(Option<[f64; 2]>);

impl SumExtent {
    pub(crate) fn seeded(seed: [f64; 2]) -> Self {
        Self(Some(seed))
    }

    pub(crate) fn push(&mut self, [neg, pos]: [f64; 2]) {
        self.0 = Some(match self.0 {
            None => [neg, pos],
            Some([lo, hi]) => [lo.min(neg), hi.max(pos)],
        });
    }

    pub(crate) fn get(&self) -> Option<[f64; 2]> {
        self.0
    }
}
