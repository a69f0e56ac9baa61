// File: crates/chart-data/src/value.rs
// Summary: Tagged row values, row maps, and the equality/ordering rules used by grouping and extents.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// One input row: property name to value. An absent property is "undefined".
pub type Row = IndexMap<String, Value>;

/// A single cell of an input row.
///
/// Equality is structural: numbers compare by value with every NaN equal to
/// every other NaN and `-0.0 == 0.0`, dates compare by instant. This is the
/// equality used to group rows by key, so `Value` is also `Eq + Hash`.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `Some(n)` for a finite number.
    pub fn as_finite_number(&self) -> Option<f64> {
        match *self {
            Value::Number(n) if n.is_finite() => Some(n),
            _ => None,
        }
    }

    /// Numeric view used for interval arithmetic: numbers as-is, dates as epoch milliseconds.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Date(d) => Some(d.timestamp_millis() as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value may take part in a `[min, max]` extent.
    pub(crate) fn is_extent_candidate(&self) -> bool {
        match self {
            Value::Number(n) => n.is_finite(),
            Value::String(_) | Value::Date(_) => true,
            Value::Null => false,
        }
    }

    /// Ordering within a single variant; `None` across variants or for NaN.
    pub fn range_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Infer a value from raw text (CSV cells): empty is null, then number, then RFC 3339 date.
    pub fn infer(raw: &str) -> Value {
        let s = raw.trim();
        if s.is_empty() {
            return Value::Null;
        }
        if let Ok(n) = s.parse::<f64>() {
            return Value::Number(n);
        }
        if let Ok(d) = DateTime::parse_from_rfc3339(s) {
            return Value::Date(d.with_timezone(&Utc));
        }
        Value::String(s.to_string())
    }

    fn number_bits(n: f64) -> u64 {
        if n.is_nan() {
            f64::NAN.to_bits()
        } else if n == 0.0 {
            0
        } else {
            n.to_bits()
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Value::number_bits(*a) == Value::number_bits(*b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Number(n) => Value::number_bits(*n).hash(state),
            Value::String(s) => s.hash(state),
            Value::Date(d) => d.timestamp_nanos_opt().unwrap_or(d.timestamp_millis()).hash(state),
            Value::Null => {}
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Build a [`Row`] from `"property" => value` pairs.
///
/// ```
/// use chart_data::{row, Value};
/// let r = row! { "kp" => 2, "vp1" => 5.5, "label" => "Q1" };
/// assert_eq!(r.get("kp"), Some(&Value::Number(2.0)));
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::Row::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $( row.insert(::std::string::String::from($key), $crate::Value::from($value)); )+
        row
    }};
}
