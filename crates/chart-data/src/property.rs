// File: crates/chart-data/src/property.rs
// Summary: Column, sum and reducer descriptors that configure a DataModel, plus stock validators.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::value::Value;

/// Predicate deciding whether an extracted value is valid for its column.
pub type Validation = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Key,
    Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Continuous; the domain is `[min, max]`.
    Range,
    /// Discrete; the domain is the ordered set of distinct values.
    Category,
}

/// One directly extracted column.
///
/// `missing_value` replaces an absent property and is not validated.
/// `invalid_value` replaces a value failing `validation`; when it is not
/// configured the whole row is left out of the pass instead.
#[derive(Clone)]
pub struct ColumnDef {
    pub property: String,
    pub kind: PropertyKind,
    pub value_type: ValueType,
    pub validation: Option<Validation>,
    pub missing_value: Option<Value>,
    pub invalid_value: Option<Value>,
}

impl ColumnDef {
    pub fn key(property: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(property, PropertyKind::Key, value_type)
    }

    pub fn value(property: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(property, PropertyKind::Value, value_type)
    }

    fn new(property: impl Into<String>, kind: PropertyKind, value_type: ValueType) -> Self {
        Self {
            property: property.into(),
            kind,
            value_type,
            validation: None,
            missing_value: None,
            invalid_value: None,
        }
    }

    pub fn with_validation<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validation = Some(Arc::new(f));
        self
    }

    pub fn with_missing_value(mut self, v: impl Into<Value>) -> Self {
        self.missing_value = Some(v.into());
        self
    }

    pub fn with_invalid_value(mut self, v: impl Into<Value>) -> Self {
        self.invalid_value = Some(v.into());
        self
    }

    /// Extract this column from `row`; `None` means the row must be dropped.
    pub(crate) fn extract(&self, row: &crate::Row) -> Option<Value> {
        let value = match row.get(&self.property) {
            Some(v) => v,
            None => match &self.missing_value {
                Some(m) => return Some(m.clone()),
                None => &Value::Null,
            },
        };
        match &self.validation {
            Some(valid) if !valid(value) => self.invalid_value.clone(),
            _ => Some(value.clone()),
        }
    }
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("property", &self.property)
            .field("kind", &self.kind)
            .field("value_type", &self.value_type)
            .field("validation", &self.validation.as_ref().map(|_| "<fn>"))
            .field("missing_value", &self.missing_value)
            .field("invalid_value", &self.invalid_value)
            .finish()
    }
}

/// Derived column adding the named value properties of each row/member.
#[derive(Clone, Debug, PartialEq)]
pub struct SumDef {
    pub properties: Vec<String>,
}

impl SumDef {
    pub fn new<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { properties: properties.into_iter().map(Into::into).collect() }
    }
}

/// Whole-pass reductions over the processed rows/groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReducerDef {
    /// Smallest positive gap between consecutive first keys.
    SmallestKeyInterval,
    /// `[min, max]` over every sum pair, seeded with `[0, 0]`.
    SumValueExtent,
}

impl ReducerDef {
    pub fn name(self) -> &'static str {
        match self {
            ReducerDef::SmallestKeyInterval => "smallestKeyInterval",
            ReducerDef::SumValueExtent => "sumValueExtent",
        }
    }
}

#[derive(Clone, Debug)]
pub enum PropertyDef {
    Column(ColumnDef),
    Sum(SumDef),
    Reducer(ReducerDef),
}

impl From<ColumnDef> for PropertyDef {
    fn from(d: ColumnDef) -> Self {
        PropertyDef::Column(d)
    }
}

impl From<SumDef> for PropertyDef {
    fn from(d: SumDef) -> Self {
        PropertyDef::Sum(d)
    }
}

impl From<ReducerDef> for PropertyDef {
    fn from(d: ReducerDef) -> Self {
        PropertyDef::Reducer(d)
    }
}

/// Configuration of a [`crate::DataModel`].
#[derive(Clone, Debug, Default)]
pub struct DataModelOptions {
    pub props: Vec<PropertyDef>,
    pub group_by_keys: bool,
    pub normalise_to: Option<f64>,
}

impl DataModelOptions {
    pub fn new<I, P>(props: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PropertyDef>,
    {
        Self { props: props.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    pub fn group_by_keys(mut self, on: bool) -> Self {
        self.group_by_keys = on;
        self
    }

    pub fn normalise_to(mut self, total: f64) -> Self {
        self.normalise_to = Some(total);
        self
    }
}

/// Stock validation predicates.
pub mod validation {
    use crate::value::Value;

    /// Finite number.
    pub fn is_number(v: &Value) -> bool {
        v.as_finite_number().is_some()
    }

    pub fn is_date(v: &Value) -> bool {
        matches!(v, Value::Date(_))
    }

    /// Finite number or date; the usual check for a continuous x key.
    pub fn is_continuous(v: &Value) -> bool {
        is_number(v) || is_date(v)
    }

    pub fn is_string(v: &Value) -> bool {
        matches!(v, Value::String(_))
    }

    pub fn is_defined(v: &Value) -> bool {
        !v.is_null()
    }
}
