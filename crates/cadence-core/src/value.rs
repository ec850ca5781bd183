use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CadenceError;

/// Attribute map for one table row or keyed-table entry.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// The value of a computed metric, tagged by shape.
///
/// Every metric declares its shape at compile time instead of formatters
/// branching on runtime classes: a scalar headline number, an ordered list
/// of rows, a mapping from key to attributes, or a bucket histogram.
///
/// # Examples
///
/// ```
/// use cadence_core::MetricValue;
///
/// let value = MetricValue::Scalar(3.5);
/// assert!(!value.is_empty());
///
/// let empty = MetricValue::Table(vec![]);
/// assert!(empty.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum MetricValue {
    /// A single headline number.
    Scalar(f64),
    /// An ordered list of rows, each an attribute map.
    Table(Vec<Attributes>),
    /// A mapping from key (file path, bucket group) to attributes.
    KeyedTable(BTreeMap<String, Attributes>),
    /// A mapping from bucket name to count.
    Distribution(BTreeMap<String, u64>),
}

impl MetricValue {
    /// Build a [`MetricValue::Table`] by serializing typed rows in order.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::Serialization`] if a row does not serialize
    /// to a JSON object.
    ///
    /// # Examples
    ///
    /// ```
    /// use cadence_core::MetricValue;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// #[serde(rename_all = "camelCase")]
    /// struct Row { file: String, total_churn: u64 }
    ///
    /// let rows = vec![Row { file: "a.rs".into(), total_churn: 7 }];
    /// let value = MetricValue::table(&rows).unwrap();
    /// assert!(matches!(value, MetricValue::Table(ref t) if t.len() == 1));
    /// ```
    pub fn table<T: Serialize>(rows: &[T]) -> Result<Self, CadenceError> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(to_attributes(row)?);
        }
        Ok(MetricValue::Table(out))
    }

    /// Build a [`MetricValue::KeyedTable`] by serializing typed entries.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::Serialization`] if an entry does not
    /// serialize to a JSON object.
    pub fn keyed_table<T: Serialize>(
        entries: &BTreeMap<String, T>,
    ) -> Result<Self, CadenceError> {
        let mut out = BTreeMap::new();
        for (key, entry) in entries {
            out.insert(key.clone(), to_attributes(entry)?);
        }
        Ok(MetricValue::KeyedTable(out))
    }

    /// Whether this value carries no data points.
    ///
    /// Scalars are never considered empty; the empty-input contract pairs
    /// them with `data_points = 0` in metadata instead.
    pub fn is_empty(&self) -> bool {
        match self {
            MetricValue::Scalar(_) => false,
            MetricValue::Table(rows) => rows.is_empty(),
            MetricValue::KeyedTable(entries) => entries.is_empty(),
            MetricValue::Distribution(buckets) => buckets.is_empty(),
        }
    }
}

fn to_attributes<T: Serialize>(item: &T) -> Result<Attributes, CadenceError> {
    match serde_json::to_value(item)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(CadenceError::Serialization(serde::ser::Error::custom(
            format!("expected a JSON object, got {other}"),
        ))),
    }
}
