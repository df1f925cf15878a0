use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("Field name must not be empty")]
    EmptyFieldName,
    #[error("Number of values ({values}) and timestamps ({timestamps}) must match")]
    TimeseriesLengthMismatch { values: usize, timestamps: usize },
}

/// Scalar payload of a benchmark field. Publishers record whatever their
/// benchmark produces, so numbers, free-form text and booleans are all legal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Number(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Number(value as f64)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Field {
    pub value: ScalarValue,
    #[serde(default)]
    pub unit: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimeseriesField {
    pub values: Vec<f64>,
    pub timestamps: Vec<i64>,
    #[serde(default)]
    pub unit: String,
}

impl TimeseriesField {
    /// Builds a time series, rejecting mismatched value/timestamp lengths
    /// before anything is stored.
    pub fn new(
        values: Vec<f64>,
        timestamps: Vec<i64>,
        unit: impl Into<String>,
    ) -> Result<Self, ModelError> {
        if values.len() != timestamps.len() {
            return Err(ModelError::TimeseriesLengthMismatch {
                values: values.len(),
                timestamps: timestamps.len(),
            });
        }
        Ok(Self {
            values,
            timestamps,
            unit: unit.into(),
        })
    }
}

/// One persisted benchmark run. `id` is assigned by the store at insert time;
/// publishers always transmit it as `None`. Once stored the document is
/// immutable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub project_id: String,
    pub runtime: String,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    #[serde(default)]
    pub fields: HashMap<String, Field>,
    #[serde(default)]
    pub timeseries_fields: HashMap<String, TimeseriesField>,
}
