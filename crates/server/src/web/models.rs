use benchforge_common::{BenchmarkResult, Field, TimeseriesField};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ingestion request body. Mirrors the wire document, except the fields the
/// server may fill in itself stay optional so their absence can be answered
/// with a clear 400 (or a server-side default) instead of a blunt
/// deserialization failure.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IngestBenchmarkRequest {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub fields: HashMap<String, Field>,
    #[serde(default)]
    pub timeseries_fields: HashMap<String, TimeseriesField>,
}

#[derive(Deserialize, Debug)]
pub struct BenchmarkListQuery {
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
}

/// Run request: `{ "id": "<projectId>" }`.
#[derive(Deserialize, Debug)]
pub struct RunContainerRequest {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct RunContainerResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<BenchmarkResult>,
}
