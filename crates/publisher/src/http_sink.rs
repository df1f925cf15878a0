use async_trait::async_trait;
use benchforge_common::{BenchmarkResult, ResultSink, SinkError};
use once_cell::sync::Lazy;
use reqwest::StatusCode;

use crate::config::RecorderConfig;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// HTTP transport: POSTs the document to the ingestion endpoint, which
/// answers 201 on persist.
#[derive(Debug, Clone)]
pub struct HttpSink {
    endpoint: String,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &RecorderConfig) -> Self {
        Self::new(config.metrics_api_url.clone())
    }
}

#[async_trait]
impl ResultSink for HttpSink {
    async fn submit(&self, result: &BenchmarkResult) -> Result<(), SinkError> {
        let response = HTTP_CLIENT
            .post(&self.endpoint)
            .json(result)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        if response.status() == StatusCode::CREATED {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Rejected(format!("{status}: {body}")))
    }
}
