use crate::model::BenchmarkResult;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Rejected by ingestion endpoint: {0}")]
    Rejected(String),
    #[error("Store error: {0}")]
    Store(String),
}

/// Destination for a finalized benchmark document. The recorder is generic
/// over this seam, so the HTTP transport and the direct store write are
/// interchangeable per deployment.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn submit(&self, result: &BenchmarkResult) -> Result<(), SinkError>;
}
