use std::env;
use thiserror::Error;

pub const DEFAULT_METRICS_API_URL: &str = "http://localhost:5003/api/benchmarks";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),
}

/// Identity and transport settings for one recorder instance. The
/// orchestrator injects these into the benchmarked process as `PROJECT_ID`,
/// `RUNTIME` and `METRICS_API_URL`.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub project_id: String,
    pub runtime: String,
    pub metrics_api_url: String,
}

impl RecorderConfig {
    pub fn new(project_id: impl Into<String>, runtime: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            runtime: runtime.into(),
            metrics_api_url: DEFAULT_METRICS_API_URL.to_string(),
        }
    }

    pub fn with_metrics_api_url(mut self, url: impl Into<String>) -> Self {
        self.metrics_api_url = url.into();
        self
    }

    /// Fails fast when `PROJECT_ID` is absent or empty; a recorder without a
    /// project identity has nowhere meaningful to report to.
    pub fn from_env() -> Result<Self, ConfigError> {
        let project_id = env::var("PROJECT_ID")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnv("PROJECT_ID"))?;
        let runtime = env::var("RUNTIME").unwrap_or_else(|_| "unknown".to_string());
        let metrics_api_url =
            env::var("METRICS_API_URL").unwrap_or_else(|_| DEFAULT_METRICS_API_URL.to_string());
        Ok(Self {
            project_id,
            runtime,
            metrics_api_url,
        })
    }
}
