use benchforge_common::{
    BenchmarkResult, Field, ModelError, ResultSink, ScalarValue, SinkError, TimeseriesField,
};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{error, info};

use crate::config::{ConfigError, RecorderConfig};

/// Per-process benchmark recorder. One instance captures a single timestamp
/// at construction; every field recorded through it shares that timestamp.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    config: RecorderConfig,
    timestamp_ms: i64,
    fields: HashMap<String, Field>,
    timeseries_fields: HashMap<String, TimeseriesField>,
}

impl MetricsRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            timestamp_ms: Utc::now().timestamp_millis(),
            fields: HashMap::new(),
            timeseries_fields: HashMap::new(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(RecorderConfig::from_env()?))
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    /// Stores or overwrites a named scalar field. No I/O happens here.
    pub fn add_field(
        &mut self,
        name: &str,
        value: impl Into<ScalarValue>,
        unit: &str,
    ) -> Result<(), ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyFieldName);
        }
        self.fields.insert(
            name.to_string(),
            Field {
                value: value.into(),
                unit: unit.to_string(),
            },
        );
        Ok(())
    }

    /// Stores or overwrites a named time series. A length mismatch between
    /// `values` and `timestamps` fails before anything is written.
    pub fn add_timeseries_field(
        &mut self,
        name: &str,
        values: Vec<f64>,
        timestamps: Vec<i64>,
        unit: &str,
    ) -> Result<(), ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyFieldName);
        }
        let series = TimeseriesField::new(values, timestamps, unit)?;
        self.timeseries_fields.insert(name.to_string(), series);
        Ok(())
    }

    /// The document as it would be transmitted right now.
    pub fn snapshot(&self) -> BenchmarkResult {
        BenchmarkResult {
            id: None,
            project_id: self.config.project_id.clone(),
            runtime: self.config.runtime.clone(),
            timestamp_ms: self.timestamp_ms,
            fields: self.fields.clone(),
            timeseries_fields: self.timeseries_fields.clone(),
        }
    }

    /// Transmits the accumulated document through the given sink. Delivery is
    /// at most once: a transport failure is logged and swallowed so the
    /// benchmarked process never crashes because reporting failed. Calling
    /// this twice submits two documents.
    pub async fn save_results<S: ResultSink + ?Sized>(&self, sink: &S) {
        match self.save_results_strict(sink).await {
            Ok(()) => info!(
                project_id = %self.config.project_id,
                timestamp = self.timestamp_ms,
                "Benchmark results saved."
            ),
            Err(e) => error!(
                project_id = %self.config.project_id,
                error = %e,
                "Failed to save benchmark results."
            ),
        }
    }

    /// Like [`save_results`](Self::save_results), but propagates the sink
    /// error. Used where the caller must know the write failed, e.g. the
    /// orchestrator's own fallback-result write.
    pub async fn save_results_strict<S: ResultSink + ?Sized>(
        &self,
        sink: &S,
    ) -> Result<(), SinkError> {
        sink.submit(&self.snapshot()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        submitted: Mutex<Vec<BenchmarkResult>>,
    }

    #[async_trait]
    impl ResultSink for RecordingSink {
        async fn submit(&self, result: &BenchmarkResult) -> Result<(), SinkError> {
            self.submitted.lock().unwrap().push(result.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl ResultSink for FailingSink {
        async fn submit(&self, _result: &BenchmarkResult) -> Result<(), SinkError> {
            Err(SinkError::Transport("connection refused".to_string()))
        }
    }

    fn recorder() -> MetricsRecorder {
        MetricsRecorder::new(RecorderConfig::new("p1", "node20"))
    }

    #[test]
    fn all_fields_share_the_construction_timestamp() {
        let mut rec = recorder();
        let created_at = rec.timestamp_ms();
        rec.add_field("execution_time", 2.0, "seconds").unwrap();
        rec.add_timeseries_field("cpu_usage", vec![25.0, 35.0], vec![1, 2], "%")
            .unwrap();

        let result = rec.snapshot();
        assert_eq!(result.timestamp_ms, created_at);
    }

    #[test]
    fn mismatched_timeseries_leaves_previous_state_untouched() {
        let mut rec = recorder();
        rec.add_field("test_status", "started", "").unwrap();
        rec.add_timeseries_field("cpu_usage", vec![25.0], vec![1], "%")
            .unwrap();

        let err = rec
            .add_timeseries_field("cpu_usage", vec![1.0, 2.0], vec![1], "%")
            .unwrap_err();
        assert!(matches!(err, ModelError::TimeseriesLengthMismatch { .. }));

        let result = rec.snapshot();
        assert_eq!(result.fields.len(), 1);
        assert_eq!(result.timeseries_fields["cpu_usage"].values, vec![25.0]);
    }

    #[test]
    fn adding_a_field_twice_keeps_the_last_value() {
        let mut rec = recorder();
        rec.add_field("ram_usage", 100.0, "MB").unwrap();
        rec.add_field("ram_usage", 250.0, "MB").unwrap();

        let result = rec.snapshot();
        assert_eq!(
            result.fields["ram_usage"].value,
            ScalarValue::Number(250.0)
        );
    }

    #[test]
    fn empty_field_name_is_rejected() {
        let mut rec = recorder();
        assert_eq!(
            rec.add_field("", 1.0, "").unwrap_err(),
            ModelError::EmptyFieldName
        );
    }

    #[tokio::test]
    async fn saving_twice_produces_two_documents() {
        let mut rec = recorder();
        rec.add_field("execution_time", 2.0, "seconds").unwrap();

        let sink = RecordingSink::default();
        rec.save_results(&sink).await;
        rec.save_results(&sink).await;

        let submitted = sink.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[0], submitted[1]);
        assert_eq!(submitted[0].project_id, "p1");
        assert_eq!(submitted[0].runtime, "node20");
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed_but_strict_propagates() {
        let rec = recorder();
        // Lenient path must not fail the caller.
        rec.save_results(&FailingSink).await;

        let err = rec.save_results_strict(&FailingSink).await.unwrap_err();
        assert!(matches!(err, SinkError::Transport(_)));
    }
}
