//! In-process recorder for benchmarked projects. A project constructs a
//! [`MetricsRecorder`] (usually from the environment the orchestrator
//! injected), accumulates scalar and time-series fields while it runs, and
//! finally ships one result document through a [`benchforge_common::ResultSink`].

pub mod config;
pub mod http_sink;
pub mod recorder;

pub use config::{ConfigError, RecorderConfig};
pub use http_sink::HttpSink;
pub use recorder::MetricsRecorder;
