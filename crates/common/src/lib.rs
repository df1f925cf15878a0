pub mod model;
pub mod sink;

pub use model::{BenchmarkResult, Field, ModelError, ScalarValue, TimeseriesField};
pub use sink::{ResultSink, SinkError};
