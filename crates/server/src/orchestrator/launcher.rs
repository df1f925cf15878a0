use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use tokio::process::Command as TokioCommand;
use tracing::info;

/// Everything the launcher needs to run one benchmark container.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub container_name: String,
    pub image: String,
    /// Directory name of the staged project under the uploads mount.
    pub project_dir_name: String,
    pub uploads_volume: String,
    pub project_id: String,
    pub runtime: String,
    pub metrics_api_url: String,
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the orchestrator and the container runtime, so the run state
/// machine is testable without docker.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(&self, spec: &LaunchSpec) -> io::Result<ProcessOutput>;
}

/// Derives the container name from the project id, restricted to a safe
/// character set. Runs are serialized, so reusing the name for repeated runs
/// of the same project cannot collide.
pub fn container_name(project_id: &str) -> String {
    let sanitized: String = project_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{sanitized}_container")
}

const UPLOADS_MOUNT: &str = "/app/dist/uploads";

/// Runs the benchmark image via `docker run`, with the staged project visible
/// through the uploads volume and the publisher environment injected.
pub struct DockerLauncher;

#[async_trait]
impl ProcessLauncher for DockerLauncher {
    async fn launch(&self, spec: &LaunchSpec) -> io::Result<ProcessOutput> {
        let mut command = TokioCommand::new("docker");
        command
            .arg("run")
            .arg("--rm")
            .args(["--name", &spec.container_name])
            .arg("--network")
            .arg("host")
            .arg("-v")
            .arg(format!("{}:{}", spec.uploads_volume, UPLOADS_MOUNT))
            .arg("-e")
            .arg(format!("PROJECT_ID={}", spec.project_id))
            .arg("-e")
            .arg(format!("RUNTIME={}", spec.runtime))
            .arg("-e")
            .arg(format!("METRICS_API_URL={}", spec.metrics_api_url))
            .arg(&spec.image)
            .arg("/bin/sh")
            .arg("-c")
            .arg(format!(
                "cd {UPLOADS_MOUNT}/{} && chmod +x run.sh && ./run.sh",
                spec.project_dir_name
            ));

        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        // A timed-out run drops this future; take the container down with it.
        command.kill_on_drop(true);

        info!(container = %spec.container_name, image = %spec.image, "Launching benchmark container.");

        let output = command.output().await?;
        Ok(ProcessOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
