use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use zip::ZipArchive;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Failed to open project archive: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to extract project archive: {0}")]
    Archive(String),
    #[error("Extraction task was aborted")]
    Aborted,
}

/// Unpacks the project archive into `extract_dir` unless a staged copy is
/// already present. The archive itself is never touched; only the extracted
/// copy is subject to later cleanup.
pub async fn stage_project(archive_path: &Path, extract_dir: &Path) -> Result<(), StagingError> {
    if extract_dir.exists() {
        info!(dir = %extract_dir.display(), "Staged project directory already exists, skipping extraction.");
        return Ok(());
    }

    let archive_path: PathBuf = archive_path.to_path_buf();
    let extract_dir: PathBuf = extract_dir.to_path_buf();

    // ZipArchive is synchronous; keep the extraction off the runtime workers.
    tokio::task::spawn_blocking(move || -> Result<(), StagingError> {
        let file = File::open(&archive_path)?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| StagingError::Archive(e.to_string()))?;
        archive
            .extract(&extract_dir)
            .map_err(|e| StagingError::Archive(e.to_string()))?;
        info!(
            archive = %archive_path.display(),
            dir = %extract_dir.display(),
            "Project archive extracted."
        );
        Ok(())
    })
    .await
    .map_err(|_| StagingError::Aborted)?
}

/// Recursively removes the staged directory. "Already gone" is fine; any
/// other failure is logged and otherwise ignored, since cleanup is
/// best-effort and must never mask the run's own outcome.
pub async fn remove_staged(extract_dir: &Path) {
    match tokio::fs::remove_dir_all(extract_dir).await {
        Ok(()) => info!(dir = %extract_dir.display(), "Removed staged project files."),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            dir = %extract_dir.display(),
            error = %e,
            "Failed to remove staged project files."
        ),
    }
}
