//! One-shot state backup.
//!
//! Before any import is attempted the raw state (as returned by
//! `terraform state pull`) can be written to a uniquely named file, so an
//! operator can restore it if an import goes wrong.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, StateError, TfBulkError};

/// Extension of backup files.
const BACKUP_EXTENSION: &str = "json";

/// Writes state backups into a directory.
#[derive(Debug, Clone)]
pub struct StateBackup {
    /// Directory receiving backup files.
    dir: PathBuf,
}

impl StateBackup {
    /// Creates a backup writer for `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Generates a fresh, unique backup path inside the directory.
    #[must_use]
    pub fn next_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{BACKUP_EXTENSION}", Uuid::new_v4()))
    }

    /// Writes `state` to a new backup file and returns its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub async fn write(&self, state: &str) -> Result<PathBuf> {
        let path = self.next_path();

        if !self.dir.exists() {
            debug!("Creating backup directory: {}", self.dir.display());
            fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| backup_failed(&path, "create directory", &e))?;
        }

        // `create_new` guards against clobbering an existing file.
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| backup_failed(&path, "create file", &e))?;

        let written: std::result::Result<(), (&'static str, std::io::Error)> = async {
            file.write_all(state.as_bytes())
                .await
                .map_err(|e| ("write file", e))?;
            file.sync_all().await.map_err(|e| ("sync file", e))
        }
        .await;
        drop(file);
        keep_or_discard(&path, written).await?;

        info!("Saved state backup file to: {}", path.display());
        Ok(path)
    }
}

/// Removes the partly written file at `path` if writing it failed.
async fn keep_or_discard(
    path: &Path,
    written: std::result::Result<(), (&'static str, std::io::Error)>,
) -> Result<()> {
    let Err((step, err)) = written else {
        return Ok(());
    };

    if let Err(e) = fs::remove_file(path).await {
        warn!("Failed to remove partial backup {}: {}", path.display(), e);
    }
    Err(backup_failed(path, step, &err))
}

fn backup_failed(path: &Path, step: &str, err: &std::io::Error) -> TfBulkError {
    TfBulkError::State(StateError::BackupFailed {
        path: path.to_path_buf(),
        message: format!("failed to {step}: {err}"),
    })
}
