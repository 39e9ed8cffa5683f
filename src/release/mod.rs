// Release module - Backup and rebuild steps of a version change

pub mod archive;

use crate::config::Config;
use crate::error::{Result, WardenError};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// External side effects of the version-update protocol
///
/// The supervision loop only talks to this trait, so tests can substitute a
/// fake that never touches the filesystem or spawns a build.
#[async_trait]
pub trait ReleaseExecutor: Send + Sync {
    /// Snapshot the project tree, tagged with the version being replaced
    async fn create_backup(&self, version: &str) -> Result<PathBuf>;

    /// Rebuild the served artifact
    ///
    /// Dropping the returned future must abandon the build.
    async fn rebuild(&self) -> Result<()>;
}

/// Production executor: tar+gzip backups and a shell build command
#[derive(Debug, Clone)]
pub struct ShellReleaseExecutor {
    project_dir: PathBuf,
    backup_dir: PathBuf,
    excludes: Vec<String>,
    build_command: String,
}

impl ShellReleaseExecutor {
    pub fn new(
        project_dir: PathBuf,
        backup_dir: PathBuf,
        excludes: Vec<String>,
        build_command: String,
    ) -> Self {
        Self {
            project_dir,
            backup_dir,
            excludes,
            build_command,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.project_dir.clone(),
            config.backup_dir(),
            config.files.backup_excludes.clone(),
            config.commands.build.clone(),
        )
    }
}

#[async_trait]
impl ReleaseExecutor for ShellReleaseExecutor {
    async fn create_backup(&self, version: &str) -> Result<PathBuf> {
        let source = self.project_dir.clone();
        let backup_dir = self.backup_dir.clone();
        let excludes = self.excludes.clone();
        let version = version.to_string();

        tokio::task::spawn_blocking(move || {
            archive::create_backup(&source, &backup_dir, &excludes, &version)
        })
        .await
        .map_err(|e| WardenError::BackupError(format!("Backup task failed: {}", e)))?
    }

    async fn rebuild(&self) -> Result<()> {
        if self.build_command.trim().is_empty() {
            tracing::info!("No build command configured, skipping rebuild");
            return Ok(());
        }

        tracing::info!(command = %self.build_command, "Rebuilding application");

        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.build_command)
            .current_dir(&self.project_dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| WardenError::RebuildError(format!("Failed to run build: {}", e)))?;

        if output.status.success() {
            tracing::info!("Rebuild finished successfully");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(WardenError::RebuildError(format!(
                "'{}' exited with {}: {}",
                self.build_command,
                output.status,
                stderr.trim()
            )))
        }
    }
}
