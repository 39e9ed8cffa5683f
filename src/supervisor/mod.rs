// Supervisor module - Health-driven restarts and version updates for the child

pub mod policy;

pub use policy::{HealthState, Verdict};

use crate::config::Config;
use crate::error::Result;
use crate::health::HealthProbe;
use crate::process::ProcessController;
use crate::release::{ReleaseExecutor, ShellReleaseExecutor};
use crate::version::VersionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What happened during a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub healthy: bool,
    pub restarted: bool,
    pub version_updated: bool,
}

/// The control loop around the single supervised child
///
/// Ticks are strictly sequential: probe, failure accounting, version check,
/// then an interruptible sleep.
pub struct Supervisor {
    probe: HealthProbe,
    controller: ProcessController,
    store: VersionStore,
    executor: Arc<dyn ReleaseExecutor>,
    health: HealthState,
    current_version: String,
    failure_threshold: u32,
    poll_interval: Duration,
}

impl Supervisor {
    pub fn new(
        probe: HealthProbe,
        controller: ProcessController,
        store: VersionStore,
        executor: Arc<dyn ReleaseExecutor>,
        failure_threshold: u32,
        poll_interval: Duration,
    ) -> Self {
        // The metadata file reflects the last applied version; a version file
        // written while the loop was down shows up as drift on the first tick.
        let current_version = store.metadata_version();

        Self {
            probe,
            controller,
            store,
            executor,
            health: HealthState::new(),
            current_version,
            failure_threshold,
            poll_interval,
        }
    }

    /// Build every component from the resolved configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            HealthProbe::from_config(config)?,
            ProcessController::from_config(config),
            VersionStore::from_config(config),
            Arc::new(ShellReleaseExecutor::from_config(config)),
            config.supervision.failure_threshold,
            config.poll_interval(),
        ))
    }

    pub fn health(&self) -> &HealthState {
        &self.health
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    pub fn controller(&self) -> &ProcessController {
        &self.controller
    }

    /// Run until `cancel` fires, then stop the child exactly once
    ///
    /// Cancellation interrupts the sleep between ticks, and inside a tick the
    /// rebuild and the restart settle delay.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        info!(
            version = %self.current_version,
            url = %self.probe.url(),
            "Starting supervisor (poll interval: {:?})",
            self.poll_interval
        );

        if let Err(e) = self.controller.start().await {
            error!("Failed to start child process: {}", e);
        }

        while !cancel.is_cancelled() {
            let outcome = self.tick(&cancel).await;
            debug!(?outcome, "Tick finished");

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!("Shutdown requested, stopping child process");
        self.shutdown().await;

        info!("Supervisor stopped");
        Ok(())
    }

    /// Best-effort stop of the child
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.controller.stop().await {
            error!("Failed to stop child process during shutdown: {}", e);
        }
    }

    /// One probe, failure-accounting and version-check cycle
    pub async fn tick(&mut self, cancel: &CancellationToken) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        let status = self.probe.check().await;
        outcome.healthy = status.is_healthy();

        match self.health.record(outcome.healthy, self.failure_threshold) {
            Verdict::Healthy => debug!("Health check passed: {}", status),
            Verdict::Degraded(failures) => warn!(
                "Health check failed ({}/{}): {}",
                failures, self.failure_threshold, status
            ),
            Verdict::Restart => {
                warn!(
                    "Health check failed {} times in a row, restarting child",
                    self.failure_threshold
                );
                outcome.restarted = self.restart_child(cancel).await;
            }
        }

        if cancel.is_cancelled() {
            return outcome;
        }

        match self.store.read_persisted() {
            Ok(persisted) if persisted != self.current_version => {
                outcome.version_updated = self.apply_version_update(&persisted, cancel).await;
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to read version file: {}", e),
        }

        outcome
    }

    /// Bring every version copy to `new_version`, rebuild and restart
    ///
    /// Returns false when the backup fails; nothing has been modified then
    /// and the next tick detects the same drift again.
    async fn apply_version_update(
        &mut self,
        new_version: &str,
        cancel: &CancellationToken,
    ) -> bool {
        let old_version = self.current_version.clone();
        info!("Version change detected: {} -> {}", old_version, new_version);

        match self.executor.create_backup(&old_version).await {
            Ok(path) => info!("Backup created: {}", path.display()),
            Err(e) => {
                error!("Aborting version update, backup failed: {}", e);
                return false;
            }
        }

        if let Err(e) = self.store.sync_metadata(new_version) {
            error!("Failed to update metadata version: {}", e);
        }
        if let Err(e) = self.store.write_persisted(new_version) {
            error!("Failed to write version file: {}", e);
        }
        match self.store.sync_environment(new_version) {
            Ok(true) => {}
            Ok(false) => debug!("No environment file, skipping version sync"),
            Err(e) => error!("Failed to update environment file: {}", e),
        }

        self.current_version = new_version.to_string();

        tokio::select! {
            _ = cancel.cancelled() => {
                warn!("Shutdown requested during rebuild, skipping restart");
                return true;
            }
            result = self.executor.rebuild() => {
                if let Err(e) = result {
                    error!("Rebuild failed, restarting with previous build: {}", e);
                }
            }
        }

        self.restart_child(cancel).await;

        info!("Version updated to {}", new_version);
        true
    }

    /// Restart the child and reset the failure accounting
    ///
    /// Returns false when shutdown interrupted the restart before the new
    /// child was launched.
    async fn restart_child(&mut self, cancel: &CancellationToken) -> bool {
        let restarted = match self.controller.restart(cancel).await {
            Ok(Some(_)) => true,
            Ok(None) => {
                info!("Restart interrupted by shutdown");
                return false;
            }
            Err(e) => {
                error!("Restart failed: {}", e);
                true
            }
        };

        self.health.record_restart();
        restarted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WardenError;
    use crate::process::SpawnOptions;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReleaseExecutor for RecordingExecutor {
        async fn create_backup(&self, version: &str) -> Result<PathBuf> {
            self.calls.lock().unwrap().push(format!("backup {}", version));
            Ok(PathBuf::from(format!("backup_{}.tar.gz", version)))
        }

        async fn rebuild(&self) -> Result<()> {
            self.calls.lock().unwrap().push("rebuild".to_string());
            Err(WardenError::RebuildError("no build tool".to_string()))
        }
    }

    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn supervisor(dir: &TempDir, executor: Arc<dyn ReleaseExecutor>) -> Supervisor {
        let root = dir.path();
        let probe =
            HealthProbe::new("127.0.0.1", closed_port(), Duration::from_millis(500)).unwrap();
        let controller = ProcessController::new(
            SpawnOptions {
                command: "exec sleep 30".to_string(),
                cwd: root.to_path_buf(),
                log_dir: None,
            },
            Duration::from_secs(2),
            Duration::from_millis(0),
        );
        let store = VersionStore::new(
            root.join(".version"),
            root.join("package.json"),
            root.join(".env"),
            "REACT_APP_VERSION",
        );

        Supervisor::new(
            probe,
            controller,
            store,
            executor,
            3,
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_initial_version_from_metadata() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"version": "4.5.6"}"#).unwrap();

        let supervisor = supervisor(&dir, Arc::new(RecordingExecutor::default()));

        assert_eq!(supervisor.current_version(), "4.5.6");
    }

    #[tokio::test]
    async fn test_unhealthy_ticks_restart_once() {
        let dir = TempDir::new().unwrap();
        let mut supervisor = supervisor(&dir, Arc::new(RecordingExecutor::default()));
        let cancel = CancellationToken::new();

        let first = supervisor.tick(&cancel).await;
        let second = supervisor.tick(&cancel).await;
        assert!(!first.healthy && !first.restarted);
        assert!(!second.restarted);
        assert_eq!(supervisor.health().consecutive_failures, 2);

        let third = supervisor.tick(&cancel).await;
        assert!(third.restarted);
        assert_eq!(supervisor.health().consecutive_failures, 0);
        assert_eq!(supervisor.controller().restart_count(), 1);

        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn test_version_drift_runs_update() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".version"), "1.0.0").unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"version": "1.0.0"}"#).unwrap();

        let executor = Arc::new(RecordingExecutor::default());
        let mut supervisor = supervisor(&dir, executor.clone());
        let cancel = CancellationToken::new();
        assert_eq!(supervisor.current_version(), "1.0.0");

        std::fs::write(dir.path().join(".version"), "1.2.3").unwrap();
        let outcome = supervisor.tick(&cancel).await;

        assert!(outcome.version_updated);
        assert_eq!(supervisor.current_version(), "1.2.3");
        assert_eq!(
            *executor.calls.lock().unwrap(),
            vec!["backup 1.0.0".to_string(), "rebuild".to_string()]
        );
        assert_eq!(supervisor.controller().restart_count(), 1);

        let second = supervisor.tick(&cancel).await;
        assert!(!second.version_updated);

        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn test_version_requested_while_stopped_applied_on_first_tick() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"version": "1.0.0"}"#).unwrap();
        std::fs::write(dir.path().join(".version"), "2.0.0").unwrap();

        let executor = Arc::new(RecordingExecutor::default());
        let mut supervisor = supervisor(&dir, executor.clone());
        assert_eq!(supervisor.current_version(), "1.0.0");

        let outcome = supervisor.tick(&CancellationToken::new()).await;

        assert!(outcome.version_updated);
        assert_eq!(supervisor.current_version(), "2.0.0");
        assert_eq!(supervisor.store.metadata_version(), "2.0.0");
        assert_eq!(
            *executor.calls.lock().unwrap(),
            vec!["backup 1.0.0".to_string(), "rebuild".to_string()]
        );

        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn test_version_update_restart_resets_failures() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".version"), "1.0.0").unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"version": "1.0.0"}"#).unwrap();

        let mut supervisor = supervisor(&dir, Arc::new(RecordingExecutor::default()));
        let cancel = CancellationToken::new();

        supervisor.tick(&cancel).await;
        assert_eq!(supervisor.health().consecutive_failures, 1);

        std::fs::write(dir.path().join(".version"), "1.2.3").unwrap();
        let outcome = supervisor.tick(&cancel).await;

        assert!(outcome.version_updated);
        assert!(!outcome.restarted);
        assert_eq!(supervisor.controller().restart_count(), 1);
        assert_eq!(supervisor.health().consecutive_failures, 0);
        assert!(supervisor.health().last_restart.is_some());

        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn test_cancelled_tick_skips_restart() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".version"), "1.2.3").unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"version": "1.0.0"}"#).unwrap();

        let executor = Arc::new(RecordingExecutor::default());
        let mut supervisor = supervisor(&dir, executor.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = supervisor.tick(&cancel).await;

        assert!(!outcome.version_updated);
        assert!(executor.calls.lock().unwrap().is_empty());
        assert_eq!(supervisor.controller().restart_count(), 0);
    }
}
