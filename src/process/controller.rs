use crate::config::Config;
use crate::error::{Result, WardenError};
use crate::process::spawner::{spawn_process, SpawnOptions};
use crate::process::types::{ProcessState, SupervisedProcess};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::time::{Duration, SystemTime};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How often the remaining members of a group are polled while stopping
const GROUP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Owns the single supervised child
///
/// At most one child is alive at a time: `start` on a running controller
/// stops the previous child first.
pub struct ProcessController {
    options: SpawnOptions,
    stop_timeout: Duration,
    restart_delay: Duration,
    current: Option<SupervisedProcess>,
    state: ProcessState,
    restarts: usize,
    last_restart: Option<SystemTime>,
}

impl ProcessController {
    pub fn new(options: SpawnOptions, stop_timeout: Duration, restart_delay: Duration) -> Self {
        Self {
            options,
            stop_timeout,
            restart_delay,
            current: None,
            state: ProcessState::Stopped,
            restarts: 0,
            last_restart: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let options = SpawnOptions {
            command: config.commands.start.clone(),
            cwd: config.project_dir.clone(),
            log_dir: Some(config.log_dir()),
        };

        Self::new(options, config.stop_timeout(), config.restart_delay())
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn pid(&self) -> Option<u32> {
        self.current.as_ref().map(|p| p.pid)
    }

    pub fn restart_count(&self) -> usize {
        self.restarts
    }

    pub fn last_restart(&self) -> Option<SystemTime> {
        self.last_restart
    }

    /// Launch the child without waiting for readiness
    ///
    /// On failure the controller is left `Stopped` with no handle.
    pub async fn start(&mut self) -> Result<u32> {
        if let Some(pid) = self.pid() {
            tracing::warn!(pid, "Child already running, stopping it before start");
            self.stop().await?;
        }

        self.state = ProcessState::Starting;
        tracing::info!(command = %self.options.command, "Starting child process");

        match spawn_process(&self.options).await {
            Ok(spawned) => {
                let pid = spawned.pid;
                self.current = Some(SupervisedProcess::new(spawned));
                self.state = ProcessState::Running;
                tracing::info!(pid, "Child process started");
                Ok(pid)
            }
            Err(e) => {
                self.state = ProcessState::Stopped;
                Err(e)
            }
        }
    }

    /// Stop the child's whole process group
    ///
    /// SIGTERM first; SIGKILL if the group is still alive when the grace period
    /// ends. Stopping without a child is a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(mut process) = self.current.take() else {
            tracing::debug!("No child process to stop");
            self.state = ProcessState::Stopped;
            return Ok(());
        };

        self.state = ProcessState::Stopping;
        let result = self.terminate_group(&mut process).await;
        self.state = ProcessState::Stopped;

        match result {
            Ok(()) => {
                tracing::info!(
                    pid = process.pid,
                    uptime = ?process.uptime(),
                    "Child process stopped"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(pid = process.pid, "Error stopping child process: {}", e);
                Err(e)
            }
        }
    }

    /// Stop, wait for the settle delay, start again
    ///
    /// The delay lets the OS release the child's listening port. A failed stop
    /// is logged and does not prevent the new start. Returns `Ok(None)`, with
    /// the child stopped, when `cancel` fires during the delay.
    pub async fn restart(&mut self, cancel: &CancellationToken) -> Result<Option<u32>> {
        tracing::info!("Restarting child process");

        if let Err(e) = self.stop().await {
            tracing::warn!("Continuing restart after failed stop: {}", e);
        }

        tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            _ = tokio::time::sleep(self.restart_delay) => {}
        }

        self.restarts += 1;
        self.last_restart = Some(SystemTime::now());

        self.start().await.map(Some)
    }

    async fn terminate_group(&self, process: &mut SupervisedProcess) -> Result<()> {
        let pid = process.pid;
        let pgid = Pid::from_raw(process.pgid);

        tracing::info!(pid, "Sending SIGTERM to process group");
        match killpg(pgid, Signal::SIGTERM) {
            Ok(()) => {}
            Err(Errno::ESRCH) => {
                tracing::debug!(pid, "Process group already gone");
                let _ = process.child.wait().await;
                return Ok(());
            }
            Err(e) => {
                return Err(WardenError::StopError(
                    pid,
                    format!("Failed to send SIGTERM: {}", e),
                ));
            }
        }

        let deadline = Instant::now() + self.stop_timeout;
        if Self::wait_for_group_exit(process, pgid, deadline).await {
            return Ok(());
        }

        tracing::warn!(
            pid,
            "Process group did not exit within {:?}, sending SIGKILL",
            self.stop_timeout
        );
        match killpg(pgid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => {
                return Err(WardenError::StopError(
                    pid,
                    format!("Failed to send SIGKILL: {}", e),
                ));
            }
        }

        let _ = process.child.wait().await;
        Ok(())
    }

    /// Wait until the leader is reaped and no member of the group remains
    async fn wait_for_group_exit(
        process: &mut SupervisedProcess,
        pgid: Pid,
        deadline: Instant,
    ) -> bool {
        match tokio::time::timeout_at(deadline, process.child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(pid = process.pid, "Child exited: {}", status),
            Ok(Err(e)) => tracing::warn!(pid = process.pid, "Wait on child failed: {}", e),
            Err(_) => return false,
        }

        loop {
            if !group_alive(pgid) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(GROUP_POLL_INTERVAL).await;
        }
    }
}

/// Whether any process still belongs to the group
fn group_alive(pgid: Pid) -> bool {
    killpg(pgid, None).is_ok()
}

#[cfg(test)]
mod tests;
