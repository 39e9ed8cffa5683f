use crate::process::spawner::SpawnedProcess;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use tokio::process::Child;

/// Lifecycle of the child as seen by the controller
///
/// `Running` is assumed as soon as the launch succeeds; readiness is the
/// health probe's concern and is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessState::Stopped => write!(f, "stopped"),
            ProcessState::Starting => write!(f, "starting"),
            ProcessState::Running => write!(f, "running"),
            ProcessState::Stopping => write!(f, "stopping"),
        }
    }
}

/// The live child owned by the controller
#[derive(Debug)]
pub struct SupervisedProcess {
    pub child: Child,
    pub pid: u32,
    /// Process group id; the child leads its own group
    pub pgid: i32,
    pub command: String,
    pub started_at: SystemTime,
}

impl SupervisedProcess {
    pub fn new(spawned: SpawnedProcess) -> Self {
        Self {
            child: spawned.child,
            pid: spawned.pid,
            pgid: spawned.pgid,
            command: spawned.command,
            started_at: SystemTime::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.started_at)
            .unwrap_or(Duration::from_secs(0))
    }
}
