use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// What the loop should do after recording a probe result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The child answered; the failure counter was reset
    Healthy,
    /// The child failed, but fewer than `threshold` times in a row
    Degraded(u32),
    /// The threshold was reached; restart the child
    Restart,
}

/// Failure accounting for the supervised child
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthState {
    pub consecutive_failures: u32,
    pub last_check: Option<SystemTime>,
    pub last_restart: Option<SystemTime>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one probe result against the restart threshold
    ///
    /// The counter is not reset on `Restart`; call `record_restart` once the
    /// restart has been issued.
    pub fn record(&mut self, healthy: bool, threshold: u32) -> Verdict {
        self.last_check = Some(SystemTime::now());

        if healthy {
            self.consecutive_failures = 0;
            return Verdict::Healthy;
        }

        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= threshold {
            Verdict::Restart
        } else {
            Verdict::Degraded(self.consecutive_failures)
        }
    }

    /// Reset the counter after a restart was issued
    pub fn record_restart(&mut self) {
        self.consecutive_failures = 0;
        self.last_restart = Some(SystemTime::now());
    }
}
