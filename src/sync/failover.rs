use tracing::warn;

/// Per-task retry-then-failover state. Each task owns one selector;
/// nothing outside the task's loop touches it, so no synchronization is
/// needed. Two tasks may legitimately point at different endpoints at
/// the same time.
#[derive(Debug, Clone)]
pub struct NodeSelector {
    primary: String,
    backup: String,
    current: String,
    retries: u8,
    max_retries: u8,
}

impl NodeSelector {
    pub fn new(primary: String, backup: String, max_retries: u8) -> Self {
        let current = primary.clone();
        Self {
            primary,
            backup,
            current,
            retries: 0,
            max_retries,
        }
    }

    pub fn current_url(&self) -> &str {
        &self.current
    }

    pub fn retries(&self) -> u8 {
        self.retries
    }

    pub fn record_success(&mut self) {
        self.retries = 0;
    }

    /// Returns true when the failure budget is spent and the selector
    /// switched to the other endpoint; the counter resets on the switch.
    pub fn record_failure(&mut self) -> bool {
        if self.retries >= self.max_retries {
            let target = if self.current == self.primary {
                self.backup.clone()
            } else {
                self.primary.clone()
            };
            warn!(
                "switching upstream target from {} to {} after {} retries",
                self.current, target, self.retries
            );
            self.current = target;
            self.retries = 0;
            true
        } else {
            self.retries += 1;
            false
        }
    }
}
