//! Bounded retry with a fixed delay

use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Terminal outcome of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded { attempts: u32 },
    Failed { attempts: u32, reason: String },
    /// Cancelled before the first attempt started
    Cancelled,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            TaskOutcome::Succeeded { attempts } | TaskOutcome::Failed { attempts, .. } => *attempts,
            TaskOutcome::Cancelled => 0,
        }
    }

    /// Failure reason; `None` on success
    pub fn reason(&self) -> Option<String> {
        match self {
            TaskOutcome::Succeeded { .. } => None,
            TaskOutcome::Failed { reason, .. } => Some(reason.clone()),
            TaskOutcome::Cancelled => Some("Cancelled before start".to_string()),
        }
    }
}

/// Up to `max_attempts` attempts with `delay` between a failed attempt and
/// the next one. No backoff, no jitter, no state shared between tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `attempt` until it succeeds or the attempts are exhausted
    ///
    /// `attempt` receives the 1-based attempt number and resolves to `Err`
    /// with a reason on failure. A panic inside an attempt counts as a failed
    /// attempt. Once `cancel` fires no further attempt is started and the
    /// pending delay is cut short.
    pub async fn run<F, Fut>(
        &self,
        label: &str,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> TaskOutcome
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let mut reason = String::new();

        for n in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                return if n == 1 {
                    TaskOutcome::Cancelled
                } else {
                    TaskOutcome::Failed {
                        attempts: n - 1,
                        reason,
                    }
                };
            }

            tracing::debug!(source = label, attempt = n, "Attempt {}/{}", n, self.max_attempts);

            let result = AssertUnwindSafe(attempt(n))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(panic_message(panic)));

            match result {
                Ok(()) => return TaskOutcome::Succeeded { attempts: n },
                Err(e) => {
                    tracing::warn!(
                        source = label,
                        attempt = n,
                        "Attempt {}/{} failed for {}: {}",
                        n,
                        self.max_attempts,
                        label,
                        e
                    );
                    reason = e;
                }
            }

            if n < self.max_attempts {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return TaskOutcome::Failed { attempts: n, reason };
                    }
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
        }

        TaskOutcome::Failed {
            attempts: self.max_attempts,
            reason,
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("Unexpected error: {}", detail)
}
