//! Bounded-concurrency task scheduler
//!
//! Every task is spawned up front and then waits for a permit from a shared
//! semaphore. A task keeps its permit for all of its attempts, including the
//! delays between them, so at most `max_concurrency` tasks are active at once.

use crate::retry::{RetryPolicy, TaskOutcome};
use cloudmirror_core::MirrorTask;
use cloudmirror_registry::RegistrySet;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A task together with its terminal outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task: MirrorTask,
    pub outcome: TaskOutcome,
}

pub struct Scheduler {
    registries: Arc<RegistrySet>,
    policy: RetryPolicy,
    max_concurrency: usize,
}

impl Scheduler {
    pub fn new(registries: Arc<RegistrySet>, policy: RetryPolicy, max_concurrency: usize) -> Self {
        Self {
            registries,
            policy,
            max_concurrency: max_concurrency.clamp(1, Semaphore::MAX_PERMITS),
        }
    }

    /// Run every task once and collect one report per task
    ///
    /// Reports come back in completion order. Once `cancel` fires, tasks that
    /// have not been admitted resolve to [`TaskOutcome::Cancelled`].
    pub async fn run(&self, tasks: Vec<MirrorTask>, cancel: CancellationToken) -> Vec<TaskReport> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut set = JoinSet::new();
        let mut pending = HashMap::with_capacity(tasks.len());

        for (index, task) in tasks.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let registries = self.registries.clone();
            let cancel = cancel.clone();
            let policy = self.policy;
            let spawned = task.clone();

            set.spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return (index, TaskOutcome::Cancelled),
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return (index, TaskOutcome::Cancelled),
                    },
                };

                let registries = registries.as_ref();
                let task = &spawned;
                let token = &cancel;
                let outcome = policy
                    .run(&task.source, token, move |_| run_attempt(registries, task, token))
                    .await;
                (index, outcome)
            });
            pending.insert(index, task);
        }

        let mut reports = Vec::with_capacity(pending.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Some(task) = pending.remove(&index) {
                        log_outcome(&task, &outcome);
                        reports.push(TaskReport { task, outcome });
                    }
                }
                Err(e) => tracing::error!("Mirror task aborted: {}", e),
            }
        }

        // tasks whose spawned future never returned
        for (_, task) in pending {
            let outcome = TaskOutcome::Failed {
                attempts: 0,
                reason: "Task aborted".to_string(),
            };
            log_outcome(&task, &outcome);
            reports.push(TaskReport { task, outcome });
        }

        reports
    }
}

/// One attempt: push to every destination in manifest order
///
/// Every destination is tried even after one fails. Tags without an
/// initialized adapter fail without stopping the others. Once `cancel`
/// fires, the destinations not yet dispatched count as failed.
async fn run_attempt(
    registries: &RegistrySet,
    task: &MirrorTask,
    cancel: &CancellationToken,
) -> Result<(), String> {
    let mut failed = Vec::new();

    for (i, tag) in task.destinations.iter().enumerate() {
        if cancel.is_cancelled() {
            let skipped: Vec<&str> = task.destinations[i..].iter().map(String::as_str).collect();
            tracing::warn!(
                source = %task.source,
                line = task.line_number,
                "Cancelled before pushing to {}",
                skipped.join(", ")
            );
            failed.extend(skipped);
            break;
        }

        let ok = match registries.get_by_tag(tag) {
            Some(adapter) => adapter.push(&task.source).await,
            None => {
                tracing::error!(
                    source = %task.source,
                    line = task.line_number,
                    "Unknown destination: {}",
                    tag
                );
                false
            }
        };

        if !ok {
            failed.push(tag.as_str());
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("Failed destinations: {}", failed.join(", ")))
    }
}

fn log_outcome(task: &MirrorTask, outcome: &TaskOutcome) {
    match outcome {
        TaskOutcome::Succeeded { attempts } => tracing::info!(
            source = %task.source,
            line = task.line_number,
            attempts,
            "Mirrored {}",
            task.source
        ),
        TaskOutcome::Failed { attempts, reason } => tracing::error!(
            source = %task.source,
            line = task.line_number,
            attempts,
            "Failed to mirror {} after {} attempts: {}",
            task.source,
            attempts,
            reason
        ),
        TaskOutcome::Cancelled => tracing::warn!(
            source = %task.source,
            line = task.line_number,
            "Skipped {}: cancelled",
            task.source
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeAdapter;
    use cloudmirror_core::DestinationKind;
    use std::time::Duration;

    fn task(destinations: &[&str], source: &str, line_number: usize) -> MirrorTask {
        MirrorTask::new(
            destinations.iter().map(|d| d.to_string()).collect(),
            source,
            line_number,
        )
    }

    fn scheduler(adapters: Vec<Arc<FakeAdapter>>, retries: u32, jobs: usize) -> Scheduler {
        let mut set = RegistrySet::new();
        for adapter in adapters {
            set.insert(adapter);
        }
        Scheduler::new(
            Arc::new(set),
            RetryPolicy::new(retries, Duration::from_secs(1)),
            jobs,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_successful_task() {
        let ecr = Arc::new(FakeAdapter::returning(DestinationKind::Ecr, true));
        let reports = scheduler(vec![ecr.clone()], 3, 3)
            .run(vec![task(&["ECR"], "repo/nginx:1.0", 1)], CancellationToken::new())
            .await;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, TaskOutcome::Succeeded { attempts: 1 });
        assert_eq!(ecr.pushes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_and_fold_retries_whole_task() {
        let gar = Arc::new(FakeAdapter::returning(DestinationKind::Gar, true));
        let acr = Arc::new(FakeAdapter::returning(DestinationKind::Acr, false));

        let reports = scheduler(vec![gar.clone(), acr.clone()], 3, 3)
            .run(vec![task(&["GAR", "ACR"], "repo/redis:6", 1)], CancellationToken::new())
            .await;

        assert_eq!(
            reports[0].outcome,
            TaskOutcome::Failed {
                attempts: 3,
                reason: "Failed destinations: ACR".to_string()
            }
        );
        // already-successful destinations are pushed again on every attempt
        assert_eq!(gar.pushes(), 3);
        assert_eq!(acr.pushes(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_destination_fails_without_stopping_others() {
        let ecr = Arc::new(FakeAdapter::returning(DestinationKind::Ecr, true));

        let reports = scheduler(vec![ecr.clone()], 1, 1)
            .run(
                vec![task(&["QUAY", "ECR", "GAR"], "repo/app:2", 7)],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(
            reports[0].outcome.reason().as_deref(),
            Some("Failed destinations: QUAY, GAR")
        );
        assert_eq!(ecr.pushes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_failed_attempts() {
        let ecr = Arc::new(FakeAdapter::sequence(DestinationKind::Ecr, &[false, false]));
        let started = tokio::time::Instant::now();

        let reports = scheduler(vec![ecr.clone()], 3, 1)
            .run(vec![task(&["ECR"], "repo/x:1", 1)], CancellationToken::new())
            .await;

        assert_eq!(reports[0].outcome, TaskOutcome::Succeeded { attempts: 3 });
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_bound() {
        let ecr = Arc::new(FakeAdapter::holding(
            DestinationKind::Ecr,
            Duration::from_millis(100),
        ));
        let tasks = (1..=10)
            .map(|i| task(&["ECR"], &format!("repo/app{}:1", i), i))
            .collect();

        let reports = scheduler(vec![ecr.clone()], 1, 3)
            .run(tasks, CancellationToken::new())
            .await;

        assert_eq!(reports.len(), 10);
        assert!(reports.iter().all(|r| r.outcome.is_success()));
        assert_eq!(ecr.peak(), 3);
        assert_eq!(ecr.pushes(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_adapter_counts_as_failure() {
        let ecr = Arc::new(FakeAdapter::panicking(DestinationKind::Ecr));
        let gar = Arc::new(FakeAdapter::returning(DestinationKind::Gar, true));

        let reports = scheduler(vec![ecr, gar], 2, 2)
            .run(
                vec![
                    task(&["ECR"], "repo/a:1", 1),
                    task(&["GAR"], "repo/b:1", 2),
                ],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(reports.len(), 2);
        let failed: Vec<_> = reports.iter().filter(|r| !r.outcome.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].task.line_number, 1);
        assert_eq!(failed[0].outcome.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_admission() {
        let ecr = Arc::new(FakeAdapter::returning(DestinationKind::Ecr, true));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let reports = scheduler(vec![ecr.clone()], 3, 2)
            .run(
                vec![task(&["ECR"], "repo/a:1", 1), task(&["ECR"], "repo/b:1", 2)],
                cancel,
            )
            .await;

        assert!(reports.iter().all(|r| r.outcome == TaskOutcome::Cancelled));
        assert_eq!(ecr.pushes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_run_lets_admitted_tasks_finish() {
        let ecr = Arc::new(FakeAdapter::holding(
            DestinationKind::Ecr,
            Duration::from_millis(100),
        ));
        let tasks = (1..=6)
            .map(|i| task(&["ECR"], &format!("repo/app{}:1", i), i))
            .collect();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let reports = scheduler(vec![ecr.clone()], 3, 2).run(tasks, cancel).await;

        assert_eq!(reports.len(), 6);
        let succeeded = reports.iter().filter(|r| r.outcome.is_success()).count();
        let cancelled = reports
            .iter()
            .filter(|r| r.outcome == TaskOutcome::Cancelled)
            .count();
        assert_eq!(succeeded, 2);
        assert_eq!(cancelled, 4);
        assert_eq!(ecr.pushes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_skips_remaining_destinations() {
        let ecr = Arc::new(FakeAdapter::holding(
            DestinationKind::Ecr,
            Duration::from_millis(100),
        ));
        let gar = Arc::new(FakeAdapter::returning(DestinationKind::Gar, true));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let reports = scheduler(vec![ecr.clone(), gar.clone()], 3, 1)
            .run(vec![task(&["ECR", "GAR"], "repo/a:1", 1)], cancel)
            .await;

        assert_eq!(
            reports[0].outcome,
            TaskOutcome::Failed {
                attempts: 1,
                reason: "Failed destinations: GAR".to_string()
            }
        );
        assert_eq!(ecr.pushes(), 1);
        assert_eq!(gar.pushes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_concurrency_is_clamped() {
        let ecr = Arc::new(FakeAdapter::returning(DestinationKind::Ecr, true));

        let reports = scheduler(vec![ecr.clone()], 1, usize::MAX)
            .run(vec![task(&["ECR"], "repo/a:1", 1)], CancellationToken::new())
            .await;

        assert_eq!(reports[0].outcome, TaskOutcome::Succeeded { attempts: 1 });
        assert_eq!(ecr.pushes(), 1);
    }

    #[tokio::test]
    async fn test_no_tasks() {
        let reports = scheduler(vec![], 3, 3)
            .run(Vec::new(), CancellationToken::new())
            .await;
        assert!(reports.is_empty());
    }
}
