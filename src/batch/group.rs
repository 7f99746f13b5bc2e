//! Semaphore-guarded task group.

use super::outcome::{BatchOutcome, UnitFailure, UnitOutcome};
use crate::{Error, ErrorContext, Result};
use futures::FutureExt;
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Runs submitted futures with at most `limit` of them executing at once.
///
/// Admission goes through a fair semaphore, so units start in submission order. A unit
/// that errors or panics becomes a failure marker at its position; siblings keep running.
pub struct TaskGroup<T> {
    semaphore: Arc<Semaphore>,
    limit: usize,
    tasks: JoinSet<(usize, UnitOutcome<T>)>,
    positions: HashSet<usize>,
    started: Instant,
}

impl<T: Send + 'static> TaskGroup<T> {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            tasks: JoinSet::new(),
            positions: HashSet::new(),
            started: Instant::now(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of units submitted so far.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Schedule `fut` as the unit at `position`.
    ///
    /// Fails only when `position` was already submitted to this group.
    pub fn submit<F>(&mut self, position: usize, fut: F) -> Result<()>
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        if !self.positions.insert(position) {
            return Err(Error::configuration_with_context(
                format!("unit position {} submitted twice", position),
                ErrorContext::new().with_field_path("position"),
            ));
        }

        let semaphore = self.semaphore.clone();
        self.tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return (
                        position,
                        UnitOutcome::Failed(UnitFailure::new(position, "admission semaphore closed")),
                    )
                }
            };

            debug!(position, "unit started");
            let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(value)) => {
                    info!(position, "unit completed");
                    UnitOutcome::Completed(value)
                }
                Ok(Err(err)) => {
                    warn!(position, error = %err, "unit failed");
                    UnitOutcome::Failed(UnitFailure::from_error(position, &err))
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(position, panic = message.as_str(), "unit panicked");
                    UnitOutcome::Failed(UnitFailure::new(position, format!("panicked: {}", message)))
                }
            };
            (position, outcome)
        });
        Ok(())
    }

    /// Wait for every submitted unit. The outcome has one entry per submitted position.
    pub async fn join_all(mut self) -> BatchOutcome<T> {
        let mut outcomes = BTreeMap::new();
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((position, outcome)) => {
                    outcomes.insert(position, outcome);
                }
                Err(e) => warn!(error = %e, "unit task did not complete"),
            }
        }

        // A task that was aborted never reported its position.
        for position in &self.positions {
            outcomes.entry(*position).or_insert_with(|| {
                UnitOutcome::Failed(UnitFailure::new(*position, "task aborted before completion"))
            });
        }

        let outcome = BatchOutcome::new(outcomes, self.started.elapsed());
        info!(
            units = outcome.len(),
            completed = outcome.success_count(),
            failed = outcome.failure_count(),
            elapsed_ms = outcome.execution_time.as_millis() as u64,
            "batch finished"
        );
        outcome
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_position_is_rejected() {
        let mut group: TaskGroup<u32> = TaskGroup::new(2);
        group.submit(0, async { Ok(1) }).unwrap();
        let err = group.submit(0, async { Ok(2) }).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        let outcome = group.join_all().await;
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.get(0).and_then(|o| o.completed()), Some(&1));
    }

    #[tokio::test]
    async fn panics_become_failures() {
        let mut group: TaskGroup<u32> = TaskGroup::new(1);
        group.submit(0, async { panic!("bad chapter") }).unwrap();
        group.submit(1, async { Ok(7) }).unwrap();
        let outcome = group.join_all().await;
        let failure = outcome.get(0).and_then(|o| o.failure()).unwrap();
        assert!(failure.message.contains("bad chapter"));
        assert!(outcome.get(1).unwrap().is_completed());
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        let group: TaskGroup<()> = TaskGroup::new(0);
        assert_eq!(group.limit(), 1);
    }
}
