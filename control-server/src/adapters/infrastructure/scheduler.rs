//! Registry of periodic and delayed background tasks.
//!
//! Every timer in the server is registered here so that shutdown can stop
//! all of them with one call. Periods use tokio's clock, which lets tests
//! drive them with a paused runtime.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Handle to one registered task
#[derive(Debug, Clone)]
pub struct TaskHandle {
    name: String,
    abort: AbortHandle,
}

impl TaskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Mutex<Vec<TaskHandle>>,
    stopped: AtomicBool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` after `first_delay`, then every `period`.
    ///
    /// A run that overruns its period delays the next one instead of
    /// stacking up missed ticks. Returns `None` once the scheduler is stopped.
    pub fn every<F, Fut>(
        &self,
        name: &str,
        first_delay: Duration,
        period: Duration,
        job: F,
    ) -> Option<TaskHandle>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        self.register(name, async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + first_delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                job().await;
            }
        })
    }

    /// Run `job` once after `delay`
    pub fn after<Fut>(&self, name: &str, delay: Duration, job: Fut) -> Option<TaskHandle>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register(name, async move {
            tokio::time::sleep(delay).await;
            job.await;
        })
    }

    fn register<Fut>(&self, name: &str, task: Fut) -> Option<TaskHandle>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Checked under the lock so cancel_all cannot miss a task
        if self.stopped.load(Ordering::SeqCst) {
            tracing::debug!(task = name, "Scheduler stopped, task not registered");
            return None;
        }

        tasks.retain(|task| !task.is_finished());

        let handle = TaskHandle {
            name: name.to_string(),
            abort: tokio::spawn(task).abort_handle(),
        };
        tracing::debug!(task = name, "Scheduled task registered");
        tasks.push(handle.clone());
        Some(handle)
    }

    /// Abort every registered task and refuse new ones.
    ///
    /// Returns the number of tasks that were still running.
    pub fn cancel_all(&self) -> usize {
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.stopped.store(true, Ordering::SeqCst);

        let mut cancelled = 0;
        for task in tasks.drain(..) {
            if !task.is_finished() {
                task.cancel();
                cancelled += 1;
                tracing::debug!(task = task.name(), "Scheduled task cancelled");
            }
        }
        cancelled
    }

    pub fn active_tasks(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}
