//! Fixed-interval task runner
//!
//! Runs a [`PeriodicJob`] once per period on its own task. Ticks never
//! overlap: a slow run delays the next tick instead of queueing missed ones.
//! Cancellation is observed only between runs, so an in-flight run always
//! completes.

use crate::error::{PlugwatchError, Result};
use crate::logging::get_logger;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

/// Unit of work invoked once per tick
#[async_trait::async_trait]
pub trait PeriodicJob: Send {
    /// Name used in log lines
    fn name(&self) -> &str {
        "job"
    }

    async fn run_once(&mut self) -> Result<()>;
}

/// Counters collected while a task runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub ticks: u64,
    pub failures: u64,
    /// Runs that took longer than the period
    pub overruns: u64,
}

/// Periodic task configuration
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    period: Duration,
    run_immediately: bool,
}

impl PeriodicTask {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            run_immediately: false,
        }
    }

    /// Fire the first tick at once instead of after one period
    pub fn run_immediately(mut self, yes: bool) -> Self {
        self.run_immediately = yes;
        self
    }

    /// Start running `job` on a new task
    pub fn spawn<J>(self, job: J) -> TaskHandle
    where
        J: PeriodicJob + 'static,
    {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(job, cancel_rx));
        TaskHandle { cancel_tx, join }
    }

    /// Run `job` on the current task until `cancel` turns true or its sender is dropped
    ///
    /// Returns at once without running `job` when the period is too long for
    /// its deadlines to be represented.
    pub async fn run<J>(self, mut job: J, mut cancel: watch::Receiver<bool>) -> TaskStats
    where
        J: PeriodicJob,
    {
        let logger = get_logger("scheduler");
        let mut stats = TaskStats::default();

        let now = Instant::now();
        let first = if self.run_immediately {
            Some(now)
        } else {
            now.checked_add(self.period)
        };
        // interval_at adds the period after every tick
        let Some(start) = first.filter(|s| s.checked_add(self.period).is_some()) else {
            logger.error(&format!(
                "Interval of {} seconds is too long, not scheduling {}",
                self.period.as_secs(),
                job.name()
            ));
            return stats;
        };
        let mut ticker = interval_at(start, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let wait_message = format!(
            "Waiting to check {} for {} seconds...",
            job.name(),
            self.period.as_secs()
        );
        logger.info(&wait_message);

        loop {
            if *cancel.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let started = Instant::now();
            stats.ticks = stats.ticks.saturating_add(1);
            logger.debug(&format!(
                "Checking {} after waiting {} seconds",
                job.name(),
                self.period.as_secs()
            ));

            // The job logs its own failures
            if let Err(e) = job.run_once().await {
                stats.failures = stats.failures.saturating_add(1);
                logger.debug(&format!("Check of {} failed: {}", job.name(), e));
            }

            let elapsed = started.elapsed();
            if elapsed > self.period {
                stats.overruns = stats.overruns.saturating_add(1);
                logger.warn(&format!(
                    "Check of {} took {:.1}s, longer than the {}s interval",
                    job.name(),
                    elapsed.as_secs_f64(),
                    self.period.as_secs()
                ));
            }
            logger.debug(&wait_message);
        }

        logger.info(&format!(
            "Stopped checking {} after {} ticks ({} failed)",
            job.name(),
            stats.ticks,
            stats.failures
        ));
        stats
    }
}

/// Handle to a spawned periodic task
pub struct TaskHandle {
    cancel_tx: watch::Sender<bool>,
    join: JoinHandle<TaskStats>,
}

impl TaskHandle {
    /// Stop future ticks; a run in progress finishes first
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Wait for the task to end on its own, keeping the handle usable
    ///
    /// Must not be called again once it has returned.
    pub async fn stopped(&mut self) -> Result<TaskStats> {
        (&mut self.join)
            .await
            .map_err(|e| PlugwatchError::generic(format!("Periodic task aborted: {}", e)))
    }

    /// Wait for the task to end and return its counters
    pub async fn join(self) -> Result<TaskStats> {
        // Keep the sender alive so the task only stops on an explicit cancel
        let TaskHandle { cancel_tx, join } = self;
        let stats = join
            .await
            .map_err(|e| PlugwatchError::generic(format!("Periodic task aborted: {}", e)))?;
        drop(cancel_tx);
        Ok(stats)
    }

    /// Cancel and wait
    pub async fn shutdown(self) -> Result<TaskStats> {
        self.cancel();
        self.join().await
    }
}
