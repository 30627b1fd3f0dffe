//! Recurring Task
//!
//! Fixed-delay scheduler: the next execution starts `interval` after the
//! previous one *ended*. Each schedule owns one worker thread, so at most one
//! execution is in flight. Errors and panics raised by the task are logged
//! and discarded; they never end the schedule.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{CacheError, Result};
use crate::tasks::TimeUnit;

const DEFAULT_NAME: &str = "recurring-task";

// == Task ==
/// A unit of work executed on every tick of a schedule.
pub trait Task: Send + 'static {
    fn execute(&mut self) -> anyhow::Result<()>;
}

impl<F> Task for F
where
    F: FnMut() -> anyhow::Result<()> + Send + 'static,
{
    fn execute(&mut self) -> anyhow::Result<()> {
        self()
    }
}

// == Run Stats ==
/// Execution counters of a started schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    /// Completed executions, successful or not
    pub executions: u64,
    /// Executions that returned an error or panicked
    pub failures: u64,
    /// When the latest execution finished
    pub last_run: Option<DateTime<Utc>>,
}

// == Recurring Task ==
/// A validated schedule that has not been started yet.
pub struct RecurringTask {
    name: String,
    task: Box<dyn Task>,
    initial_delay: Duration,
    interval: Duration,
}

impl RecurringTask {
    // == Constructor ==
    /// Validates the schedule.
    ///
    /// `initial_delay` may be zero but not negative; `interval` must be
    /// strictly positive.
    pub fn new(task: impl Task, initial_delay: i64, interval: i64, unit: TimeUnit) -> Result<Self> {
        Self::builder()
            .task(task)
            .initial_delay(initial_delay)
            .interval(interval)
            .unit(unit)
            .build()
    }

    pub fn builder() -> RecurringTaskBuilder {
        RecurringTaskBuilder::default()
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    // == Start ==
    /// Starts the schedule on its own worker thread.
    ///
    /// Only fails if the thread cannot be spawned. Dropping the returned
    /// handle leaves the schedule running.
    pub fn start(self) -> Result<ScheduleHandle> {
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);
        let name = self.name.clone();

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run(worker_shared))
            .map_err(|err| CacheError::Internal(format!("failed to spawn {name}: {err}")))?;

        Ok(ScheduleHandle {
            name,
            shared,
            thread: Some(thread),
        })
    }

    fn run(mut self, shared: Arc<Shared>) {
        info!(
            task = %self.name,
            initial_delay_ms = self.initial_delay.as_millis() as u64,
            interval_ms = self.interval.as_millis() as u64,
            "starting recurring task"
        );

        if !shared.wait(self.initial_delay) {
            info!(task = %self.name, "recurring task stopped");
            return;
        }

        loop {
            let failed = !self.execute_once();
            {
                let mut stats = shared.stats.lock();
                stats.executions += 1;
                if failed {
                    stats.failures += 1;
                }
                stats.last_run = Some(Utc::now());
            }

            if !shared.wait(self.interval) {
                break;
            }
        }

        info!(task = %self.name, "recurring task stopped");
    }

    /// Runs the task once, returning `false` if it failed.
    fn execute_once(&mut self) -> bool {
        let task = &mut self.task;
        match panic::catch_unwind(AssertUnwindSafe(|| task.execute())) {
            Ok(Ok(())) => {
                debug!(task = %self.name, "recurring task execution finished");
                true
            }
            Ok(Err(err)) => {
                error!(task = %self.name, error = %format!("{err:#}"), "exception in running task");
                false
            }
            Err(payload) => {
                warn!(task = %self.name, panic = %panic_message(&*payload), "recurring task panicked");
                false
            }
        }
    }
}

impl fmt::Debug for RecurringTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecurringTask")
            .field("name", &self.name)
            .field("initial_delay", &self.initial_delay)
            .field("interval", &self.interval)
            .finish()
    }
}

// == Builder ==
/// Collects schedule parameters; [`build`](Self::build) validates them.
#[derive(Default)]
pub struct RecurringTaskBuilder {
    name: Option<String>,
    task: Option<Box<dyn Task>>,
    initial_delay: i64,
    interval: Option<i64>,
    unit: Option<TimeUnit>,
}

impl RecurringTaskBuilder {
    /// Worker thread name, also used in log fields.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn task(mut self, task: impl Task) -> Self {
        self.task = Some(Box::new(task));
        self
    }

    pub fn initial_delay(mut self, initial_delay: i64) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub fn interval(mut self, interval: i64) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn unit(mut self, unit: TimeUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn build(self) -> Result<RecurringTask> {
        let task = self
            .task
            .ok_or_else(|| CacheError::InvalidArgument("task cannot be null".to_string()))?;
        let unit = self
            .unit
            .ok_or_else(|| CacheError::InvalidArgument("unit cannot be null".to_string()))?;

        let interval = match self.interval {
            Some(interval) if interval > 0 => interval as u64,
            _ => {
                return Err(CacheError::InvalidArgument(
                    "interval must be greater than 0".to_string(),
                ))
            }
        };
        if self.initial_delay < 0 {
            return Err(CacheError::InvalidArgument(
                "initial delay cannot be negative".to_string(),
            ));
        }

        Ok(RecurringTask {
            name: self.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            task,
            initial_delay: unit.to_duration(self.initial_delay as u64),
            interval: unit.to_duration(interval),
        })
    }
}

// == Schedule Handle ==
/// Control handle for a started schedule.
pub struct ScheduleHandle {
    name: String,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl ScheduleHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Asks the schedule to stop. An execution already in flight finishes
    /// first; no new execution starts afterwards.
    pub fn stop(&self) {
        *self.shared.stopped.lock() = true;
        self.shared.wake.notify_all();
    }

    /// True until the worker thread has exited.
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .map_or(false, |thread| !thread.is_finished())
    }

    pub fn stats(&self) -> RunStats {
        self.shared.stats.lock().clone()
    }

    /// Stops the schedule and waits for the worker thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(task = %self.name, "recurring task worker panicked");
            }
        }
    }
}

impl fmt::Debug for ScheduleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleHandle")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish()
    }
}

// == Shared State ==
#[derive(Default)]
struct Shared {
    stopped: Mutex<bool>,
    wake: Condvar,
    stats: Mutex<RunStats>,
}

impl Shared {
    /// Sleeps for `delay` unless stopped first. Returns `false` once stopped.
    fn wait(&self, delay: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if !*stopped && !delay.is_zero() {
            self.wake
                .wait_while_for(&mut stopped, |stopped| !*stopped, delay);
        }
        !*stopped
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Instant;

    fn noop() -> anyhow::Result<()> {
        Ok(())
    }

    fn counting_task(counter: Arc<AtomicU64>) -> impl Task {
        move || -> anyhow::Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = RecurringTask::new(noop, 0, 0, TimeUnit::Seconds);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_negative_interval_rejected() {
        let result = RecurringTask::new(noop, 0, -1, TimeUnit::Seconds);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_negative_initial_delay_rejected() {
        let result = RecurringTask::new(noop, -5, 1, TimeUnit::Seconds);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_task_rejected() {
        let result = RecurringTask::builder()
            .interval(1)
            .unit(TimeUnit::Seconds)
            .build();
        assert_eq!(
            result.unwrap_err(),
            CacheError::InvalidArgument("task cannot be null".to_string())
        );
    }

    #[test]
    fn test_missing_unit_rejected() {
        let result = RecurringTask::builder().task(noop).interval(1).build();
        assert_eq!(
            result.unwrap_err(),
            CacheError::InvalidArgument("unit cannot be null".to_string())
        );
    }

    #[test]
    fn test_valid_schedule() {
        let task = RecurringTask::new(noop, 0, 250, TimeUnit::Milliseconds).unwrap();
        assert_eq!(task.initial_delay(), Duration::ZERO);
        assert_eq!(task.interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_failing_task_keeps_running() {
        let counter = Arc::new(AtomicU64::new(0));
        let task_counter = Arc::clone(&counter);
        let task = RecurringTask::new(
            move || -> anyhow::Result<()> {
                task_counter.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("task always fails")
            },
            0,
            1,
            TimeUnit::Seconds,
        )
        .unwrap();

        let handle = task.start().unwrap();
        thread::sleep(Duration::from_secs(4));

        assert!(counter.load(Ordering::SeqCst) >= 2);
        let stats = handle.stats();
        assert_eq!(stats.executions, stats.failures);
        assert!(stats.last_run.is_some());
        handle.shutdown();
    }

    #[test]
    fn test_panicking_task_keeps_running() {
        let counter = Arc::new(AtomicU64::new(0));
        let task_counter = Arc::clone(&counter);
        let task = RecurringTask::builder()
            .name("panicking")
            .task(move || -> anyhow::Result<()> {
                task_counter.fetch_add(1, Ordering::SeqCst);
                panic!("boom");
            })
            .interval(50)
            .unit(TimeUnit::Milliseconds)
            .build()
            .unwrap();

        let handle = task.start().unwrap();
        thread::sleep(Duration::from_millis(500));

        assert!(counter.load(Ordering::SeqCst) >= 2);
        assert!(handle.is_running());
        handle.shutdown();
    }

    #[test]
    fn test_fixed_delay_measured_from_end() {
        let starts = Arc::new(Mutex::new(Vec::<Instant>::new()));
        let task_starts = Arc::clone(&starts);
        let task = RecurringTask::new(
            move || -> anyhow::Result<()> {
                task_starts.lock().push(Instant::now());
                thread::sleep(Duration::from_millis(100));
                Ok(())
            },
            0,
            100,
            TimeUnit::Milliseconds,
        )
        .unwrap();

        let handle = task.start().unwrap();
        thread::sleep(Duration::from_millis(900));
        handle.shutdown();

        let starts = starts.lock();
        assert!(starts.len() >= 2);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(200));
        }
    }

    #[test]
    fn test_initial_delay_respected() {
        let counter = Arc::new(AtomicU64::new(0));
        let task =
            RecurringTask::new(counting_task(Arc::clone(&counter)), 10, 10, TimeUnit::Seconds)
                .unwrap();

        let handle = task.start().unwrap();
        thread::sleep(Duration::from_millis(200));

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        handle.shutdown();
    }

    #[test]
    fn test_stop_halts_schedule() {
        let counter = Arc::new(AtomicU64::new(0));
        let task = RecurringTask::new(
            counting_task(Arc::clone(&counter)),
            0,
            20,
            TimeUnit::Milliseconds,
        )
        .unwrap();

        let handle = task.start().unwrap();
        thread::sleep(Duration::from_millis(200));
        handle.stop();
        thread::sleep(Duration::from_millis(100));

        assert!(!handle.is_running());
        let after_stop = counter.load(Ordering::SeqCst);
        assert!(after_stop >= 2);

        thread::sleep(Duration::from_millis(200));
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_dropping_handle_keeps_running() {
        let counter = Arc::new(AtomicU64::new(0));
        let task = RecurringTask::new(
            counting_task(Arc::clone(&counter)),
            0,
            20,
            TimeUnit::Milliseconds,
        )
        .unwrap();

        drop(task.start().unwrap());
        thread::sleep(Duration::from_millis(200));

        assert!(counter.load(Ordering::SeqCst) >= 2);
    }
}
