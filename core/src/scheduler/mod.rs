//! Tick-indexed delayed task scheduler
//!
//! Tasks are filed into buckets keyed by the absolute tick they are due at.
//! Each delivery of the host's tick signal advances the clock by one and
//! drains the bucket for the new tick.
//!
//! ```text
//!   schedule(3, f) at tick 10            on_tick()
//!            │                               │
//!            ▼                               ▼
//!   ┌──────────────────────┐      clock 12 → 13
//!   │ 11 → [a]             │      remove bucket 13 ──► run g, f (FIFO)
//!   │ 13 → [g, f]          │
//!   │ 20 → [h]             │      a task scheduling for tick 13 from here
//!   └──────────────────────┘      is too late: bucket 13 is already gone
//! ```
//!
//! The bucket is removed from the map *before* its tasks run. A task that
//! schedules zero-delay work during dispatch targets a bucket that will never
//! be read again, so that work is lost unless [`SameTickPolicy::Defer`] is
//! configured. The loss is reported (log + [`TaskScheduler::dropped_tasks`])
//! but is otherwise the standing contract.
//!
//! Single writer only: tasks are not `Send`, and both `schedule` and
//! `on_tick` take `&mut self`.

use std::collections::VecDeque;
use std::fmt;

use hashbrown::HashMap;
use meltdown_types::{FailurePolicy, SameTickPolicy, SchedulerConfig};

use crate::clock::{Tick, TickClock};
use crate::error::{SchedulerError, TaskError};


/// A unit of deferred work.
///
/// Receives the scheduler (to queue follow-up work) and the host context `C`.
pub type Task<C> = Box<dyn FnOnce(&mut TaskScheduler<C>, &mut C) -> Result<(), TaskError>>;

/// The host's periodic signal.
///
/// `connect` is called once, the first time the scheduler is used. After that
/// the host is expected to call [`TaskScheduler::on_tick`] once per tick.
pub trait TickSource {
    fn connect(&mut self);
}

/// Tick source for hosts that drive `on_tick` themselves and need no hookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualTickSource;

impl TickSource for ManualTickSource {
    fn connect(&mut self) {}
}

/// Where a `schedule` call put its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduled {
    /// Filed into the bucket for this tick
    At(Tick),
    /// Queued behind the bucket currently being dispatched
    Deferred(Tick),
    /// Target tick already dispatched; the task will never run
    Dropped(Tick),
}

impl Scheduled {
    pub fn tick(&self) -> Tick {
        match self {
            Self::At(t) | Self::Deferred(t) | Self::Dropped(t) => *t,
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped(_))
    }
}

/// Summary of one `on_tick` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: Tick,
    /// Tasks that returned `Ok`
    pub executed: usize,
    /// Tasks that returned `Err` (isolate policy only)
    pub failed: usize,
    /// Deferred same-tick tasks that ran after the bucket
    pub deferred: usize,
}

pub struct TaskScheduler<C> {
    clock: TickClock,
    buckets: HashMap<Tick, Vec<Task<C>>>,
    /// Same-tick tasks queued during dispatch (defer policy)
    deferred: VecDeque<Task<C>>,
    /// Tick whose bucket is currently being run
    dispatching: Option<Tick>,
    source: Box<dyn TickSource>,
    bootstrapped: bool,
    config: SchedulerConfig,
    dropped: u64,
}

impl<C> TaskScheduler<C> {
    pub fn new(source: impl TickSource + 'static, config: SchedulerConfig) -> Self {
        Self {
            clock: TickClock::new(),
            buckets: HashMap::new(),
            deferred: VecDeque::new(),
            dispatching: None,
            source: Box::new(source),
            bootstrapped: false,
            config,
            dropped: 0,
        }
    }

    /// Scheduler with default policies, driven manually.
    pub fn manual() -> Self {
        Self::new(ManualTickSource, SchedulerConfig::default())
    }

    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Connect to the tick source. Safe to call any number of times; the
    /// source is connected at most once.
    pub fn bootstrap(&mut self) {
        if self.bootstrapped {
            return;
        }
        self.bootstrapped = true;
        self.source.connect();
        tracing::debug!(tick = self.clock.now(), "Scheduler connected to tick source");
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    /// Run `task` `delay` ticks from now.
    ///
    /// Tasks for the same tick run in the order they were scheduled. A zero
    /// delay targets the current tick, whose bucket has already been
    /// dispatched: the task is dropped, or deferred behind the running bucket
    /// when called from a task under [`SameTickPolicy::Defer`].
    pub fn schedule<F>(&mut self, delay: Tick, task: F) -> Scheduled
    where
        F: FnOnce(&mut TaskScheduler<C>, &mut C) -> Result<(), TaskError> + 'static,
    {
        self.bootstrap();

        let now = self.clock.now();
        let target = now.saturating_add(delay);

        if target > now {
            self.buckets.entry(target).or_default().push(Box::new(task));
            return Scheduled::At(target);
        }

        if self.dispatching == Some(now) && self.config.same_tick == SameTickPolicy::Defer {
            self.deferred.push_back(Box::new(task));
            return Scheduled::Deferred(target);
        }

        self.dropped += 1;
        tracing::warn!(
            tick = target,
            during_dispatch = self.dispatching.is_some(),
            "Task scheduled for an already dispatched tick will never run"
        );
        Scheduled::Dropped(target)
    }

    /// Handle one tick signal: advance the clock, then take and run the
    /// bucket for the new tick.
    ///
    /// Under [`FailurePolicy::FailFast`] the first failing task ends the tick:
    /// the rest of its bucket is discarded (the bucket is gone either way)
    /// and the error is returned.
    pub fn on_tick(&mut self, ctx: &mut C) -> Result<TickReport, SchedulerError> {
        let tick = self.clock.advance();
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };

        let Some(bucket) = self.buckets.remove(&tick) else {
            return Ok(report);
        };

        self.dispatching = Some(tick);
        let result = self.dispatch(tick, bucket, ctx, &mut report);
        self.dispatching = None;
        // Only non-empty when fail-fast aborted the tick
        self.deferred.clear();

        result.map(|()| report)
    }

    fn dispatch(
        &mut self,
        tick: Tick,
        bucket: Vec<Task<C>>,
        ctx: &mut C,
        report: &mut TickReport,
    ) -> Result<(), SchedulerError> {
        let mut primary: VecDeque<Task<C>> = bucket.into();
        let mut index = 0;

        loop {
            let task = match primary.pop_front() {
                Some(task) => task,
                None => match self.deferred.pop_front() {
                    Some(task) => {
                        report.deferred += 1;
                        task
                    }
                    None => break,
                },
            };

            match task(&mut *self, &mut *ctx) {
                Ok(()) => report.executed += 1,
                Err(source) => match self.config.on_failure {
                    FailurePolicy::FailFast => {
                        let discarded = primary.len() + self.deferred.len();
                        tracing::error!(
                            tick,
                            index,
                            discarded,
                            error = %source,
                            "Task failed, discarding the rest of this tick"
                        );
                        return Err(SchedulerError::TaskFailed {
                            tick,
                            index,
                            discarded,
                            source,
                        });
                    }
                    FailurePolicy::Isolate => {
                        report.failed += 1;
                        tracing::error!(tick, index, error = %source, "Task failed");
                    }
                },
            }
            index += 1;
        }

        Ok(())
    }

    // --- Introspection ---

    /// Number of distinct future ticks with at least one task.
    pub fn pending_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Tasks lost to scheduling for an already dispatched tick.
    pub fn dropped_tasks(&self) -> u64 {
        self.dropped
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatching.is_some()
    }
}

impl<C> fmt::Debug for TaskScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("now", &self.clock.now())
            .field("pending_buckets", &self.buckets.len())
            .field("dispatching", &self.dispatching)
            .field("bootstrapped", &self.bootstrapped)
            .field("config", &self.config)
            .field("dropped", &self.dropped)
            .finish_non_exhaustive()
    }
}
