//! Cooperative Periodic Task Scheduler
//!
//! ## Overview
//!
//! The control loop calls [`Scheduler::run_pending`] once per iteration. Every
//! task whose due time has passed runs exactly once, in registration order,
//! and is rescheduled one period after *now*:
//!
//! ```text
//! period = 2000, registered at t = 0
//!
//! tick:   0   500  1000  1500  2010  2500  ...  4010  ...  6010
//! fires:                       ✓                 ✓          ✓
//! next:  2000                 4010              6010       8010
//! ```
//!
//! This is fixed-period, not fixed-rate. A tick that arrives late (say the loop
//! spent a second in a blocking ramp) runs the task once and pushes the next
//! due time out; it never fires a burst of catch-up runs.
//!
//! ## Tasks
//!
//! Handlers are plain function pointers taking a mutable context, so the task
//! table needs no allocation and handlers can reach all gateway state through
//! the one context value. Handlers must not block; the blocking actuator ramp
//! is never run from a task.

use crate::errors::{GatewayError, GatewayResult};
use crate::time::Timestamp;

/// Task body; receives the shared context and the tick time
pub type TaskHandler<C> = fn(&mut C, Timestamp);

/// Handle returned by [`Scheduler::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId(usize);

/// One periodic task
pub struct PeriodicTask<C> {
    name: &'static str,
    handler: TaskHandler<C>,
    period_ms: u32,
    next_due: Timestamp,
    runs: u32,
}

impl<C> PeriodicTask<C> {
    /// Task name for logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Period in milliseconds
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// When the task next becomes due
    pub fn next_due(&self) -> Timestamp {
        self.next_due
    }

    /// How many times the task has run
    pub fn runs(&self) -> u32 {
        self.runs
    }
}

/// Fixed-capacity periodic task runner
pub struct Scheduler<C, const N: usize> {
    tasks: heapless::Vec<PeriodicTask<C>, N>,
}

impl<C, const N: usize> Scheduler<C, N> {
    /// Empty scheduler
    pub const fn new() -> Self {
        Self { tasks: heapless::Vec::new() }
    }

    /// Add a task; first run is one period after `now`
    pub fn register(
        &mut self,
        name: &'static str,
        period_ms: u32,
        handler: TaskHandler<C>,
        now: Timestamp,
    ) -> GatewayResult<TaskId> {
        if period_ms == 0 {
            return Err(GatewayError::InvalidConfig { reason: "task period must be non-zero" });
        }

        let id = TaskId(self.tasks.len());
        self.tasks
            .push(PeriodicTask {
                name,
                handler,
                period_ms,
                next_due: now + period_ms as Timestamp,
                runs: 0,
            })
            .map_err(|_| GatewayError::SchedulerFull { capacity: N })?;

        log_debug!("task '{}' registered every {} ms", name, period_ms);
        Ok(id)
    }

    /// Run every due task once; returns how many ran
    pub fn run_pending(&mut self, ctx: &mut C, now: Timestamp) -> usize {
        let mut ran = 0;
        for task in self.tasks.iter_mut() {
            if now < task.next_due {
                continue;
            }
            (task.handler)(ctx, now);
            task.next_due = now + task.period_ms as Timestamp;
            task.runs = task.runs.wrapping_add(1);
            ran += 1;
        }
        ran
    }

    /// Look up a task
    pub fn task(&self, id: TaskId) -> Option<&PeriodicTask<C>> {
        self.tasks.get(id.0)
    }

    /// Milliseconds until the earliest task is due (0 if one is due now)
    ///
    /// Lets the loop sleep between ticks. `None` when no tasks are registered.
    pub fn time_until_next(&self, now: Timestamp) -> Option<u64> {
        self.tasks
            .iter()
            .map(|task| task.next_due.saturating_sub(now))
            .min()
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are registered
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<C, const N: usize> Default for Scheduler<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        fired: heapless::Vec<(u8, Timestamp), 32>,
    }

    fn task_a(log: &mut Log, now: Timestamp) {
        let _ = log.fired.push((b'a', now));
    }

    fn task_b(log: &mut Log, now: Timestamp) {
        let _ = log.fired.push((b'b', now));
    }

    #[test]
    fn fixed_period_despite_jitter() {
        let mut scheduler: Scheduler<Log, 2> = Scheduler::new();
        let mut log = Log::default();
        scheduler.register("a", 2000, task_a, 0).unwrap();

        for now in [0, 700, 1300, 1999, 2003, 2600, 3100, 4000, 4007, 5200, 6001, 6500] {
            scheduler.run_pending(&mut log, now);
        }

        let times: heapless::Vec<Timestamp, 8> = log.fired.iter().map(|(_, t)| *t).collect();
        assert_eq!(times.as_slice(), &[2003, 4007, 6500]);
    }

    #[test]
    fn late_tick_does_not_burst() {
        let mut scheduler: Scheduler<Log, 2> = Scheduler::new();
        let mut log = Log::default();
        scheduler.register("a", 500, task_a, 0).unwrap();

        // Loop stalled for 3 s
        assert_eq!(scheduler.run_pending(&mut log, 3000), 1);
        assert_eq!(scheduler.run_pending(&mut log, 3001), 0);
        assert_eq!(scheduler.run_pending(&mut log, 3500), 1);
        assert_eq!(log.fired.len(), 2);
    }

    #[test]
    fn same_tick_runs_in_registration_order() {
        let mut scheduler: Scheduler<Log, 2> = Scheduler::new();
        let mut log = Log::default();
        scheduler.register("b", 1000, task_b, 0).unwrap();
        scheduler.register("a", 1000, task_a, 0).unwrap();

        scheduler.run_pending(&mut log, 1000);
        assert_eq!(log.fired.as_slice(), &[(b'b', 1000), (b'a', 1000)]);
    }

    #[test]
    fn registration_limits() {
        let mut scheduler: Scheduler<Log, 1> = Scheduler::new();
        assert!(matches!(
            scheduler.register("zero", 0, task_a, 0),
            Err(GatewayError::InvalidConfig { .. })
        ));

        let id = scheduler.register("a", 100, task_a, 50).unwrap();
        assert_eq!(scheduler.task(id).unwrap().next_due(), 150);
        assert_eq!(
            scheduler.register("b", 100, task_b, 0),
            Err(GatewayError::SchedulerFull { capacity: 1 })
        );
    }

    #[test]
    fn time_until_next_due() {
        let mut scheduler: Scheduler<Log, 2> = Scheduler::new();
        assert_eq!(scheduler.time_until_next(0), None);

        scheduler.register("a", 500, task_a, 0).unwrap();
        scheduler.register("b", 2000, task_b, 0).unwrap();
        assert_eq!(scheduler.time_until_next(100), Some(400));
        assert_eq!(scheduler.time_until_next(900), Some(0));
    }
}
