//! Cancelable deferred tasks for the turn controller.
//!
//! The session never sleeps. It asks a [`Scheduler`] to deliver a [`Task`]
//! later and gets back a [`TaskHandle`]; when the task comes due, the host
//! hands the handle back to [`GameSession::fire`](crate::game::GameSession::fire).

use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskHandle(u64);

impl TaskHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Task {
    /// One second of the human's countdown has elapsed.
    CountdownTick,
    /// The computer's pacing delay has elapsed.
    ComputerMove,
}

pub trait Scheduler {
    fn schedule(&mut self, task: Task, delay: Duration) -> TaskHandle;

    /// Canceling an unknown or already fired handle is a no-op.
    fn cancel(&mut self, handle: TaskHandle);
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    handle: TaskHandle,
    task: Task,
    due: Duration,
}

/// Virtual-clock scheduler. Time only moves when the owner advances it.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    pending: Vec<Scheduled>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|s| s.handle == handle)
    }

    pub fn pending_tasks(&self) -> Vec<(TaskHandle, Task)> {
        self.pending.iter().map(|s| (s.handle, s.task)).collect()
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.iter().map(|s| s.due).min()
    }

    /// Removes the earliest task due at or before `until` and moves the
    /// clock to its due time. Equal due times pop in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TaskHandle, Task)> {
        let (idx, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= until)
            .min_by_key(|(_, s)| (s.due, s.handle))?;

        let scheduled = self.pending.remove(idx);
        self.now = self.now.max(scheduled.due);
        Some((scheduled.handle, scheduled.task))
    }

    /// Moves the clock forward without delivering anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, task: Task, delay: Duration) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled {
            handle,
            task,
            due: self.now + delay,
        });
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        self.pending.retain(|s| s.handle != handle);
    }
}
