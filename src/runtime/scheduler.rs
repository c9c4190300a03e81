//! Deterministic virtual-time timer queue
//!
//! Stands in for the single-threaded event loop: delayed continuations are
//! queued as data, ordered by due time and then by scheduling order, and
//! fired one at a time by the simulator.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use super::control::Epoch;
use super::types::{AgentId, AgentStatus, SimTime};

/// Handle to a scheduled timer, usable for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Continuation to run when a timer comes due
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    /// Dispatch the script player's next step
    NextStep {
        /// Generation the timer was scheduled in
        epoch: Epoch,
    },
    /// Delayed status-only mutation following a script step
    Settle {
        /// Agent to update
        agent: AgentId,
        /// Status to apply
        status: AgentStatus,
        /// Generation the timer was scheduled in
        epoch: Epoch,
    },
    /// Second phase of an ad-hoc task
    TaskComplete {
        /// Agent running the task
        agent: AgentId,
        /// Task label
        label: String,
        /// Generation the timer was scheduled in
        epoch: Epoch,
    },
}

impl TimerAction {
    /// Generation the timer was scheduled in
    pub fn epoch(&self) -> Epoch {
        match self {
            TimerAction::NextStep { epoch }
            | TimerAction::Settle { epoch, .. }
            | TimerAction::TaskComplete { epoch, .. } => *epoch,
        }
    }
}

/// Timer waiting in the queue
#[derive(Debug, Clone)]
pub struct ScheduledTimer {
    /// Handle
    pub id: TimerId,
    /// When it fires
    pub due: SimTime,
    /// What it does
    pub action: TimerAction,
}

impl PartialEq for ScheduledTimer {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}

impl Eq for ScheduledTimer {}

impl PartialOrd for ScheduledTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTimer {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest due first, then FIFO)
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Virtual-time scheduler
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Pending timers (min-heap by due time)
    queue: BinaryHeap<ScheduledTimer>,

    /// Ids that are still pending; cancelled ids are dropped lazily
    live: HashSet<TimerId>,

    /// Current virtual time
    now: SimTime,

    /// Next id to hand out; ids double as FIFO sequence numbers
    next_id: u64,
}

impl Scheduler {
    /// Create an empty scheduler at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Queue `action` to fire `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u64, action: TimerAction) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        self.queue.push(ScheduledTimer {
            id,
            due: self.now.after(delay_ms),
            action,
        });
        self.live.insert(id);
        id
    }

    /// Cancel a pending timer; returns false if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.live.remove(&id)
    }

    /// Check whether a timer is still pending
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.live.contains(&id)
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&mut self) -> Option<SimTime> {
        self.discard_cancelled();
        self.queue.peek().map(|t| t.due)
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to it
    pub fn pop_due(&mut self, until: SimTime) -> Option<ScheduledTimer> {
        self.discard_cancelled();
        if self.queue.peek()?.due > until {
            return None;
        }

        let timer = self.queue.pop()?;
        self.live.remove(&timer.id);
        if timer.due > self.now {
            self.now = timer.due;
        }
        Some(timer)
    }

    /// Move the clock forward without firing anything
    pub fn advance_clock(&mut self, to: SimTime) {
        if to > self.now {
            self.now = to;
        }
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.queue.clear();
        self.live.clear();
    }

    /// Check if any timers are pending
    pub fn has_pending(&self) -> bool {
        !self.live.is_empty()
    }

    /// Get the number of pending timers
    pub fn pending_count(&self) -> usize {
        self.live.len()
    }

    fn discard_cancelled(&mut self) {
        while let Some(top) = self.queue.peek() {
            if self.live.contains(&top.id) {
                break;
            }
            self.queue.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(epoch: u64) -> TimerAction {
        TimerAction::NextStep {
            epoch: Epoch(epoch),
        }
    }

    #[test]
    fn test_scheduler_schedule() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(100, step(0));
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.next_due(), Some(SimTime(100)));
    }

    #[test]
    fn test_scheduler_ordering() {
        let mut scheduler = Scheduler::new();
        let late = scheduler.schedule(300, step(0));
        let early = scheduler.schedule(100, step(0));
        let tie = scheduler.schedule(100, step(1));

        let first = scheduler.pop_due(SimTime(1000)).unwrap();
        let second = scheduler.pop_due(SimTime(1000)).unwrap();
        let third = scheduler.pop_due(SimTime(1000)).unwrap();

        assert_eq!(first.id, early);
        assert_eq!(second.id, tie);
        assert_eq!(third.id, late);
        assert_eq!(scheduler.now(), SimTime(300));
    }

    #[test]
    fn test_pop_due_respects_horizon() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(500, step(0));

        assert!(scheduler.pop_due(SimTime(499)).is_none());
        assert_eq!(scheduler.now(), SimTime(0));
        assert!(scheduler.pop_due(SimTime(500)).is_some());
    }

    #[test]
    fn test_cancel_skips_timer() {
        let mut scheduler = Scheduler::new();
        let cancelled = scheduler.schedule(100, step(0));
        let kept = scheduler.schedule(200, step(0));

        assert!(scheduler.cancel(cancelled));
        assert!(!scheduler.cancel(cancelled));
        assert_eq!(scheduler.next_due(), Some(SimTime(200)));
        assert_eq!(scheduler.pop_due(SimTime(1000)).unwrap().id, kept);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_delays_are_relative_to_clock() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_clock(SimTime(1000));
        scheduler.schedule(1500, step(0));
        assert_eq!(scheduler.next_due(), Some(SimTime(2500)));

        // The clock never runs backwards
        scheduler.advance_clock(SimTime(10));
        assert_eq!(scheduler.now(), SimTime(1000));
    }
}
