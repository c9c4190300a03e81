//! Ad-hoc task driver
//!
//! A user-triggered task is two timed transitions on one agent: it starts
//! working immediately and goes back to idle once the task duration elapses.

use super::control::Epoch;
use super::engine::TransitionEngine;
use super::scheduler::{Scheduler, TimerAction, TimerId};
use super::types::{AgentId, AgentStatus};

/// Log line written when a task starts
pub fn start_message(label: &str) -> String {
    format!("Executing user task: \"{}\"", label)
}

/// Log line written when a task completes
pub fn completion_message(label: &str) -> String {
    format!("Task \"{}\" completed.", label)
}

/// Runs the two phases of an ad-hoc task
#[derive(Debug, Clone, Copy)]
pub struct TaskDriver {
    duration_ms: u64,
}

impl TaskDriver {
    /// Create a driver whose tasks take `duration_ms` to complete
    pub fn new(duration_ms: u64) -> Self {
        Self { duration_ms }
    }

    /// Time between the start and the completion phase
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Phase one: mark the agent working and queue the completion
    pub fn begin(
        &self,
        engine: &mut TransitionEngine<'_>,
        scheduler: &mut Scheduler,
        agent: &AgentId,
        label: &str,
        epoch: Epoch,
    ) -> TimerId {
        engine.fire(agent, Some(AgentStatus::Working), &start_message(label));
        tracing::debug!(%agent, label, "ad-hoc task started");

        scheduler.schedule(
            self.duration_ms,
            TimerAction::TaskComplete {
                agent: agent.clone(),
                label: label.to_string(),
                epoch,
            },
        )
    }

    /// Phase two: mark the agent idle and log the completion
    pub fn complete(&self, engine: &mut TransitionEngine<'_>, agent: &AgentId, label: &str) -> bool {
        let applied = engine.fire(agent, Some(AgentStatus::Idle), &completion_message(label));
        tracing::debug!(%agent, label, applied, "ad-hoc task completed");
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::roster::default_roster;
    use crate::runtime::store::EntityStore;
    use crate::runtime::types::{AgentName, DEFAULT_LOG_CAPACITY, SimTime};
    use chrono::Utc;

    #[test]
    fn test_messages() {
        assert_eq!(start_message("Set budget"), "Executing user task: \"Set budget\"");
        assert_eq!(completion_message("Set budget"), "Task \"Set budget\" completed.");
    }

    #[test]
    fn test_two_phases() {
        let mut store = EntityStore::new(default_roster(DEFAULT_LOG_CAPACITY));
        let mut scheduler = Scheduler::new();
        let budget = store.id_of(AgentName::Budget).unwrap().clone();
        let driver = TaskDriver::new(2500);

        let mut engine = TransitionEngine::new(&mut store, SimTime::zero(), Utc::now());
        driver.begin(&mut engine, &mut scheduler, &budget, "Set budget", Epoch(0));
        assert_eq!(store.agent(&budget).unwrap().status, AgentStatus::Working);

        let timer = scheduler.pop_due(SimTime(2500)).unwrap();
        assert_eq!(timer.due, SimTime(2500));
        let TimerAction::TaskComplete { agent, label, .. } = timer.action else {
            panic!("expected a task completion timer");
        };

        let mut engine = TransitionEngine::new(&mut store, timer.due, Utc::now());
        assert!(driver.complete(&mut engine, &agent, &label));

        let agent = store.agent(&budget).unwrap();
        assert_eq!(agent.status, AgentStatus::Idle);
        assert_eq!(agent.latest_activity(), "Task \"Set budget\" completed.");
        assert_eq!(store.global_log().len(), 2);
    }
}
