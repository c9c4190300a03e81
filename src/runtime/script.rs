//! Scripted timeline: steps, scripts, and the player that walks them
//!
//! The player keeps a cursor into the script and at most one pending
//! "next step" timer. Each dispatched step may also leave behind an
//! independent settle timer that later overwrites its agent's status.

use serde::{Deserialize, Serialize};

use super::control::Epoch;
use super::engine::TransitionEngine;
use super::error::{ConfigError, ConfigResult};
use super::scheduler::{Scheduler, TimerAction, TimerId};
use super::types::{AgentName, AgentStatus};

/// One timed event of a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Agent the step acts on
    pub agent: AgentName,
    /// Message appended to the agent log and the global log
    pub message: String,
    /// Status applied when the step fires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AgentStatus>,
    /// Status applied by the delayed settle timer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_status: Option<AgentStatus>,
    /// Milliseconds before the next step is dispatched
    pub delay_ms: u64,
}

impl ScriptStep {
    /// Step that only logs a message
    pub fn new(agent: AgentName, message: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            agent,
            message: message.into(),
            status: None,
            target_status: None,
            delay_ms,
        }
    }

    /// Also set `status` when the step fires
    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Also settle the agent to `status` shortly after the step fires
    pub fn settling_to(mut self, status: AgentStatus) -> Self {
        self.target_status = Some(status);
        self
    }
}

/// Ordered list of script steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    steps: Vec<ScriptStep>,
}

impl Script {
    /// Wrap a list of steps
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self { steps }
    }

    /// Steps in dispatch order
    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if the script has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Virtual time from start until the run completes
    pub fn duration_ms(&self) -> u64 {
        self.steps.iter().map(|s| s.delay_ms).sum()
    }

    /// Check that every step names a role present in `roles`
    pub fn validate(&self, roles: &[AgentName]) -> ConfigResult<()> {
        for (index, step) in self.steps.iter().enumerate() {
            if !roles.contains(&step.agent) {
                return Err(ConfigError::UnknownScriptAgent {
                    index,
                    agent: step.agent,
                });
            }
        }
        Ok(())
    }
}

/// What happened when the player was asked to dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step `index` fired and the next one is scheduled
    Dispatched {
        /// Position of the fired step
        index: usize,
    },
    /// The cursor reached the end of the script
    Finished,
}

/// Walks a script, one timer at a time
#[derive(Debug)]
pub struct ScriptPlayer {
    script: Script,
    cursor: usize,
    pending: Option<TimerId>,
}

impl ScriptPlayer {
    /// Create a player positioned at the first step
    pub fn new(script: Script) -> Self {
        Self {
            script,
            cursor: 0,
            pending: None,
        }
    }

    /// The script being played
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Index of the next step to dispatch
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The outstanding next-step timer, if any
    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }

    /// Rewind to the first step
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Cancel the outstanding next-step timer and rewind
    pub fn cancel(&mut self, scheduler: &mut Scheduler) {
        if let Some(timer) = self.pending.take() {
            scheduler.cancel(timer);
        }
        self.rewind();
    }

    /// Fire the step under the cursor and schedule its successor
    ///
    /// The step's own effects are applied before the successor is queued, so
    /// step `i + 1` can never observe a state that lacks step `i`.
    pub fn dispatch(
        &mut self,
        engine: &mut TransitionEngine<'_>,
        scheduler: &mut Scheduler,
        epoch: Epoch,
        settle_delay_ms: u64,
    ) -> StepOutcome {
        let Some(step) = self.script.steps.get(self.cursor) else {
            if let Some(timer) = self.pending.take() {
                scheduler.cancel(timer);
            }
            return StepOutcome::Finished;
        };
        let index = self.cursor;

        match engine.resolve(step.agent) {
            Some(agent) => {
                engine.fire(&agent, step.status, &step.message);
                if let Some(status) = step.target_status {
                    scheduler.schedule(
                        settle_delay_ms,
                        TimerAction::Settle {
                            agent,
                            status,
                            epoch,
                        },
                    );
                }
            }
            None => {
                tracing::debug!(index, agent = %step.agent, "script step names an absent agent");
            }
        }

        self.cursor += 1;
        if let Some(previous) = self.pending.take() {
            scheduler.cancel(previous);
        }
        self.pending = Some(scheduler.schedule(step.delay_ms, TimerAction::NextStep { epoch }));

        StepOutcome::Dispatched { index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::roster::default_roster;
    use crate::runtime::store::EntityStore;
    use crate::runtime::types::{DEFAULT_LOG_CAPACITY, SimTime};
    use chrono::Utc;

    fn two_steps() -> Script {
        Script::new(vec![
            ScriptStep::new(AgentName::Vendor, "Contacting caterer", 1000)
                .with_status(AgentStatus::Working)
                .settling_to(AgentStatus::Completed),
            ScriptStep::new(AgentName::Budget, "Logging deposit", 500),
        ])
    }

    #[test]
    fn test_dispatch_schedules_next_and_settle() {
        let mut store = EntityStore::new(default_roster(DEFAULT_LOG_CAPACITY));
        let mut scheduler = Scheduler::new();
        let mut player = ScriptPlayer::new(two_steps());

        let mut engine = TransitionEngine::new(&mut store, SimTime::zero(), Utc::now());
        let outcome = player.dispatch(&mut engine, &mut scheduler, Epoch(0), 1500);

        assert_eq!(outcome, StepOutcome::Dispatched { index: 0 });
        assert_eq!(player.cursor(), 1);
        // Settle timer plus the single next-step timer
        assert_eq!(scheduler.pending_count(), 2);
        assert!(scheduler.is_pending(player.pending().unwrap()));
        assert_eq!(scheduler.next_due(), Some(SimTime(1000)));
    }

    #[test]
    fn test_only_one_next_step_timer_outstanding() {
        let mut store = EntityStore::new(default_roster(DEFAULT_LOG_CAPACITY));
        let mut scheduler = Scheduler::new();
        let mut player = ScriptPlayer::new(Script::new(vec![
            ScriptStep::new(AgentName::Vendor, "one", 1000),
            ScriptStep::new(AgentName::Vendor, "two", 1000),
        ]));

        let mut engine = TransitionEngine::new(&mut store, SimTime::zero(), Utc::now());
        player.dispatch(&mut engine, &mut scheduler, Epoch(0), 1500);
        let first = player.pending().unwrap();
        player.dispatch(&mut engine, &mut scheduler, Epoch(0), 1500);

        assert!(!scheduler.is_pending(first));
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_finished_at_end_of_script() {
        let mut store = EntityStore::new(default_roster(DEFAULT_LOG_CAPACITY));
        let mut scheduler = Scheduler::new();
        let mut player = ScriptPlayer::new(Script::default());

        let mut engine = TransitionEngine::new(&mut store, SimTime::zero(), Utc::now());
        let outcome = player.dispatch(&mut engine, &mut scheduler, Epoch(0), 1500);

        assert_eq!(outcome, StepOutcome::Finished);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_cancel_rewinds_and_drops_timer() {
        let mut store = EntityStore::new(default_roster(DEFAULT_LOG_CAPACITY));
        let mut scheduler = Scheduler::new();
        let mut player = ScriptPlayer::new(two_steps());

        let mut engine = TransitionEngine::new(&mut store, SimTime::zero(), Utc::now());
        player.dispatch(&mut engine, &mut scheduler, Epoch(0), 1500);
        let pending = player.pending().unwrap();
        player.cancel(&mut scheduler);

        assert_eq!(player.cursor(), 0);
        assert!(player.pending().is_none());
        assert!(!scheduler.is_pending(pending));
    }

    #[test]
    fn test_validate_rejects_unknown_role() {
        let script = two_steps();
        assert!(script.validate(&AgentName::ALL).is_ok());

        let err = script.validate(&[AgentName::Vendor]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownScriptAgent {
                index: 1,
                agent: AgentName::Budget
            }
        ));
    }

    #[test]
    fn test_step_json_shape() {
        let json = r#"{"agent":"vendor","message":"Contacting caterer","status":"working","delay_ms":1000}"#;
        let step: ScriptStep = serde_json::from_str(json).unwrap();
        assert_eq!(step.status, Some(AgentStatus::Working));
        assert_eq!(step.target_status, None);
        assert_eq!(two_steps().duration_ms(), 1500);
    }
}
