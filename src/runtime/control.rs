//! Run-state token, generations, and operation outcomes
//!
//! Both drivers check and set the same [`RunState`] before mutating anything,
//! and every delayed continuation carries the [`Epoch`] it was scheduled in.

use serde::{Deserialize, Serialize};

use super::store::StoreSnapshot;
use super::types::{SessionId, SimTime};

/// Generation counter, bumped by every reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Epoch(pub u64);

impl Epoch {
    /// The following generation
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// Which driver currently owns the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    /// Nothing in progress
    #[default]
    Idle,
    /// The script player is stepping
    RunningScript,
    /// One or more ad-hoc tasks await completion
    RunningTasks {
        /// Tasks whose completion has not fired yet
        in_flight: usize,
    },
}

impl RunState {
    /// True while a scripted run is in progress
    pub fn is_simulating(&self) -> bool {
        matches!(self, RunState::RunningScript)
    }

    /// Claim the token for a scripted run
    pub fn try_begin_script(&mut self) -> Result<(), Rejection> {
        match self {
            RunState::Idle => {
                *self = RunState::RunningScript;
                Ok(())
            }
            RunState::RunningScript => Err(Rejection::ScriptRunning),
            RunState::RunningTasks { .. } => Err(Rejection::TasksInFlight),
        }
    }

    /// Claim (or share) the token for one more ad-hoc task
    pub fn try_begin_task(&mut self) -> Result<(), Rejection> {
        match self {
            RunState::Idle => {
                *self = RunState::RunningTasks { in_flight: 1 };
                Ok(())
            }
            RunState::RunningTasks { in_flight } => {
                *in_flight += 1;
                Ok(())
            }
            RunState::RunningScript => Err(Rejection::ScriptRunning),
        }
    }

    /// Release the token held by a finished scripted run
    pub fn finish_script(&mut self) {
        if *self == RunState::RunningScript {
            *self = RunState::Idle;
        }
    }

    /// Release one ad-hoc task's share of the token
    pub fn finish_task(&mut self) {
        if let RunState::RunningTasks { in_flight } = self {
            *in_flight = in_flight.saturating_sub(1);
            if *in_flight == 0 {
                *self = RunState::Idle;
            }
        }
    }
}

/// Reason a user operation was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// A scripted run is in progress
    ScriptRunning,
    /// Ad-hoc tasks are still in flight
    TasksInFlight,
    /// No agent with that id
    UnknownAgent,
}

/// Outcome of a user operation; ignoring it keeps the operation silent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "ignored operations are silent; inspect the outcome or drop it explicitly"]
pub enum Dispatch {
    /// The operation took effect
    Accepted,
    /// The operation was a no-op
    Ignored(Rejection),
}

impl Dispatch {
    /// Check if the operation took effect
    pub fn is_accepted(&self) -> bool {
        matches!(self, Dispatch::Accepted)
    }
}

impl From<Result<(), Rejection>> for Dispatch {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Dispatch::Accepted,
            Err(reason) => Dispatch::Ignored(reason),
        }
    }
}

/// Everything the presentation layer re-reads after a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimView {
    /// Simulator instance
    pub session: SessionId,
    /// Agents and global log
    pub snapshot: StoreSnapshot,
    /// Run-state token
    pub run_state: RunState,
    /// True while a scripted run is in progress
    pub is_simulating: bool,
    /// Current virtual time
    pub now: SimTime,
}
