//! Simulator orchestrator and public API
//!
//! This module provides the main `Simulator` struct that owns the entity store,
//! the virtual-time scheduler, the script player, and the ad-hoc task driver,
//! and exposes the operations the presentation layer invokes.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

// Submodules
pub mod control;
pub mod driver;
pub mod engine;
pub mod error;
pub mod roster;
pub mod scheduler;
pub mod script;
pub mod storage;
pub mod store;
pub mod task;
pub mod types;

use control::{Dispatch, Epoch, Rejection, RunState, SimView};
use engine::TransitionEngine;
use error::{ConfigError, ConfigResult};
use scheduler::{Scheduler, TimerAction};
use script::{Script, ScriptPlayer, StepOutcome};
use store::{EntityStore, StoreSnapshot};
use task::TaskDriver;
use types::{Agent, AgentId, AgentProfile, SessionId, SimTime, DEFAULT_LOG_CAPACITY};

/// Configuration for the simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Entries retained per agent log
    pub log_capacity: usize,

    /// Delay between a script step and its settle status (ms)
    pub settle_delay_ms: u64,

    /// Time an ad-hoc task takes to complete (ms)
    pub task_duration_ms: u64,

    /// Real-time playback factor (1.0 = real time, 0.0 = instant)
    pub time_scale: f64,

    /// Roster file to use instead of the built-in roster
    pub roster: Option<PathBuf>,

    /// Script file to use instead of the built-in script
    pub script: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            settle_delay_ms: 1500,
            task_duration_ms: 2500,
            time_scale: 1.0,
            roster: None,
            script: None,
        }
    }
}

impl SimConfig {
    /// Check value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.log_capacity == 0 {
            return Err(ConfigError::ZeroLogCapacity);
        }
        check_time_scale(self.time_scale)?;
        Ok(())
    }
}

/// Check a playback speed factor, returning it unchanged if usable
pub fn check_time_scale(time_scale: f64) -> ConfigResult<f64> {
    if !time_scale.is_finite() || time_scale < 0.0 {
        return Err(ConfigError::InvalidTimeScale(time_scale));
    }
    Ok(time_scale)
}

fn validate_roster(profiles: &[AgentProfile]) -> ConfigResult<()> {
    if profiles.is_empty() {
        return Err(ConfigError::EmptyRoster);
    }
    for (i, profile) in profiles.iter().enumerate() {
        let earlier = &profiles[..i];
        if earlier.iter().any(|p| p.id == profile.id) {
            return Err(ConfigError::DuplicateAgentId(profile.id.clone()));
        }
        if earlier.iter().any(|p| p.name == profile.name) {
            return Err(ConfigError::DuplicateAgentName(profile.name));
        }
    }
    Ok(())
}

/// The simulator
///
/// Owns all state; every mutation goes through the transition engine, and every
/// delayed continuation is a [`TimerAction`] fired by [`Simulator::advance_to`].
pub struct Simulator {
    config: SimConfig,
    session: SessionId,
    anchor: DateTime<Utc>,
    store: EntityStore,
    scheduler: Scheduler,
    player: ScriptPlayer,
    tasks: TaskDriver,
    run_state: RunState,
    epoch: Epoch,
    views: watch::Sender<SimView>,
}

impl Simulator {
    /// Create a simulator from explicit roster and script
    pub fn new(config: SimConfig, profiles: Vec<AgentProfile>, script: Script) -> error::Result<Self> {
        config.validate()?;
        validate_roster(&profiles)?;
        let roles: Vec<_> = profiles.iter().map(|p| p.name).collect();
        script.validate(&roles)?;

        let roster: Vec<Agent> = roster::roster_from_profiles(profiles, config.log_capacity);
        let store = EntityStore::new(roster);
        let session = SessionId::new();

        let initial = SimView {
            session,
            snapshot: store.snapshot(),
            run_state: RunState::Idle,
            is_simulating: false,
            now: SimTime::zero(),
        };
        let (views, _) = watch::channel(initial);

        tracing::debug!(%session, agents = store.agents().len(), steps = script.len(), "simulator created");

        Ok(Self {
            tasks: TaskDriver::new(config.task_duration_ms),
            config,
            session,
            anchor: Utc::now(),
            store,
            scheduler: Scheduler::new(),
            player: ScriptPlayer::new(script),
            run_state: RunState::Idle,
            epoch: Epoch::default(),
            views,
        })
    }

    /// Create a simulator with the built-in roster and script
    pub fn with_defaults(config: SimConfig) -> error::Result<Self> {
        Self::new(config, roster::default_profiles(), roster::default_script())
    }

    /// Create a simulator from a config, loading any roster/script files it names
    ///
    /// Relative paths in the config are resolved against `base`.
    pub fn from_config(config: SimConfig, base: &std::path::Path) -> error::Result<Self> {
        let files = storage::Storage::new(base.to_path_buf());
        let profiles = match &config.roster {
            Some(path) => storage::load_roster(&files.resolve(path))?,
            None => roster::default_profiles(),
        };
        let script = match &config.script {
            Some(path) => storage::load_script(&files.resolve(path))?,
            None => roster::default_script(),
        };
        Self::new(config, profiles, script)
    }

    /// Load a simulator from the config file stored under `root`
    pub fn load(root: PathBuf) -> error::Result<Self> {
        let config = storage::load_config(&root)?;
        Self::from_config(config, &root)
    }

    /// Pin the wall-clock instant that virtual time zero maps to
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor;
        self
    }

    /// Get the current configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Identifier of this simulator instance
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// The script being played
    pub fn script(&self) -> &Script {
        self.player.script()
    }

    /// Read access to the entity store
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Copy of the agents and global log
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// True while a scripted run is in progress
    pub fn is_simulating(&self) -> bool {
        self.run_state.is_simulating()
    }

    /// Current run-state token
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Current generation
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Current virtual time
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    /// Number of timers waiting to fire, stale ones included
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Everything the presentation layer renders
    pub fn view(&self) -> SimView {
        SimView {
            session: self.session,
            snapshot: self.store.snapshot(),
            run_state: self.run_state,
            is_simulating: self.is_simulating(),
            now: self.now(),
        }
    }

    /// Receive a fresh [`SimView`] after every mutation
    pub fn subscribe(&self) -> watch::Receiver<SimView> {
        self.views.subscribe()
    }

    /// Start the scripted run
    ///
    /// Ignored while a run or ad-hoc tasks are in progress. Step 0 is
    /// dispatched before this returns.
    pub fn start(&mut self) -> Dispatch {
        if let Err(reason) = self.run_state.try_begin_script() {
            tracing::debug!(?reason, "start ignored");
            return Dispatch::Ignored(reason);
        }

        tracing::info!(session = %self.session, steps = self.player.script().len(), "scripted run started");
        self.player.rewind();
        self.dispatch_step();
        self.publish();
        Dispatch::Accepted
    }

    /// Stop any run and restore the initial roster
    ///
    /// Cancels the pending next-step timer and bumps the epoch so that
    /// settle and task timers already in the queue fire as no-ops.
    pub fn reset(&mut self) {
        self.player.cancel(&mut self.scheduler);
        self.epoch = self.epoch.next();
        self.run_state = RunState::Idle;
        self.engine().restore();

        tracing::info!(session = %self.session, epoch = self.epoch.0, "simulation reset");
        self.publish();
    }

    /// Run an ad-hoc task on one agent
    ///
    /// Ignored while a scripted run is in progress or if the agent is unknown.
    pub fn run_task(&mut self, agent: &AgentId, label: &str) -> Dispatch {
        if self.is_simulating() {
            tracing::debug!(%agent, label, "task ignored during scripted run");
            return Dispatch::Ignored(Rejection::ScriptRunning);
        }
        if self.store.agent(agent).is_none() {
            tracing::debug!(%agent, label, "task ignored for unknown agent");
            return Dispatch::Ignored(Rejection::UnknownAgent);
        }
        if let Err(reason) = self.run_state.try_begin_task() {
            return Dispatch::Ignored(reason);
        }

        let epoch = self.epoch;
        let tasks = self.tasks;
        let (now, timestamp) = (self.now(), self.timestamp());
        let mut engine = TransitionEngine::new(&mut self.store, now, timestamp);
        tasks.begin(&mut engine, &mut self.scheduler, agent, label, epoch);

        self.publish();
        Dispatch::Accepted
    }

    /// Advance virtual time by `millis`, firing everything that comes due
    ///
    /// Returns the number of timers fired.
    pub fn advance(&mut self, millis: u64) -> usize {
        let target = self.now().after(millis);
        self.advance_to(target)
    }

    /// Advance virtual time to `target`, firing everything due up to it
    pub fn advance_to(&mut self, target: SimTime) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.scheduler.pop_due(target) {
            self.fire(timer.action);
            fired += 1;
        }
        self.scheduler.advance_clock(target);
        fired
    }

    /// Fire timers until none remain
    pub fn run_until_idle(&mut self) -> usize {
        let mut fired = 0;
        while let Some(due) = self.scheduler.next_due() {
            fired += self.advance_to(due);
        }
        fired
    }

    /// Due time of the earliest pending timer
    pub fn next_deadline(&mut self) -> Option<SimTime> {
        self.scheduler.next_due()
    }

    /// Drop every pending timer without touching agent state
    ///
    /// Any run or task in progress is abandoned, so the simulator accepts
    /// `start` and `run_task` again afterwards.
    pub fn shutdown(&mut self) {
        self.scheduler.clear();
        self.player.cancel(&mut self.scheduler);
        self.epoch = self.epoch.next();
        self.run_state = RunState::Idle;
        tracing::debug!(session = %self.session, "simulator shut down");
        self.publish();
    }

    fn fire(&mut self, action: TimerAction) {
        if action.epoch() != self.epoch {
            tracing::trace!(?action, current = self.epoch.0, "discarding stale timer");
            return;
        }

        match action {
            TimerAction::NextStep { .. } => self.dispatch_step(),
            TimerAction::Settle { agent, status, .. } => {
                let applied = self.engine().apply_status(&agent, status);
                tracing::debug!(%agent, %status, applied, "settle status applied");
            }
            TimerAction::TaskComplete { agent, label, .. } => {
                let tasks = self.tasks;
                tasks.complete(&mut self.engine(), &agent, &label);
                self.run_state.finish_task();
            }
        }
        self.publish();
    }

    fn dispatch_step(&mut self) {
        let epoch = self.epoch;
        let settle_delay = self.config.settle_delay_ms;
        let (now, timestamp) = (self.now(), self.timestamp());
        let mut engine = TransitionEngine::new(&mut self.store, now, timestamp);

        match self.player.dispatch(&mut engine, &mut self.scheduler, epoch, settle_delay) {
            StepOutcome::Dispatched { index } => {
                tracing::debug!(index, at = %now, "script step dispatched");
            }
            StepOutcome::Finished => {
                let settled = engine.settle_working();
                self.run_state.finish_script();
                tracing::info!(session = %self.session, settled, at = %now, "scripted run finished");
            }
        }
    }

    fn engine(&mut self) -> TransitionEngine<'_> {
        let (now, timestamp) = (self.now(), self.timestamp());
        TransitionEngine::new(&mut self.store, now, timestamp)
    }

    fn timestamp(&self) -> DateTime<Utc> {
        i64::try_from(self.now().as_millis())
            .ok()
            .and_then(Duration::try_milliseconds)
            .and_then(|elapsed| self.anchor.checked_add_signed(elapsed))
            .unwrap_or(self.anchor)
    }

    fn publish(&self) {
        self.views.send_replace(self.view());
    }
}

/// Clonable handle to a simulator shared between tasks
#[derive(Clone)]
pub struct SharedSimulator {
    inner: Arc<Mutex<Simulator>>,
}

impl SharedSimulator {
    /// Wrap a simulator
    pub fn new(simulator: Simulator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(simulator)),
        }
    }

    /// Run `f` with exclusive access to the simulator
    pub fn with<R>(&self, f: impl FnOnce(&mut Simulator) -> R) -> R {
        f(&mut *self.inner.lock())
    }

    /// Start the scripted run
    pub fn start(&self) -> Dispatch {
        self.with(Simulator::start)
    }

    /// Stop any run and restore the initial roster
    pub fn reset(&self) {
        self.with(Simulator::reset)
    }

    /// Run an ad-hoc task on one agent
    pub fn run_task(&self, agent: &AgentId, label: &str) -> Dispatch {
        self.with(|sim| sim.run_task(agent, label))
    }

    /// Everything the presentation layer renders
    pub fn view(&self) -> SimView {
        self.with(|sim| sim.view())
    }

    /// Receive a fresh view after every mutation
    pub fn subscribe(&self) -> watch::Receiver<SimView> {
        self.with(|sim| sim.subscribe())
    }
}
