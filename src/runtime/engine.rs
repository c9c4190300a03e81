//! Transition engine: the only writer of the entity store
//!
//! Every status change and log append goes through here. Mutations that name
//! an agent the store does not know degrade to no-ops, since a delayed
//! callback may legitimately outlive the agent it was scheduled for.

use chrono::{DateTime, Utc};

use super::store::EntityStore;
use super::types::{AgentId, AgentName, AgentStatus, GlobalLogEntry, SimTime};

/// Borrowed mutation handle over the store, stamped with the current time
pub struct TransitionEngine<'a> {
    store: &'a mut EntityStore,
    now: SimTime,
    timestamp: DateTime<Utc>,
}

impl<'a> TransitionEngine<'a> {
    /// Create an engine that stamps log entries with `now` / `timestamp`
    pub fn new(store: &'a mut EntityStore, now: SimTime, timestamp: DateTime<Utc>) -> Self {
        Self {
            store,
            now,
            timestamp,
        }
    }

    /// Id of the agent playing `name`
    pub fn resolve(&self, name: AgentName) -> Option<AgentId> {
        self.store.id_of(name).cloned()
    }

    /// Replace one agent's status; returns false if the agent is unknown
    pub fn apply_status(&mut self, agent: &AgentId, status: AgentStatus) -> bool {
        match self.store.agent_mut(agent) {
            Some(a) => {
                a.status = status;
                true
            }
            None => false,
        }
    }

    /// Append to one agent's bounded log and to the global log
    ///
    /// An unknown agent leaves both logs untouched.
    pub fn append_log(&mut self, agent: &AgentId, message: &str) -> bool {
        let Some(a) = self.store.agent_mut(agent) else {
            return false;
        };
        a.log.push(message);
        let agent_name = a.name;

        self.store.push_global(GlobalLogEntry {
            agent: agent.clone(),
            agent_name,
            message: message.to_string(),
            timestamp: self.timestamp,
            at: self.now,
        });
        true
    }

    /// Combined mutation used when a step or task phase fires
    pub fn fire(&mut self, agent: &AgentId, status: Option<AgentStatus>, message: &str) -> bool {
        if self.store.agent(agent).is_none() {
            return false;
        }
        if let Some(status) = status {
            self.apply_status(agent, status);
        }
        self.append_log(agent, message)
    }

    /// Force every `Working` agent back to `Idle`
    ///
    /// Returns how many agents changed. Completed and alerted agents keep
    /// their status.
    pub fn settle_working(&mut self) -> usize {
        let mut settled = 0;
        for agent in self.store.agents_mut() {
            if agent.status == AgentStatus::Working {
                agent.status = AgentStatus::Idle;
                settled += 1;
            }
        }
        settled
    }

    /// Put the store back to its seed roster and drop the global log
    pub fn restore(&mut self) {
        self.store.restore_initial();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::roster::default_roster;
    use crate::runtime::types::DEFAULT_LOG_CAPACITY;

    fn store() -> EntityStore {
        EntityStore::new(default_roster(DEFAULT_LOG_CAPACITY))
    }

    fn engine(store: &mut EntityStore, at: u64) -> TransitionEngine<'_> {
        TransitionEngine::new(store, SimTime(at), Utc::now())
    }

    #[test]
    fn test_apply_status_touches_only_target() {
        let mut store = store();
        let vendor = store.id_of(AgentName::Vendor).unwrap().clone();
        let before = store.snapshot();

        assert!(engine(&mut store, 0).apply_status(&vendor, AgentStatus::Working));

        let after = store.snapshot();
        assert!(after.global_log.is_empty());
        for (old, new) in before.agents.iter().zip(after.agents.iter()) {
            if old.id == vendor {
                assert_eq!(new.status, AgentStatus::Working);
                assert_eq!(new.log, old.log);
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn test_unknown_agent_is_noop() {
        let mut store = store();
        let before = store.snapshot();
        let ghost = AgentId::new("ghost");

        let mut engine = engine(&mut store, 0);
        assert!(!engine.apply_status(&ghost, AgentStatus::Alert));
        assert!(!engine.append_log(&ghost, "boo"));
        assert!(!engine.fire(&ghost, Some(AgentStatus::Working), "boo"));

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_fire_sets_status_and_logs_both_places() {
        let mut store = store();
        let budget = store.id_of(AgentName::Budget).unwrap().clone();

        engine(&mut store, 250).fire(&budget, Some(AgentStatus::Working), "Allocating funds");

        let agent = store.agent(&budget).unwrap();
        assert_eq!(agent.status, AgentStatus::Working);
        assert_eq!(agent.latest_activity(), "Allocating funds");

        let entry = store.global_log().last().unwrap();
        assert_eq!(entry.agent, budget);
        assert_eq!(entry.agent_name, AgentName::Budget);
        assert_eq!(entry.at, SimTime(250));
    }

    #[test]
    fn test_fire_without_status_keeps_current() {
        let mut store = store();
        let guest = store.id_of(AgentName::GuestManagement).unwrap().clone();

        let mut engine = engine(&mut store, 0);
        engine.apply_status(&guest, AgentStatus::Alert);
        engine.fire(&guest, None, "Two RSVPs missing");

        assert_eq!(store.agent(&guest).unwrap().status, AgentStatus::Alert);
    }

    #[test]
    fn test_settle_working_leaves_completed_and_alert() {
        let mut store = store();
        let planning = store.id_of(AgentName::Planning).unwrap().clone();
        let vendor = store.id_of(AgentName::Vendor).unwrap().clone();
        let budget = store.id_of(AgentName::Budget).unwrap().clone();

        let mut engine = engine(&mut store, 0);
        engine.apply_status(&planning, AgentStatus::Working);
        engine.apply_status(&vendor, AgentStatus::Completed);
        engine.apply_status(&budget, AgentStatus::Alert);
        assert_eq!(engine.settle_working(), 1);

        assert_eq!(store.agent(&planning).unwrap().status, AgentStatus::Idle);
        assert_eq!(store.agent(&vendor).unwrap().status, AgentStatus::Completed);
        assert_eq!(store.agent(&budget).unwrap().status, AgentStatus::Alert);
    }
}
