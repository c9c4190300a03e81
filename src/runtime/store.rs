//! Entity store: live agents, the global log, and the reset snapshot
//!
//! The store is plain data. Its mutators are crate-private and only the
//! transition engine calls them; everyone else reads through snapshots.

use serde::{Deserialize, Serialize};

use super::types::{Agent, AgentId, AgentName, AgentStatus, GlobalLogEntry};

/// Read-only projection of the store handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Agents in roster order
    pub agents: Vec<Agent>,
    /// Global log, oldest first
    pub global_log: Vec<GlobalLogEntry>,
}

impl StoreSnapshot {
    /// Look up an agent by id
    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| &a.id == id)
    }

    /// Look up an agent by role
    pub fn agent_named(&self, name: AgentName) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }
}

/// Current agents and global log plus the roster they were seeded from
#[derive(Debug, Clone)]
pub struct EntityStore {
    agents: Vec<Agent>,
    global_log: Vec<GlobalLogEntry>,
    initial: Vec<Agent>,
}

impl EntityStore {
    /// Seed a store; `roster` doubles as the reset snapshot
    pub fn new(roster: Vec<Agent>) -> Self {
        Self {
            agents: roster.clone(),
            global_log: Vec::new(),
            initial: roster,
        }
    }

    /// Agents in roster order
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Global log, oldest first
    pub fn global_log(&self) -> &[GlobalLogEntry] {
        &self.global_log
    }

    /// The roster the store resets to
    pub fn initial(&self) -> &[Agent] {
        &self.initial
    }

    /// Look up an agent by id
    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| &a.id == id)
    }

    /// Resolve a role to the id of the agent playing it
    pub fn id_of(&self, name: AgentName) -> Option<&AgentId> {
        self.agents.iter().find(|a| a.name == name).map(|a| &a.id)
    }

    /// Copy the current state out
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            agents: self.agents.clone(),
            global_log: self.global_log.clone(),
        }
    }

    pub(super) fn agent_mut(&mut self, id: &AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| &a.id == id)
    }

    pub(super) fn agents_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }

    pub(super) fn push_global(&mut self, entry: GlobalLogEntry) {
        self.global_log.push(entry);
    }

    pub(super) fn restore_initial(&mut self) {
        self.agents = self.initial.clone();
        self.global_log.clear();
    }

    /// Number of agents currently in `status`
    pub fn count_with_status(&self, status: AgentStatus) -> usize {
        self.agents.iter().filter(|a| a.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::roster::default_roster;
    use crate::runtime::types::DEFAULT_LOG_CAPACITY;

    #[test]
    fn test_store_seeded_from_roster() {
        let roster = default_roster(DEFAULT_LOG_CAPACITY);
        let store = EntityStore::new(roster.clone());

        assert_eq!(store.agents(), roster.as_slice());
        assert_eq!(store.initial(), roster.as_slice());
        assert!(store.global_log().is_empty());
        assert_eq!(store.count_with_status(AgentStatus::Idle), 7);
    }

    #[test]
    fn test_id_lookup_by_role() {
        let store = EntityStore::new(default_roster(DEFAULT_LOG_CAPACITY));
        let id = store.id_of(AgentName::Vendor).unwrap().clone();
        assert_eq!(store.agent(&id).unwrap().name, AgentName::Vendor);
    }

    #[test]
    fn test_restore_initial_discards_changes() {
        let mut store = EntityStore::new(default_roster(DEFAULT_LOG_CAPACITY));
        let id = store.id_of(AgentName::Budget).unwrap().clone();

        store.agent_mut(&id).unwrap().status = AgentStatus::Alert;
        store.restore_initial();

        assert_eq!(store.agent(&id).unwrap().status, AgentStatus::Idle);
    }
}
