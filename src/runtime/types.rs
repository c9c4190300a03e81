//! Agent identities, statuses, bounded logs, and virtual time
//!
//! Defines the data model shared by every subsystem: the closed set of agent
//! roles, the status lattice an agent moves through, the capacity-bounded
//! per-agent activity log, and the global log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

/// Default number of entries retained in an agent's activity log
pub const DEFAULT_LOG_CAPACITY: usize = 5;

/// Placeholder shown for an agent that has not logged anything yet
pub const IDLE_ACTIVITY: &str = "Waiting for tasks...";

/// Stable agent identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Create a new AgentId from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one simulator instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random SessionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The seven planning roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AgentName {
    /// Owns the overall plan and timeline
    Planning,
    /// Sources and books vendors
    Vendor,
    /// Tracks the to-do list
    Checklist,
    /// Tracks spending against the budget
    Budget,
    /// Handles invitations and RSVPs
    GuestManagement,
    /// Sends reminders and alerts
    Notification,
    /// Runs announcements and social posts
    SocialMedia,
}

impl AgentName {
    /// Every role, in roster order
    pub const ALL: [AgentName; 7] = [
        AgentName::Planning,
        AgentName::Vendor,
        AgentName::Checklist,
        AgentName::Budget,
        AgentName::GuestManagement,
        AgentName::Notification,
        AgentName::SocialMedia,
    ];

    /// Human-readable role title
    pub fn title(&self) -> &'static str {
        match self {
            AgentName::Planning => "Planning Agent",
            AgentName::Vendor => "Vendor Agent",
            AgentName::Checklist => "Checklist Agent",
            AgentName::Budget => "Budget Agent",
            AgentName::GuestManagement => "Guest Management Agent",
            AgentName::Notification => "Notification Agent",
            AgentName::SocialMedia => "Social Media Agent",
        }
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Status of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Waiting for work
    #[default]
    Idle,
    /// Busy with a step or task
    Working,
    /// Finished its part
    Completed,
    /// Needs attention
    Alert,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgentStatus::Idle => "Idle",
            AgentStatus::Working => "Working",
            AgentStatus::Completed => "Completed",
            AgentStatus::Alert => "Alert",
        };
        f.write_str(label)
    }
}

/// Virtual time in milliseconds since the simulator was created
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(pub u64);

impl SimTime {
    /// The simulator's origin
    pub fn zero() -> Self {
        Self(0)
    }

    /// Milliseconds since the origin
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// This instant shifted forward by `millis`
    pub fn after(&self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Activity log that keeps only the most recent `capacity` entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl BoundedLog {
    /// Create an empty log
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest ones beyond capacity
    pub fn push(&mut self, entry: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry.into());
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Entries in arrival order, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Static description of an agent, as found in roster files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Stable identifier
    pub id: AgentId,
    /// Role
    pub name: AgentName,
    /// What the agent does
    pub description: String,
    /// Labels offered as one-click ad-hoc tasks
    #[serde(default)]
    pub sample_tasks: Vec<String>,
}

/// A simulated agent with its live status and activity log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier
    pub id: AgentId,
    /// Role
    pub name: AgentName,
    /// What the agent does
    pub description: String,
    /// Current status
    pub status: AgentStatus,
    /// Recent activity
    pub log: BoundedLog,
    /// Labels offered as one-click ad-hoc tasks
    pub sample_tasks: Vec<String>,
}

impl Agent {
    /// Create an idle agent with an empty log from its profile
    pub fn new(profile: AgentProfile, log_capacity: usize) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            description: profile.description,
            status: AgentStatus::Idle,
            log: BoundedLog::new(log_capacity),
            sample_tasks: profile.sample_tasks,
        }
    }

    /// Newest log line, or a placeholder when nothing has happened yet
    pub fn latest_activity(&self) -> &str {
        self.log.latest().unwrap_or(IDLE_ACTIVITY)
    }
}

/// One entry of the unbounded, append-only global log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalLogEntry {
    /// Agent that produced the entry
    pub agent: AgentId,
    /// Role of that agent
    pub agent_name: AgentName,
    /// Logged message
    pub message: String,
    /// Wall-clock stamp (simulator anchor plus virtual time)
    pub timestamp: DateTime<Utc>,
    /// Virtual time of dispatch
    pub at: SimTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_log_evicts_oldest() {
        let mut log = BoundedLog::new(3);
        for i in 0..5 {
            log.push(format!("entry {}", i));
        }

        let kept: Vec<_> = log.iter().collect();
        assert_eq!(kept, vec!["entry 2", "entry 3", "entry 4"]);
        assert_eq!(log.latest(), Some("entry 4"));
    }

    #[test]
    fn test_bounded_log_zero_capacity_keeps_nothing() {
        let mut log = BoundedLog::new(0);
        log.push("dropped");
        assert!(log.is_empty());
    }

    #[test]
    fn test_latest_activity_placeholder() {
        let profile = AgentProfile {
            id: AgentId::new("budget"),
            name: AgentName::Budget,
            description: "Tracks spending".to_string(),
            sample_tasks: vec![],
        };
        let mut agent = Agent::new(profile, DEFAULT_LOG_CAPACITY);
        assert_eq!(agent.latest_activity(), IDLE_ACTIVITY);

        agent.log.push("Reviewing invoices");
        assert_eq!(agent.latest_activity(), "Reviewing invoices");
    }

    #[test]
    fn test_agent_name_serde_and_display() {
        let json = serde_json::to_string(&AgentName::GuestManagement).unwrap();
        assert_eq!(json, "\"guest_management\"");
        assert_eq!(AgentName::GuestManagement.to_string(), "Guest Management Agent");
    }

    #[test]
    fn test_sim_time_after_saturates() {
        assert_eq!(SimTime(u64::MAX).after(10), SimTime(u64::MAX));
        assert_eq!(SimTime::zero().after(1500), SimTime(1500));
    }
}
