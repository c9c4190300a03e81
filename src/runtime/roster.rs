//! Built-in agent roster and planning script

use super::script::{Script, ScriptStep};
use super::types::{Agent, AgentId, AgentName, AgentProfile, AgentStatus};

/// Profiles of the seven built-in agents
pub fn default_profiles() -> Vec<AgentProfile> {
    let profile = |id: &str, name, description: &str, tasks: &[&str]| AgentProfile {
        id: AgentId::new(id),
        name,
        description: description.to_string(),
        sample_tasks: tasks.iter().map(|t| t.to_string()).collect(),
    };

    vec![
        profile(
            "planning",
            AgentName::Planning,
            "Gathers the couple's preferences and turns them into a timeline and workflow.",
            &["Draft timeline", "Choose a theme", "Schedule tasting"],
        ),
        profile(
            "vendor",
            AgentName::Vendor,
            "Finds, compares, and books venues, caterers, florists, and photographers.",
            &["Find a photographer", "Compare caterers", "Book florist"],
        ),
        profile(
            "checklist",
            AgentName::Checklist,
            "Keeps the master to-do list current and flags anything overdue.",
            &["Review checklist", "Add dress fitting", "Mark venue booked"],
        ),
        profile(
            "budget",
            AgentName::Budget,
            "Tracks deposits and spending against the agreed budget.",
            &["Set budget", "Log deposit", "Forecast spending"],
        ),
        profile(
            "guest",
            AgentName::GuestManagement,
            "Manages the guest list, invitations, RSVPs, and seating.",
            &["Send invitations", "Track RSVPs", "Draft seating chart"],
        ),
        profile(
            "notification",
            AgentName::Notification,
            "Sends reminders and alerts to the couple, guests, and vendors.",
            &["Send reminder", "Notify vendors", "Confirm appointments"],
        ),
        profile(
            "social",
            AgentName::SocialMedia,
            "Runs the wedding website and shares announcements.",
            &["Post engagement photo", "Update website", "Share save-the-date"],
        ),
    ]
}

/// Idle agents with empty logs, ready to seed a store
pub fn default_roster(log_capacity: usize) -> Vec<Agent> {
    roster_from_profiles(default_profiles(), log_capacity)
}

/// Turn profiles into idle agents with empty logs
pub fn roster_from_profiles(profiles: Vec<AgentProfile>, log_capacity: usize) -> Vec<Agent> {
    profiles
        .into_iter()
        .map(|p| Agent::new(p, log_capacity))
        .collect()
}

/// The built-in planning run
pub fn default_script() -> Script {
    use AgentName::*;
    use AgentStatus::*;

    Script::new(vec![
        ScriptStep::new(Planning, "Collecting the couple's preferences: garden theme, 120 guests.", 2000)
            .with_status(Working),
        ScriptStep::new(Planning, "Drafted a 9-month planning timeline.", 1500)
            .settling_to(Completed),
        ScriptStep::new(Budget, "Setting an overall budget of $30,000.", 1500)
            .with_status(Working),
        ScriptStep::new(Vendor, "Searching for venues that fit the garden theme.", 2000)
            .with_status(Working),
        ScriptStep::new(Vendor, "Shortlisted 3 venues; requesting quotes.", 1500),
        ScriptStep::new(Checklist, "Created master checklist with 42 items.", 1500)
            .with_status(Working)
            .settling_to(Completed),
        ScriptStep::new(Budget, "Venue quote exceeds its allocation by 12%.", 2000)
            .with_status(Alert),
        ScriptStep::new(Vendor, "Negotiated a weekday discount with the preferred venue.", 1500)
            .settling_to(Completed),
        ScriptStep::new(Budget, "Budget rebalanced; venue now within allocation.", 1500)
            .with_status(Working)
            .settling_to(Completed),
        ScriptStep::new(GuestManagement, "Importing guest list and sending invitations.", 2000)
            .with_status(Working),
        ScriptStep::new(SocialMedia, "Published the wedding website and save-the-date post.", 1500)
            .with_status(Working)
            .settling_to(Completed),
        ScriptStep::new(GuestManagement, "98 of 120 RSVPs received; 22 outstanding.", 1500),
        ScriptStep::new(Notification, "Sending RSVP reminders to 22 guests.", 2000)
            .with_status(Working)
            .settling_to(Completed),
        ScriptStep::new(Notification, "Final vendor confirmations sent.", 1500),
        ScriptStep::new(Planning, "All milestones on track. Planning summary ready.", 1500)
            .with_status(Completed),
    ])
}
