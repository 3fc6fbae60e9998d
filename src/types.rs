use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four fixed board columns a ticket can sit in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Backlog,
    InProgress,
    Review,
    Done,
}

impl Status {
    /// Column order on the board.
    pub const ALL: [Status; 4] = [
        Status::Backlog,
        Status::InProgress,
        Status::Review,
        Status::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Backlog => "backlog",
            Status::InProgress => "in-progress",
            Status::Review => "review",
            Status::Done => "done",
        }
    }

    /// Column heading.
    pub fn title(&self) -> &'static str {
        match self {
            Status::Backlog => "Backlog",
            Status::InProgress => "In Progress",
            Status::Review => "Review",
            Status::Done => "Done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "backlog" => Ok(Status::Backlog),
            "in-progress" => Ok(Status::InProgress),
            "review" => Ok(Status::Review),
            "done" => Ok(Status::Done),
            _ => Err(format!("Unknown status: {s}")),
        }
    }
}

/// Ticket severity, lowest first.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(format!("Unknown priority: {s}")),
        }
    }
}

/// A unit of work on the board.
///
/// Serialized with the camelCase field names used by exported board files,
/// so a `Ticket` written by [`crate::board::transfer`] reads back unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub assignee: String,
    pub labels: Vec<String>,
    /// ISO date (`YYYY-MM-DD`) or full timestamp.
    pub due_date: String,
    /// Hours.
    pub estimate: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Everything a caller supplies when creating or editing a ticket.
///
/// The store owns `id`, `createdAt` and `updatedAt`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_status")]
    pub status: Status,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub estimate: u32,
}

fn default_status() -> Status {
    Status::Backlog
}

fn default_priority() -> Priority {
    Priority::Medium
}

impl TicketDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: default_status(),
            priority: default_priority(),
            assignee: String::new(),
            labels: Vec::new(),
            due_date: String::new(),
            estimate: 0,
        }
    }
}

impl Ticket {
    pub fn from_draft(id: String, draft: TicketDraft, timestamp: String) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            status: draft.status,
            priority: draft.priority,
            assignee: draft.assignee,
            labels: draft.labels,
            due_date: draft.due_date,
            estimate: draft.estimate,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        }
    }

    /// Overwrite every editable field, keeping `id` and `createdAt`.
    pub fn apply_draft(&mut self, draft: TicketDraft, timestamp: String) {
        self.title = draft.title;
        self.description = draft.description;
        self.status = draft.status;
        self.priority = draft.priority;
        self.assignee = draft.assignee;
        self.labels = draft.labels;
        self.due_date = draft.due_date;
        self.estimate = draft.estimate;
        self.updated_at = timestamp;
    }

    pub fn to_draft(&self) -> TicketDraft {
        TicketDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            assignee: self.assignee.clone(),
            labels: self.labels.clone(),
            due_date: self.due_date.clone(),
            estimate: self.estimate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let back: Status = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(back, Status::InProgress);
        assert!(serde_json::from_str::<Status>("\"unknown\"").is_err());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Review".parse::<Status>().unwrap(), Status::Review);
        assert_eq!("URGENT".parse::<Priority>().unwrap(), Priority::Urgent);
        assert!("p0".parse::<Priority>().is_err());
    }

    #[test]
    fn priority_orders_by_severity() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn ticket_fields_are_camel_case() {
        let ticket = Ticket::from_draft(
            "1".to_string(),
            TicketDraft::new("Write docs"),
            "2026-01-01T00:00:00.000Z".to_string(),
        );
        let value = serde_json::to_value(&ticket).unwrap();
        assert!(value.get("dueDate").is_some());
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["status"], "backlog");
        assert_eq!(value["priority"], "medium");
    }

    #[test]
    fn apply_draft_keeps_identity_and_creation_time() {
        let mut ticket = Ticket::from_draft(
            "abc".to_string(),
            TicketDraft::new("Old"),
            "2026-01-01T00:00:00.000Z".to_string(),
        );
        let mut draft = TicketDraft::new("New");
        draft.priority = Priority::Urgent;
        ticket.apply_draft(draft, "2026-01-02T00:00:00.000Z".to_string());

        assert_eq!(ticket.id, "abc");
        assert_eq!(ticket.title, "New");
        assert_eq!(ticket.priority, Priority::Urgent);
        assert_eq!(ticket.created_at, "2026-01-01T00:00:00.000Z");
        assert_eq!(ticket.updated_at, "2026-01-02T00:00:00.000Z");
    }
}
