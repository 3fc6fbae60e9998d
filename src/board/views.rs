//! Pure projections over a ticket collection.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::board::due;
use crate::types::{Priority, Status, Ticket};

/// Five independent criteria, ANDed. Empty strings and `None` mean
/// "no constraint".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Filters {
    /// Case-insensitive substring of title, description or any label.
    pub search: String,
    pub assignee: String,
    pub priority: Option<Priority>,
    pub label: String,
    pub status: Option<Status>,
}

impl Filters {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || !self.assignee.is_empty()
            || self.priority.is_some()
            || !self.label.is_empty()
            || self.status.is_some()
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.matches_search(ticket)
            && (self.assignee.is_empty() || ticket.assignee == self.assignee)
            && self.priority.is_none_or(|p| ticket.priority == p)
            && (self.label.is_empty() || ticket.labels.iter().any(|l| *l == self.label))
            && self.status.is_none_or(|s| ticket.status == s)
    }

    fn matches_search(&self, ticket: &Ticket) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        ticket.title.to_lowercase().contains(&needle)
            || ticket.description.to_lowercase().contains(&needle)
            || ticket
                .labels
                .iter()
                .any(|l| l.to_lowercase().contains(&needle))
    }
}

/// Tickets matching every active criterion, in collection order.
pub fn filter_tickets<'a>(tickets: &'a [Ticket], filters: &Filters) -> Vec<&'a Ticket> {
    tickets.iter().filter(|t| filters.matches(t)).collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub urgent_count: usize,
    pub due_soon_count: usize,
}

pub fn stats(tickets: &[Ticket], now: DateTime<Utc>) -> Stats {
    Stats {
        total: tickets.len(),
        urgent_count: tickets
            .iter()
            .filter(|t| t.priority == Priority::Urgent)
            .count(),
        due_soon_count: tickets.iter().filter(|t| due::is_due_soon(t, now)).count(),
    }
}

/// Distinct values per attribute across the whole collection, in order of
/// first appearance. Empty assignees and labels are skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Facets {
    pub assignees: Vec<String>,
    pub priorities: Vec<Priority>,
    pub labels: Vec<String>,
    pub statuses: Vec<Status>,
}

pub fn facets(tickets: &[Ticket]) -> Facets {
    let mut out = Facets::default();
    for ticket in tickets {
        push_distinct(&mut out.assignees, &ticket.assignee);
        if !out.priorities.contains(&ticket.priority) {
            out.priorities.push(ticket.priority);
        }
        for label in &ticket.labels {
            push_distinct(&mut out.labels, label);
        }
        if !out.statuses.contains(&ticket.status) {
            out.statuses.push(ticket.status);
        }
    }
    out
}

fn push_distinct(values: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

/// One board column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column<'a> {
    pub status: Status,
    pub title: &'static str,
    pub tickets: Vec<&'a Ticket>,
}

/// Partition tickets into the four columns, in board order.
pub fn columns<'a, I>(tickets: I) -> Vec<Column<'a>>
where
    I: IntoIterator<Item = &'a Ticket>,
{
    let mut cols: Vec<Column<'a>> = Status::ALL
        .iter()
        .map(|s| Column {
            status: *s,
            title: s.title(),
            tickets: Vec::new(),
        })
        .collect();
    for ticket in tickets {
        if let Some(col) = cols.iter_mut().find(|c| c.status == ticket.status) {
            col.tickets.push(ticket);
        }
    }
    cols
}
