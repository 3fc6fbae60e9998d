use chrono::{DateTime, Duration, Utc};

use crate::clock::{iso_date, iso_timestamp};
use crate::types::{Priority, Status, Ticket};

struct Seed {
    title: &'static str,
    description: &'static str,
    status: Status,
    priority: Priority,
    assignee: &'static str,
    labels: &'static [&'static str],
    due_in_days: i64,
    estimate: u32,
}

const SEEDS: &[Seed] = &[
    Seed {
        title: "Installment schedule calculator",
        description: "Split checkout totals into four interest-free installments with rounding on the last payment.",
        status: Status::Backlog,
        priority: Priority::High,
        assignee: "Sarah Chen",
        labels: &["payments", "backend"],
        due_in_days: 9,
        estimate: 13,
    },
    Seed {
        title: "Soft credit check integration",
        description: "Call the bureau sandbox for a soft pull before approving a plan.",
        status: Status::Backlog,
        priority: Priority::Medium,
        assignee: "Marcus Johnson",
        labels: &["risk", "integration"],
        due_in_days: 14,
        estimate: 8,
    },
    Seed {
        title: "Late fee notifications",
        description: "Email and push reminders three days before an installment is due.",
        status: Status::InProgress,
        priority: Priority::Urgent,
        assignee: "Priya Patel",
        labels: &["notifications", "compliance"],
        due_in_days: 2,
        estimate: 5,
    },
    Seed {
        title: "Merchant settlement report",
        description: "Daily CSV of settled orders per merchant for finance.",
        status: Status::InProgress,
        priority: Priority::High,
        assignee: "Sarah Chen",
        labels: &["reporting", "finance"],
        due_in_days: 5,
        estimate: 8,
    },
    Seed {
        title: "Checkout widget accessibility pass",
        description: "Keyboard navigation and screen reader labels for the plan picker.",
        status: Status::Review,
        priority: Priority::Medium,
        assignee: "Diego Alvarez",
        labels: &["frontend", "a11y"],
        due_in_days: 1,
        estimate: 3,
    },
    Seed {
        title: "Refund reversal for partial returns",
        description: "Recompute the remaining schedule when a customer returns part of an order.",
        status: Status::Done,
        priority: Priority::Low,
        assignee: "Marcus Johnson",
        labels: &["payments"],
        due_in_days: -3,
        estimate: 5,
    },
];

/// Built-in board used when nothing usable is stored yet.
///
/// Due dates are placed relative to `now` so the sample keeps showing a mix
/// of overdue, due-soon and later work.
pub fn sample_tickets(now: DateTime<Utc>) -> Vec<Ticket> {
    let created = iso_timestamp(now - Duration::days(7));
    SEEDS
        .iter()
        .enumerate()
        .map(|(i, seed)| Ticket {
            id: format!("sample-{}", i + 1),
            title: seed.title.to_string(),
            description: seed.description.to_string(),
            status: seed.status,
            priority: seed.priority,
            assignee: seed.assignee.to_string(),
            labels: seed.labels.iter().map(|l| l.to_string()).collect(),
            due_date: iso_date(now + Duration::days(seed.due_in_days)),
            estimate: seed.estimate,
            created_at: created.clone(),
            updated_at: created.clone(),
        })
        .collect()
}
