use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::board::due::{due_soon, overdue};
use crate::types::{Priority, Status};

/// Deterministic one-line digest of the board: totals, priority and status
/// breakdowns, then deadline counts.
///
/// Entries are read loosely. Every element counts toward the total; one
/// whose `priority` or `status` is not an exact wire value lands in no
/// bucket, and a missing or unparsable `dueDate` is neither overdue nor
/// due soon.
pub fn fallback_summary(tickets: &[Value], now: DateTime<Utc>) -> String {
    let field = |t: &Value, key: &str| t.get(key).and_then(Value::as_str).map(str::to_string);
    let by_priority = |p: Priority| {
        tickets
            .iter()
            .filter(|t| field(*t, "priority").as_deref() == Some(p.as_str()))
            .count()
    };
    let by_status = |s: Status| {
        tickets
            .iter()
            .filter(|t| field(*t, "status").as_deref() == Some(s.as_str()))
            .count()
    };
    let due_dates: Vec<String> = tickets
        .iter()
        .filter_map(|t| field(t, "dueDate"))
        .collect();
    let overdue_count = due_dates.iter().filter(|d| overdue(d, now)).count();
    let due_soon_count = due_dates.iter().filter(|d| due_soon(d, now)).count();

    format!(
        "Total {}. Priorities: urgent={}, high={}, medium={}, low={}. \
         Status: backlog={}, in-progress={}, review={}, done={}. \
         Deadlines: overdue={}, due-soon={}.",
        tickets.len(),
        by_priority(Priority::Urgent),
        by_priority(Priority::High),
        by_priority(Priority::Medium),
        by_priority(Priority::Low),
        by_status(Status::Backlog),
        by_status(Status::InProgress),
        by_status(Status::Review),
        by_status(Status::Done),
        overdue_count,
        due_soon_count,
    )
}
