//! Due-date arithmetic shared by stats, card badges and the fallback summary.
//!
//! All functions take `now` explicitly; none of them read the clock.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::Ticket;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Upper bound (inclusive) of the due-soon window, in whole days.
pub const DUE_SOON_DAYS: i64 = 3;

/// Parse a due date. Date-only values mean midnight UTC; timestamps without
/// an offset are read as UTC.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.and_utc())
}

/// Milliseconds from `now` until the due date; negative once it has passed.
pub fn millis_until(raw: &str, now: DateTime<Utc>) -> Option<i64> {
    parse_due_date(raw).map(|due| (due - now).num_milliseconds())
}

/// Whole days until the due date, rounded up. Anything less than a full day
/// in the past rounds to 0.
pub fn days_until(raw: &str, now: DateTime<Utc>) -> Option<i64> {
    millis_until(raw, now).map(|ms| {
        let q = ms.div_euclid(DAY_MS);
        if ms.rem_euclid(DAY_MS) != 0 { q + 1 } else { q }
    })
}

/// Due within `0..=3` days, counting partial days up.
pub fn due_soon(raw: &str, now: DateTime<Utc>) -> bool {
    days_until(raw, now).is_some_and(|d| (0..=DUE_SOON_DAYS).contains(&d))
}

/// The due instant is strictly in the past. Unparsable dates are never overdue.
pub fn overdue(raw: &str, now: DateTime<Utc>) -> bool {
    millis_until(raw, now).is_some_and(|ms| ms < 0)
}

pub fn is_due_soon(ticket: &Ticket, now: DateTime<Utc>) -> bool {
    due_soon(&ticket.due_date, now)
}

pub fn is_overdue(ticket: &Ticket, now: DateTime<Utc>) -> bool {
    overdue(&ticket.due_date, now)
}

/// Badge shown on a ticket card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DueState {
    Overdue,
    DueToday,
    DueSoon,
    Normal,
}

impl DueState {
    pub fn label(&self) -> &'static str {
        match self {
            DueState::Overdue => "Overdue",
            DueState::DueToday => "Due Today",
            DueState::DueSoon => "Due Soon",
            DueState::Normal => "",
        }
    }
}

/// `None` when the due date does not parse.
pub fn due_state(raw: &str, now: DateTime<Utc>) -> Option<DueState> {
    days_until(raw, now).map(|days| match days {
        d if d < 0 => DueState::Overdue,
        0 => DueState::DueToday,
        d if d <= DUE_SOON_DAYS => DueState::DueSoon,
        _ => DueState::Normal,
    })
}
