use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::Value;
use ulid::Ulid;

use crate::board::samples::sample_tickets;
use crate::board::transfer::{ExportDocument, TransferError, parse_import, read_import_file};
use crate::clock::{Clock, iso_timestamp};
use crate::storage::{ByteStore, StorageResult};
use crate::types::{Priority, Status, Ticket, TicketDraft};

/// Key the whole collection is stored under.
pub const STORAGE_KEY: &str = "tickets";

/// Owns the ordered ticket collection and mirrors it into a [`ByteStore`].
///
/// Every mutation that changes something rewrites the full collection.
/// Mutations aimed at an unknown id change nothing and report it through
/// their return value instead of an error.
pub struct BoardStore<S> {
    store: S,
    clock: Box<dyn Clock>,
    tickets: Vec<Ticket>,
}

impl<S: ByteStore> BoardStore<S> {
    /// Hydrate from the byte store, falling back to the sample board when the
    /// entry is missing, unreadable, not JSON or not an array.
    ///
    /// Stored arrays are taken as they are, without the import check: every
    /// object element becomes a ticket, with defaults for missing or
    /// ill-typed fields.
    pub fn load(store: S, clock: impl Clock + 'static) -> Self {
        let clock: Box<dyn Clock> = Box::new(clock);
        let tickets = match store.get(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Array(items)) => hydrate(&items),
                Ok(_) => {
                    tracing::warn!("Stored board is not an array, using sample data");
                    sample_tickets(clock.now())
                }
                Err(e) => {
                    tracing::warn!("Stored board is corrupt, using sample data: {e}");
                    sample_tickets(clock.now())
                }
            },
            Ok(None) => {
                tracing::debug!("No stored board, using sample data");
                sample_tickets(clock.now())
            }
            Err(e) => {
                tracing::warn!("Failed to read stored board, using sample data: {e}");
                sample_tickets(clock.now())
            }
        };
        Self {
            store,
            clock,
            tickets,
        }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn get(&self, id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }

    /// The instant views should be computed against.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn add(&mut self, draft: TicketDraft) -> StorageResult<Ticket> {
        let ticket = Ticket::from_draft(Ulid::new().to_string(), draft, self.timestamp());
        tracing::debug!(id = %ticket.id, "Adding ticket");
        self.tickets.push(ticket.clone());
        self.persist()?;
        Ok(ticket)
    }

    /// Replace every editable field. Returns `None` for an unknown id.
    pub fn update(&mut self, id: &str, draft: TicketDraft) -> StorageResult<Option<Ticket>> {
        let timestamp = self.timestamp();
        let updated = {
            let Some(ticket) = self.tickets.iter_mut().find(|t| t.id == id) else {
                tracing::debug!(id, "Update ignored, no such ticket");
                return Ok(None);
            };
            ticket.apply_draft(draft, timestamp);
            ticket.clone()
        };
        self.persist()?;
        Ok(Some(updated))
    }

    /// Move a ticket to another column. Moving to its current column is a
    /// no-op and returns the ticket unchanged.
    pub fn move_to(&mut self, id: &str, status: Status) -> StorageResult<Option<Ticket>> {
        let timestamp = self.timestamp();
        let moved = {
            let Some(ticket) = self.tickets.iter_mut().find(|t| t.id == id) else {
                return Ok(None);
            };
            if ticket.status == status {
                return Ok(Some(ticket.clone()));
            }
            ticket.status = status;
            ticket.updated_at = timestamp;
            ticket.clone()
        };
        tracing::debug!(id, %status, "Moved ticket");
        self.persist()?;
        Ok(Some(moved))
    }

    /// Returns whether a ticket was removed.
    pub fn remove(&mut self, id: &str) -> StorageResult<bool> {
        let before = self.tickets.len();
        self.tickets.retain(|t| t.id != id);
        if self.tickets.len() == before {
            return Ok(false);
        }
        tracing::debug!(id, "Removed ticket");
        self.persist()?;
        Ok(true)
    }

    /// Remove the first occurrence of `label`. Returns whether anything
    /// changed.
    pub fn remove_label(&mut self, id: &str, label: &str) -> StorageResult<bool> {
        let timestamp = self.timestamp();
        {
            let Some(ticket) = self.tickets.iter_mut().find(|t| t.id == id) else {
                return Ok(false);
            };
            let Some(pos) = ticket.labels.iter().position(|l| l == label) else {
                return Ok(false);
            };
            ticket.labels.remove(pos);
            ticket.updated_at = timestamp;
        }
        self.persist()?;
        Ok(true)
    }

    /// Empty the board and drop the stored entry. Callers confirm first.
    pub fn clear(&mut self) -> StorageResult<()> {
        tracing::info!(count = self.tickets.len(), "Clearing board");
        self.tickets.clear();
        self.store.remove(STORAGE_KEY)
    }

    pub fn export(&self) -> ExportDocument {
        ExportDocument::new(self.tickets.clone(), self.clock.now())
    }

    /// Validate an import blob and, only if every ticket passes, replace the
    /// whole collection with it. Returns the new ticket count.
    pub fn import_bytes(&mut self, bytes: &[u8]) -> Result<usize, TransferError> {
        let tickets = parse_import(bytes).inspect_err(log_rejection)?;
        self.replace_all(tickets)?;
        Ok(self.tickets.len())
    }

    pub fn import_file(&mut self, path: &Path) -> Result<usize, TransferError> {
        let tickets = read_import_file(path).inspect_err(log_rejection)?;
        self.replace_all(tickets)?;
        Ok(self.tickets.len())
    }

    fn replace_all(&mut self, tickets: Vec<Ticket>) -> StorageResult<()> {
        tracing::info!(count = tickets.len(), "Replacing board");
        self.tickets = tickets;
        self.persist()
    }

    fn timestamp(&self) -> String {
        iso_timestamp(self.clock.now())
    }

    fn persist(&mut self) -> StorageResult<()> {
        let content = serde_json::to_string(&self.tickets)?;
        self.store.set(STORAGE_KEY, &content)
    }
}

fn hydrate(items: &[Value]) -> Vec<Ticket> {
    let tickets: Vec<Ticket> = items.iter().filter_map(stored_ticket).collect();
    if tickets.len() < items.len() {
        tracing::warn!(
            skipped = items.len() - tickets.len(),
            "Ignoring stored entries that are not objects"
        );
    }
    tickets
}

/// Lenient conversion of one stored entry. Only non-objects are refused.
fn stored_ticket(value: &Value) -> Option<Ticket> {
    let obj = value.as_object()?;
    let text = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let id = match obj.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => Ulid::new().to_string(),
    };
    let labels = obj
        .get("labels")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let estimate = obj
        .get("estimate")
        .and_then(Value::as_f64)
        .map(|hours| hours.max(0.0).round() as u32)
        .unwrap_or(0);

    Some(Ticket {
        id,
        title: text("title"),
        description: text("description"),
        status: text("status").parse().unwrap_or(Status::Backlog),
        priority: text("priority").parse().unwrap_or(Priority::Medium),
        assignee: text("assignee"),
        labels,
        due_date: text("dueDate"),
        estimate,
        created_at: text("createdAt"),
        updated_at: text("updatedAt"),
    })
}

fn log_rejection(err: &TransferError) {
    match err {
        TransferError::InvalidFormat { reason } => {
            tracing::warn!("Import rejected: {reason}")
        }
        other => tracing::warn!("Import failed: {other}"),
    }
}
