use serde_json::Value;

use crate::types::{Priority, Status, Ticket};

fn string_field(obj: &serde_json::Map<String, Value>, name: &str) -> Result<(), String> {
    match obj.get(name) {
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(format!("field \"{name}\" must be a string")),
        None => Err(format!("field \"{name}\" is missing")),
    }
}

fn enum_field<T>(obj: &serde_json::Map<String, Value>, name: &str) -> Result<(), String>
where
    T: std::str::FromStr,
{
    string_field(obj, name)?;
    let raw = obj.get(name).and_then(Value::as_str).unwrap_or_default();
    // exact match; the wire form is always lowercase
    if raw.parse::<T>().is_ok() && raw == raw.to_ascii_lowercase() {
        Ok(())
    } else {
        Err(format!("field \"{name}\" has unknown value \"{raw}\""))
    }
}

/// Check one untyped JSON value against the ticket shape.
///
/// Returns the first problem found. Unknown extra fields are allowed.
pub fn check_ticket(value: &Value) -> Result<(), String> {
    let obj = value
        .as_object()
        .ok_or_else(|| "ticket must be an object".to_string())?;

    for name in ["id", "title", "description"] {
        string_field(obj, name)?;
    }
    enum_field::<Status>(obj, "status")?;
    enum_field::<Priority>(obj, "priority")?;
    string_field(obj, "assignee")?;

    match obj.get("labels") {
        Some(Value::Array(labels)) => {
            if !labels.iter().all(Value::is_string) {
                return Err("field \"labels\" must contain only strings".to_string());
            }
        }
        Some(_) => return Err("field \"labels\" must be an array".to_string()),
        None => return Err("field \"labels\" is missing".to_string()),
    }

    string_field(obj, "dueDate")?;
    match obj.get("estimate") {
        Some(Value::Number(n)) => {
            let whole = n.as_u64().is_some_and(|v| v <= u64::from(u32::MAX));
            if !whole {
                return Err(format!(
                    "field \"estimate\" must be a non-negative whole number of hours, got {n}"
                ));
            }
        }
        Some(_) => return Err("field \"estimate\" must be a number".to_string()),
        None => return Err("field \"estimate\" is missing".to_string()),
    }

    for name in ["createdAt", "updatedAt"] {
        string_field(obj, name)?;
    }
    Ok(())
}

/// Validate a board document and convert its tickets.
///
/// The document must be an object with a `tickets` array, and every element
/// must pass [`check_ticket`]; a single bad element rejects the lot.
pub fn validate_board(value: &Value) -> Result<Vec<Ticket>, String> {
    let tickets = value
        .get("tickets")
        .and_then(Value::as_array)
        .ok_or_else(|| "document has no \"tickets\" array".to_string())?;
    validate_tickets(tickets)
}

/// Validate and convert a list of untyped tickets, all or nothing.
pub fn validate_tickets(values: &[Value]) -> Result<Vec<Ticket>, String> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            check_ticket(v).map_err(|e| format!("ticket {i}: {e}"))?;
            serde_json::from_value::<Ticket>(v.clone()).map_err(|e| format!("ticket {i}: {e}"))
        })
        .collect()
}
