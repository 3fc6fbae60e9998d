//! Board export envelope and import parsing.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::board::validator::validate_board;
use crate::clock::{iso_date, iso_timestamp};
use crate::storage::StorageError;
use crate::types::Ticket;

pub const EXPORT_VERSION: &str = "1.0";

/// Import failures. The messages are shown to users verbatim.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to read file")]
    Read(#[source] std::io::Error),
    #[error("Failed to parse JSON file")]
    Parse(#[source] serde_json::Error),
    #[error("Invalid board data format")]
    InvalidFormat { reason: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Whole-board snapshot written to `board-export-<date>.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub tickets: Vec<Ticket>,
    pub exported_at: String,
    pub version: String,
}

impl ExportDocument {
    pub fn new(tickets: Vec<Ticket>, now: DateTime<Utc>) -> Self {
        Self {
            tickets,
            exported_at: iso_timestamp(now),
            version: EXPORT_VERSION.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `board-export-2026-10-18.json`
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("board-export-{}.json", iso_date(now))
}

/// Parse and validate an import blob. `version` and `exportedAt` are not
/// checked.
pub fn parse_import(bytes: &[u8]) -> Result<Vec<Ticket>, TransferError> {
    let value: Value = serde_json::from_slice(bytes).map_err(TransferError::Parse)?;
    validate_board(&value).map_err(|reason| TransferError::InvalidFormat { reason })
}

pub fn read_import_file(path: &Path) -> Result<Vec<Ticket>, TransferError> {
    let bytes = std::fs::read(path).map_err(TransferError::Read)?;
    parse_import(&bytes)
}
