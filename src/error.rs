use thiserror::Error;
use tokio::io;

use crate::board::TransferError;
use crate::storage::StorageError;

pub type ServiceResult<T> = core::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    FromString(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("ticket not found: {0}")]
    TicketNotFound(String),
    #[error("{0}")]
    IoError(#[from] io::Error),
    #[error("{0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Transfer(#[from] TransferError),
    #[error("{0}")]
    Prompt(#[from] dialoguer::Error),
}
