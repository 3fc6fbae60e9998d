pub mod due;
pub mod samples;
pub mod store;
pub mod transfer;
pub mod validator;
pub mod views;

pub use due::{DueState, due_state};
pub use store::{BoardStore, STORAGE_KEY};
pub use transfer::{ExportDocument, TransferError, export_filename};
pub use views::{Facets, Filters, Stats, columns, facets, filter_tickets, stats};
