//! Kanban ticket board engine.
//!
//! The [`board`] module owns the ticket collection, its derived views and the
//! JSON import/export format. [`summary`] produces natural-language digests
//! of a board, remotely when an API key is configured and locally otherwise.
//! [`server`] exposes the summary over HTTP and [`commands`] drives
//! everything from the command line.

pub mod board;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod error;
pub mod handler;
pub mod server;
pub mod storage;
pub mod summary;
pub mod types;

pub mod metadata {
    include!(concat!(env!("OUT_DIR"), "/pkg_info.rs"));
}
