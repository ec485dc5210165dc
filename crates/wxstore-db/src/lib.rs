//! SQLite access layer for the weather observation store
//!
//! A single [`DataStore`] owns one connection to a local database file.
//! Every operation returns a [`DbResult`]; nothing is swallowed.

pub mod client;
pub mod queries;
pub mod statement;

pub use client::*;
pub use statement::*;

use thiserror::Error;
use wxstore_core::{FrameError, RecordError};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Statement execution failed: {0}")]
    Execution(#[from] rusqlite::Error),

    #[error("Statement rejected: {0}")]
    Validation(String),

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Invalid result table: {0}")]
    Frame(#[from] FrameError),

    #[error("Invalid weather record: {0}")]
    Record(#[from] RecordError),
}

pub type DbResult<T> = Result<T, DbError>;
