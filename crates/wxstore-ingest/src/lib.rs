//! Bulk transfer between delimited files and the weather table
//!
//! [`import_csv`] loads a station export file row by row; [`export_csv`]
//! writes a materialized [`wxstore_core::Frame`] back out.

pub mod export;
pub mod import;

pub use export::*;
pub use import::*;

use thiserror::Error;
use wxstore_core::SchemaError;
use wxstore_db::DbError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

pub type IngestResult<T> = Result<T, IngestError>;
