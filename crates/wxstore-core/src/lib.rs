//! Core data types for the weather observation store
//!
//! Field values, the weather record, the table schema shared by table
//! creation and bulk import, and the in-memory frame used for exports.

pub mod frame;
pub mod schema;
pub mod types;

pub use frame::*;
pub use schema::*;
pub use types::*;
