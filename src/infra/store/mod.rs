//! Availability-window store backends.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryWindowStore;
pub use postgres::{PostgresWindowStatements, SqlParam, SqlStatement};
