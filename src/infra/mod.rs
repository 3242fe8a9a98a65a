//! Infrastructure adapters for availability-window storage.

pub mod store;

pub use store::{InMemoryWindowStore, PostgresWindowStatements};
