//! Error types for booking and lifecycle operations.

use chrono::{NaiveDate, Weekday};
use thiserror::Error;

/// Errors produced by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The server closed an established connection.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
    /// The server could not be reached.
    #[error("database unreachable: {0}")]
    Unreachable(String),
    /// A statement was rejected or failed to execute.
    #[error("query failed: {0}")]
    Query(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors produced by booking-window checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// Requested date is earlier than the earliest bookable date.
    #[error("requested date {requested} is before the earliest bookable date {earliest}")]
    TooEarly {
        /// Requested civil date.
        requested: NaiveDate,
        /// Earliest civil date the doctor can be booked.
        earliest: NaiveDate,
    },
    /// Requested date falls on a day the clinic is closed.
    #[error("clinic is closed on {date} ({weekday:?})")]
    ClosedDay {
        /// Requested civil date.
        date: NaiveDate,
        /// Weekday of the requested date, if known.
        weekday: Option<Weekday>,
        /// Earliest civil date the doctor can be booked.
        earliest: NaiveDate,
    },
    /// The closing policy left no open day within the search bound.
    #[error("no open day within {searched_days} days of {first_candidate}")]
    PolicyExhausted {
        /// First candidate date evaluated.
        first_candidate: NaiveDate,
        /// Number of days evaluated.
        searched_days: u32,
    },
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
