//! Core booking-window and lifecycle logic.

pub mod audit;
pub mod booking_window;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod model;

pub use audit::{AuditSink, InMemoryAuditSink, LifecycleAction, LifecycleAuditEvent};
pub use booking_window::{
    AcceptedBooking, BookingWindowCalculator, ClosingDayPolicy, HolidayClosingPolicy, WeeklyClosingPolicy,
    DEFAULT_MIN_LEAD_DAYS, MAX_SEARCH_DAYS,
};
pub use error::{AppResult, BookingError, StorageError};
pub use executor::{Connection, DisconnectClassifier, ResilientExecutor, TransientClassifier};
pub use lifecycle::{
    ArchiveCriteria, DutyHourLifecycleManager, LifecycleReport, PurgeCriteria, WindowStore,
};
pub use model::{AvailabilityWindow, RetentionPolicy, Specialization, WindowFilter, WindowState};
