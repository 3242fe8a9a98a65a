//! # Clinic Duty Engine
//!
//! Booking-window and duty-hour lifecycle logic for clinic scheduling.
//!
//! The crate answers two questions that the rest of a clinic application
//! relies on:
//!
//! - **When may a patient first book a doctor?** [`core::BookingWindowCalculator`]
//!   adds a minimum lead time to the current instant and walks forward over the
//!   clinic's civil calendar until the closing-day policy reports an open day.
//! - **When do stale availability windows go away?**
//!   [`core::DutyHourLifecycleManager`] archives windows that ended more than a
//!   grace period ago and deletes windows that have stayed archived past the
//!   retention period.
//!
//! Every persistence call the lifecycle manager makes goes through
//! [`core::ResilientExecutor`], which reconnects and retries once when the
//! storage connection has been dropped.
//!
//! ## Booking window
//!
//! ```rust,ignore
//! use clinic_duty_engine::core::{BookingWindowCalculator, Specialization, WeeklyClosingPolicy};
//! use clinic_duty_engine::util::ClinicCalendar;
//!
//! let calculator = BookingWindowCalculator::new(
//!     ClinicCalendar::from_name("Europe/Berlin")?,
//!     WeeklyClosingPolicy::default(),
//! );
//! let earliest = calculator.earliest_bookable_date(chrono::Utc::now(), Some(&Specialization::Dentistry));
//! ```
//!
//! ## Lifecycle
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use clinic_duty_engine::core::DutyHourLifecycleManager;
//! use clinic_duty_engine::infra::InMemoryWindowStore;
//! use clinic_duty_engine::util::SystemClock;
//!
//! let store = Arc::new(InMemoryWindowStore::new());
//! let manager = DutyHourLifecycleManager::new(store, Arc::new(SystemClock));
//! let report = manager.archive_expired_windows(None).await?;
//! ```
//!
//! For complete examples, see:
//! - `tests/booking_window_test.rs` - calendar and closing-day behavior
//! - `tests/lifecycle_test.rs` - archive/purge boundaries and idempotence

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Booking-window calculation, lifecycle management and storage retry logic.
pub mod core;
/// Configuration models for booking policy, retention and storage access.
pub mod config;
/// Builders to construct engine components from configuration.
pub mod builders;
/// Infrastructure adapters for availability-window storage.
pub mod infra;
/// Runtime adapters and caller-facing request models.
pub mod runtime;
/// Shared utilities: calendar, clock and telemetry.
pub mod util;
