//! Builders to construct engine components from configuration.

pub mod engine_builder;

pub use engine_builder::{build_booking_calculator, build_lifecycle_manager, ClinicBookingCalculator};
