//! Runtime adapters: caller-facing request models and the periodic sweep.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod sweeper;

pub use api::{
    check_booking, earliest_date, trigger_sweep, BookingCheckRequest,
    BookingCheckResponse, EarliestDateRequest, EarliestDateResponse, SweepResponse,
};
#[cfg(feature = "tokio-runtime")]
pub use sweeper::{LifecycleSweeper, SweeperHandle};
