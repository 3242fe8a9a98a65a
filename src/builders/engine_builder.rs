//! Builders to construct the booking calculator and lifecycle manager from configuration.

use std::sync::Arc;

use anyhow::Context;

use crate::config::EngineConfig;
use crate::core::{
    AppResult, BookingWindowCalculator, Connection, DutyHourLifecycleManager,
    HolidayClosingPolicy, WeeklyClosingPolicy, WindowStore,
};
use crate::util::calendar::ClinicCalendar;
use crate::util::clock::Clock;

/// Calculator type produced from configuration.
pub type ClinicBookingCalculator =
    BookingWindowCalculator<ClinicCalendar, HolidayClosingPolicy<WeeklyClosingPolicy>>;

/// Build the booking-window calculator described by `cfg`.
pub fn build_booking_calculator(cfg: &EngineConfig) -> AppResult<ClinicBookingCalculator> {
    cfg.validate()
        .map_err(anyhow::Error::msg)
        .context("config invalid")?;

    let calendar = cfg.clinic.calendar().map_err(anyhow::Error::msg)?;
    let weekly = cfg.booking.closing_policy().map_err(anyhow::Error::msg)?;
    let policy = HolidayClosingPolicy::new(weekly, cfg.booking.holidays.iter().copied());

    tracing::debug!(
        "booking calculator for {} with {} day lead and {} holidays",
        calendar.timezone(),
        cfg.booking.min_lead_days,
        policy.holidays().len()
    );
    Ok(BookingWindowCalculator::new(calendar, policy).with_min_lead_days(cfg.booking.min_lead_days))
}

/// Build a lifecycle manager over `store` using the retention and executor
/// settings in `cfg`.
pub fn build_lifecycle_manager<S>(
    cfg: &EngineConfig,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
) -> AppResult<DutyHourLifecycleManager<S>>
where
    S: WindowStore + Connection + 'static,
{
    cfg.validate()
        .map_err(anyhow::Error::msg)
        .context("config invalid")?;

    let retention = cfg.retention.policy().map_err(anyhow::Error::msg)?;
    Ok(DutyHourLifecycleManager::new(store, clock)
        .with_retention(retention)
        .with_classifier(Arc::new(cfg.executor.classifier())))
}
