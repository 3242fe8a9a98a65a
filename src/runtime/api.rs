//! API-facing request/response models for the booking flow and lifecycle trigger.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{
    BookingError, BookingWindowCalculator, ClosingDayPolicy, Connection, DutyHourLifecycleManager,
    LifecycleReport, Specialization, WindowFilter, WindowStore,
};
use crate::util::calendar::CalendarAdapter;

/// Earliest-date lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EarliestDateRequest {
    /// Doctor specialization, if known.
    pub specialization: Option<Specialization>,
    /// Lead-time override in days.
    pub min_lead_days: Option<u32>,
}

/// Earliest-date lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarliestDateResponse {
    /// Earliest bookable civil date.
    pub earliest_date: NaiveDate,
    /// Start of that date in the clinic's time zone.
    pub starts_at: DateTime<Utc>,
    /// Lead time that was applied.
    pub min_lead_days: u32,
}

/// Requested appointment to validate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCheckRequest {
    /// Doctor specialization, if known.
    pub specialization: Option<Specialization>,
    /// Requested appointment start.
    pub requested_at: DateTime<Utc>,
}

/// Outcome of a booking check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCheckResponse {
    /// Whether the requested date is bookable.
    pub accepted: bool,
    /// Requested civil date.
    pub requested_date: NaiveDate,
    /// Earliest bookable civil date.
    pub earliest_date: NaiveDate,
    /// Rejection reason.
    pub reason: Option<String>,
}

/// Lifecycle sweep result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepResponse {
    /// Instant used as `now`.
    pub ran_at: DateTime<Utc>,
    /// Windows archived.
    pub archived: u64,
    /// Windows deleted.
    pub purged: u64,
}

impl From<LifecycleReport> for SweepResponse {
    fn from(report: LifecycleReport) -> Self {
        Self {
            ran_at: report.ran_at,
            archived: report.archived,
            purged: report.purged,
        }
    }
}

/// Resolve the earliest bookable date for a request.
pub fn earliest_date<C, P>(
    calculator: &BookingWindowCalculator<C, P>,
    now: DateTime<Utc>,
    req: &EarliestDateRequest,
) -> EarliestDateResponse
where
    C: CalendarAdapter,
    P: ClosingDayPolicy,
{
    let min_lead_days = req.min_lead_days.unwrap_or_else(|| calculator.min_lead_days());
    let starts_at = calculator.earliest_bookable_date_with_lead(
        now,
        req.specialization.as_ref(),
        min_lead_days,
    );
    EarliestDateResponse {
        earliest_date: calculator.calendar().to_civil_day(starts_at).date,
        starts_at,
        min_lead_days,
    }
}

/// Validate a requested appointment against the booking window.
pub fn check_booking<C, P>(
    calculator: &BookingWindowCalculator<C, P>,
    now: DateTime<Utc>,
    req: &BookingCheckRequest,
) -> BookingCheckResponse
where
    C: CalendarAdapter,
    P: ClosingDayPolicy,
{
    let requested_date = calculator.calendar().to_civil_day(req.requested_at).date;

    match calculator.check_requested_date(now, req.specialization.as_ref(), req.requested_at) {
        Ok(accepted) => BookingCheckResponse {
            accepted: true,
            requested_date,
            earliest_date: accepted.earliest,
            reason: None,
        },
        Err(e) => BookingCheckResponse {
            accepted: false,
            requested_date,
            earliest_date: match &e {
                BookingError::TooEarly { earliest, .. }
                | BookingError::ClosedDay { earliest, .. } => *earliest,
                BookingError::PolicyExhausted {
                    first_candidate, ..
                } => *first_candidate,
            },
            reason: Some(e.to_string()),
        },
    }
}

/// Run one lifecycle sweep on demand.
pub async fn trigger_sweep<S>(
    manager: &DutyHourLifecycleManager<S>,
    filter: Option<&WindowFilter>,
) -> Result<SweepResponse, String>
where
    S: WindowStore + Connection + 'static,
{
    manager
        .archive_expired_windows(filter)
        .await
        .map(SweepResponse::from)
        .map_err(|e| e.to_string())
}
