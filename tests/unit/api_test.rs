//! Unit tests for API request/response models

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use clinic_duty_engine::builders::{build_booking_calculator, build_lifecycle_manager};
use clinic_duty_engine::config::EngineConfig;
use clinic_duty_engine::core::{AvailabilityWindow, BookingWindowCalculator, Specialization};
use clinic_duty_engine::infra::InMemoryWindowStore;
use clinic_duty_engine::runtime::{
    check_booking, earliest_date, trigger_sweep, BookingCheckRequest, EarliestDateRequest,
};
use clinic_duty_engine::util::{CivilDay, ClinicCalendar, ManualClock};
use uuid::Uuid;

#[test]
fn test_earliest_date_request_round_trip() {
    let req: EarliestDateRequest =
        serde_json::from_str(r#"{ "specialization": "Physiotherapy", "min_lead_days": null }"#)
            .unwrap();
    assert_eq!(req.specialization, Some(Specialization::Physiotherapy));

    let calc = build_booking_calculator(&EngineConfig::default()).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 1, 3, 15, 0, 0).unwrap();
    let resp = earliest_date(&calc, now, &req);
    assert_eq!(resp.earliest_date, NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
    assert_eq!(resp.min_lead_days, 3);

    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["earliest_date"], "2024-01-06");
}

#[test]
fn test_earliest_date_lead_override() {
    let calc = build_booking_calculator(&EngineConfig::default()).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();
    let resp = earliest_date(
        &calc,
        now,
        &EarliestDateRequest {
            specialization: None,
            min_lead_days: Some(0),
        },
    );
    assert_eq!(resp.earliest_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(resp.min_lead_days, 0);
}

#[test]
fn test_check_booking_reports_reason() {
    let calc = build_booking_calculator(&EngineConfig::default()).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();

    let too_early = check_booking(
        &calc,
        now,
        &BookingCheckRequest {
            specialization: None,
            requested_at: now + Duration::days(1),
        },
    );
    assert!(!too_early.accepted);
    assert_eq!(too_early.earliest_date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    assert!(too_early.reason.is_some());

    let ok = check_booking(
        &calc,
        now,
        &BookingCheckRequest {
            specialization: Some(Specialization::Dentistry),
            requested_at: now + Duration::days(4),
        },
    );
    assert!(ok.accepted);
    assert_eq!(ok.reason, None);
}

#[tokio::test]
async fn test_trigger_sweep_uses_configured_retention() {
    let mut cfg = EngineConfig::default();
    cfg.retention.archive_grace_secs = 60;

    let now = Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();
    let window = AvailabilityWindow::new(
        Uuid::new_v4(),
        now - Duration::hours(1),
        now - Duration::minutes(2),
    );
    let store = Arc::new(InMemoryWindowStore::with_windows([window]));
    let manager =
        build_lifecycle_manager(&cfg, store, Arc::new(ManualClock::new(now))).unwrap();

    let resp = trigger_sweep(&manager, None).await.unwrap();
    assert_eq!(resp.archived, 1);
    assert_eq!(resp.ran_at, now);
}

#[test]
fn test_check_booking_evaluates_policy_once_per_day() {
    let evaluations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&evaluations);
    let calc = BookingWindowCalculator::new(
        ClinicCalendar::default(),
        move |_: &CivilDay, _: Option<&Specialization>| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        },
    );
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();

    let resp = check_booking(
        &calc,
        now,
        &BookingCheckRequest {
            specialization: None,
            requested_at: now + Duration::days(5),
        },
    );
    assert!(resp.accepted);
    assert_eq!(resp.earliest_date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    // One evaluation finds the earliest day, one checks the requested day.
    assert_eq!(evaluations.load(Ordering::SeqCst), 2);
}

#[test]
fn test_closed_day_rejection_reports_earliest_date() {
    let calc = build_booking_calculator(&EngineConfig::default()).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();
    let resp = check_booking(
        &calc,
        now,
        &BookingCheckRequest {
            specialization: None,
            requested_at: Utc.with_ymd_and_hms(2024, 1, 7, 10, 0, 0).unwrap(),
        },
    );
    assert!(!resp.accepted);
    assert_eq!(resp.requested_date, NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
    assert_eq!(resp.earliest_date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
}
