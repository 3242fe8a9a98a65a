//! Unit tests for engine configuration

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc, Weekday};
use clinic_duty_engine::builders::build_lifecycle_manager;
use clinic_duty_engine::config::{BookingConfig, EngineConfig};
use clinic_duty_engine::core::{ClosingDayPolicy, Specialization, StorageError, TransientClassifier};
use clinic_duty_engine::infra::InMemoryWindowStore;
use clinic_duty_engine::util::{CivilDay, ManualClock};

fn day(y: i32, m: u32, d: u32) -> CivilDay {
    CivilDay::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

#[test]
fn test_empty_json_uses_defaults() {
    let cfg = EngineConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, EngineConfig::default());
    assert_eq!(cfg.clinic.timezone, "UTC");
    assert_eq!(cfg.booking.min_lead_days, 3);
    assert_eq!(cfg.retention.archive_grace_secs, 86_400);
    assert_eq!(cfg.retention.purge_after_secs, 86_400);
    assert!(!cfg.sweep.enabled);
}

#[test]
fn test_partial_sections_keep_other_defaults() {
    let cfg = EngineConfig::from_json_str(
        r#"{ "retention": { "purge_after_secs": 3600 }, "sweep": { "enabled": true, "interval_secs": 60 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.retention.archive_grace_secs, 86_400);
    assert_eq!(cfg.retention.purge_after_secs, 3_600);
    assert_eq!(cfg.sweep.interval(), std::time::Duration::from_secs(60));

    let policy = cfg.retention.policy().unwrap();
    assert_eq!(policy.purge_after, chrono::Duration::hours(1));
}

#[test]
fn test_invalid_sections_are_reported() {
    let err = EngineConfig::from_json_str(r#"{ "clinic": { "timezone": "Mars/Olympus" } }"#)
        .unwrap_err();
    assert!(err.contains("clinic invalid"), "{err}");

    let err = EngineConfig::from_json_str(r#"{ "booking": { "closed_weekdays": ["funday"] } }"#)
        .unwrap_err();
    assert!(err.contains("booking invalid"), "{err}");

    let err = EngineConfig::from_json_str(
        r#"{ "booking": { "closed_weekdays": ["saturday"], "restricted_weekdays": { "saturday": ["dentistry"] } } }"#,
    )
    .unwrap_err();
    assert!(err.contains("closed and restricted"), "{err}");

    let err = EngineConfig::from_json_str(r#"{ "sweep": { "enabled": true, "interval_secs": 0 } }"#)
        .unwrap_err();
    assert!(err.contains("sweep invalid"), "{err}");

    let err = EngineConfig::from_json_str(r#"{ "executor": { "transient_signatures": ["  "] } }"#)
        .unwrap_err();
    assert!(err.contains("executor invalid"), "{err}");

    assert!(EngineConfig::from_json_str("not json").unwrap_err().starts_with("parse error"));
}

#[test]
fn test_closing_policy_from_labels() {
    let booking = BookingConfig {
        closed_weekdays: vec!["Sun".into(), "wednesday".into()],
        restricted_weekdays: [("sat".to_string(), vec![Specialization::Pediatrics])]
            .into_iter()
            .collect(),
        ..BookingConfig::default()
    };
    let policy = booking.closing_policy().unwrap();

    // 2024-01-03 is a Wednesday, 2024-01-06 a Saturday.
    assert!(policy.is_closed(&day(2024, 1, 3), None));
    assert!(policy.is_closed(&day(2024, 1, 6), Some(&Specialization::Physiotherapy)));
    assert!(!policy.is_closed(&day(2024, 1, 6), Some(&Specialization::Pediatrics)));
    assert!(!policy.is_closed(&day(2024, 1, 4), None));
    assert!(policy.always_closed().contains(&Weekday::Wed));
}

#[test]
fn test_overrides_parse_and_validate() {
    let mut cfg = EngineConfig::default();
    cfg.apply_overrides(|key| match key {
        "ARCHIVE_GRACE_SECS" => Some("60".into()),
        "SWEEP_INTERVAL_SECS" => Some("15".into()),
        "SWEEP_ENABLED" => Some("off".into()),
        _ => None,
    })
    .unwrap();
    assert_eq!(cfg.retention.archive_grace_secs, 60);
    assert_eq!(cfg.sweep.interval_secs, 15);
    assert!(!cfg.sweep.enabled);

    let mut cfg = EngineConfig::default();
    let err = cfg
        .apply_overrides(|key| (key == "PURGE_AFTER_SECS").then(|| "a day".to_string()))
        .unwrap_err();
    assert!(err.to_string().contains("PURGE_AFTER_SECS"));
}

#[test]
fn test_executor_signatures_build_classifier() {
    let cfg = EngineConfig::from_json_str(
        r#"{ "executor": { "transient_signatures": ["Too Many Clients"] } }"#,
    )
    .unwrap();
    let classifier = cfg.executor.classifier();
    assert!(classifier.is_transient(&StorageError::Backend(
        "FATAL: sorry, too many clients already".into()
    )));
    assert!(!classifier.is_transient(&StorageError::Backend("broken pipe".into())));
}

#[test]
fn test_holidays_deserialize_as_dates() {
    let cfg = EngineConfig::from_json_str(r#"{ "booking": { "holidays": ["2025-01-01"] } }"#).unwrap();
    assert_eq!(cfg.booking.holidays, vec![NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()]);

    let calendar = cfg.clinic.calendar().unwrap();
    let instant = Utc.with_ymd_and_hms(2025, 1, 1, 23, 59, 59).unwrap();
    assert_eq!(
        clinic_duty_engine::util::CalendarAdapter::to_civil_day(&calendar, instant).date,
        cfg.booking.holidays[0]
    );
}

#[test]
fn test_zero_retention_periods_are_rejected() {
    let err = EngineConfig::from_json_str(r#"{ "retention": { "purge_after_secs": 0 } }"#)
        .unwrap_err();
    assert!(err.contains("purge_after_secs"), "{err}");

    let err = EngineConfig::from_json_str(r#"{ "retention": { "archive_grace_secs": 0 } }"#)
        .unwrap_err();
    assert!(err.contains("archive_grace_secs"), "{err}");

    let mut cfg = EngineConfig::default();
    cfg.retention.purge_after_secs = 0;
    assert!(cfg.retention.policy().is_err());
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    let built = build_lifecycle_manager(&cfg, Arc::new(InMemoryWindowStore::new()), clock);
    assert!(built.is_err());

    let mut cfg = EngineConfig::default();
    assert!(cfg
        .apply_overrides(|key| (key == "PURGE_AFTER_SECS").then(|| "0".to_string()))
        .is_ok());
    assert!(cfg.validate().is_err());
}
