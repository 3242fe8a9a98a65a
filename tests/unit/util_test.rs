//! Tests for utility functions

use chrono::{Duration, NaiveDate, TimeZone, Utc, Weekday};
use clinic_duty_engine::util::{
    init_tracing, parse_weekday, CalendarAdapter, CivilDay, ClinicCalendar, Clock, ManualClock,
    SystemClock,
};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    assert!(tracing::dispatcher::has_been_set());
    tracing::info!("tracing smoke event");
}

#[test]
fn test_weekday_labels() {
    assert_eq!(parse_weekday("Saturday"), Some(Weekday::Sat));
    assert_eq!(parse_weekday(" sun "), Some(Weekday::Sun));
    assert_eq!(parse_weekday("someday"), None);

    let date = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
    assert_eq!(CivilDay::from_label(date, "sat"), CivilDay::from_date(date));
}

#[test]
fn test_default_calendar_is_utc() {
    let calendar = ClinicCalendar::default();
    let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    assert_eq!(
        calendar.start_of_day(date),
        Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()
    );
}

#[test]
fn test_clocks() {
    let before = Utc::now();
    assert!(SystemClock.now() >= before);

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    clock.advance(Duration::minutes(90));
    assert_eq!(clock.now(), start + Duration::minutes(90));
}
