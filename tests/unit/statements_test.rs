//! Unit tests for Postgres lifecycle statements

use chrono::{Duration, TimeZone, Utc};
use clinic_duty_engine::core::{ArchiveCriteria, PurgeCriteria, WindowFilter};
use clinic_duty_engine::infra::store::{SqlParam, PostgresWindowStatements};
use uuid::Uuid;

#[test]
fn test_filter_is_appended_after_time_predicate() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    let doctor = Uuid::new_v4();
    let window = Uuid::new_v4();
    let filter = WindowFilter::for_doctor(doctor).with_ids([window]);

    let stmt = PostgresWindowStatements::archive(&ArchiveCriteria {
        filter,
        ended_before: now - Duration::hours(24),
        archived_at: now,
    });
    assert_eq!(
        stmt.sql,
        "UPDATE availability_windows SET archived_at = $1 WHERE archived_at IS NULL \
         AND ends_at < $2 AND doctor_id = $3 AND id = ANY($4)"
    );
    assert_eq!(stmt.params[2], SqlParam::Uuid(doctor));
    assert_eq!(stmt.params[3], SqlParam::UuidArray(vec![window]));
}

#[test]
fn test_purge_uses_inclusive_cutoff() {
    let cutoff = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    let stmt = PostgresWindowStatements::purge(&PurgeCriteria {
        filter: WindowFilter::default(),
        archived_at_or_before: cutoff,
    });
    assert!(stmt.sql.ends_with("archived_at IS NOT NULL AND archived_at <= $1"));
    assert_eq!(stmt.params, vec![SqlParam::Timestamp(cutoff)]);
}

#[test]
fn test_migrations_create_table() {
    let migrations = PostgresWindowStatements::migrations();
    assert!(migrations[0].contains("CREATE TABLE IF NOT EXISTS availability_windows"));
}
