//! Unit tests for the lifecycle audit sink

use chrono::{TimeZone, Utc};
use clinic_duty_engine::core::{AuditSink, InMemoryAuditSink, LifecycleAction, LifecycleAuditEvent};

fn event(affected: u64) -> LifecycleAuditEvent {
    let at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    LifecycleAuditEvent::new(LifecycleAction::Archive, affected, at, None, at)
}

#[test]
fn test_sink_keeps_most_recent_events() {
    let mut sink = InMemoryAuditSink::new(2);
    for affected in 1..=3 {
        sink.record(event(affected));
    }
    let affected: Vec<_> = sink.events().iter().map(|e| e.affected).collect();
    assert_eq!(affected, vec![2, 3]);
}

#[test]
fn test_zero_capacity_sink_records_nothing() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(event(1));
    assert!(sink.events().is_empty());
}

#[test]
fn test_events_have_unique_ids_and_serialize() {
    let a = event(1);
    let b = event(1);
    assert_ne!(a.event_id, b.event_id);

    let json = serde_json::to_value(&a).unwrap();
    assert_eq!(json["action"], "archive");
    assert_eq!(json["affected"], 1);
}
