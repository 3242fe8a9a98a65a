//! Audit trail for lifecycle runs.
//!
//! Each phase of a lifecycle run that changes at least one window produces a
//! [`LifecycleAuditEvent`]. The in-memory sink keeps a bounded history.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle phase that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    /// Expired windows were stamped with `archived_at`.
    Archive,
    /// Archived windows past retention were deleted.
    Purge,
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleAuditEvent {
    /// Event identifier.
    pub event_id: Uuid,
    /// Phase that ran.
    pub action: LifecycleAction,
    /// Number of windows affected.
    pub affected: u64,
    /// Time cutoff the phase applied.
    pub cutoff: DateTime<Utc>,
    /// Doctor the run was restricted to, if any.
    pub doctor_id: Option<Uuid>,
    /// When the run started.
    pub recorded_at: DateTime<Utc>,
}

impl LifecycleAuditEvent {
    /// Build an event with a fresh identifier.
    pub fn new(
        action: LifecycleAction,
        affected: u64,
        cutoff: DateTime<Utc>,
        doctor_id: Option<Uuid>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            action,
            affected,
            cutoff,
            doctor_id,
            recorded_at,
        }
    }
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: LifecycleAuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<LifecycleAuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<LifecycleAuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: LifecycleAuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Sink that shares one buffer between the caller and a lifecycle manager.
impl<S: AuditSink> AuditSink for std::sync::Arc<parking_lot::Mutex<S>> {
    fn record(&mut self, event: LifecycleAuditEvent) {
        self.lock().record(event);
    }
}
