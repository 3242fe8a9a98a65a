//! Archive-then-purge lifecycle for doctor availability windows.
//!
//! A run has two independent phases, each a single bulk statement issued
//! through the [`ResilientExecutor`]:
//!
//! 1. windows that ended more than `archive_grace` ago and carry no archive
//!    timestamp are stamped with `archived_at = now`;
//! 2. windows archived at least `purge_after` ago are deleted.
//!
//! Both phases are conditional predicates over persisted state, so repeating
//! a run, or running concurrently with another caller, converges to the same
//! end state. A failure between the phases leaves the store consistent and the
//! next run finishes the work.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::audit::{AuditSink, LifecycleAction, LifecycleAuditEvent};
use super::executor::{Connection, ResilientExecutor, TransientClassifier};
use super::model::{AvailabilityWindow, RetentionPolicy, WindowFilter};
use super::StorageError;
use crate::util::clock::Clock;

/// Selection for the archive phase: caller filter AND unarchived AND ended before cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveCriteria {
    /// Caller-supplied narrowing.
    pub filter: WindowFilter,
    /// Only windows ending strictly before this instant are archived.
    pub ended_before: DateTime<Utc>,
    /// Timestamp written to `archived_at`.
    pub archived_at: DateTime<Utc>,
}

impl ArchiveCriteria {
    /// Whether `window` is selected by this phase.
    pub fn matches(&self, window: &AvailabilityWindow) -> bool {
        window.is_due_for_archive(self.ended_before) && self.filter.matches(window)
    }
}

/// Selection for the purge phase: caller filter AND archived at or before cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeCriteria {
    /// Caller-supplied narrowing.
    pub filter: WindowFilter,
    /// Only windows archived at or before this instant are deleted.
    pub archived_at_or_before: DateTime<Utc>,
}

impl PurgeCriteria {
    /// Whether `window` is selected by this phase.
    pub fn matches(&self, window: &AvailabilityWindow) -> bool {
        window.is_due_for_purge(self.archived_at_or_before) && self.filter.matches(window)
    }
}

/// Bulk conditional operations over persisted availability windows.
///
/// Each call must apply atomically to every matching row.
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Set `archived_at` on every window selected by `criteria`; returns the count.
    async fn archive_matching(&self, criteria: &ArchiveCriteria) -> Result<u64, StorageError>;

    /// Delete every window selected by `criteria`; returns the count.
    async fn purge_matching(&self, criteria: &PurgeCriteria) -> Result<u64, StorageError>;
}

/// Outcome of one lifecycle run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleReport {
    /// Instant the run used as `now`.
    pub ran_at: DateTime<Utc>,
    /// Windows archived by this run.
    pub archived: u64,
    /// Windows deleted by this run.
    pub purged: u64,
}

impl LifecycleReport {
    /// `true` when the run changed nothing.
    pub const fn is_noop(&self) -> bool {
        self.archived == 0 && self.purged == 0
    }
}

/// Ages out availability windows through archive and purge.
pub struct DutyHourLifecycleManager<S> {
    store: Arc<S>,
    executor: ResilientExecutor<S>,
    clock: Arc<dyn Clock>,
    retention: RetentionPolicy,
    audit: Option<Mutex<Box<dyn AuditSink>>>,
}

impl<S> DutyHourLifecycleManager<S>
where
    S: WindowStore + Connection + 'static,
{
    /// Manager with default retention and transient-error classification.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            executor: ResilientExecutor::new(Arc::clone(&store)),
            store,
            clock,
            retention: RetentionPolicy::default(),
            audit: None,
        }
    }

    /// Override the retention periods.
    #[must_use]
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Use a caller-supplied transient-error classifier for store calls.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn TransientClassifier>) -> Self {
        self.executor = ResilientExecutor::with_classifier(Arc::clone(&self.store), classifier);
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Mutex::new(audit));
        self
    }

    /// Retention periods in effect.
    pub const fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Executor wrapping store calls.
    pub const fn executor(&self) -> &ResilientExecutor<S> {
        &self.executor
    }

    /// Archive expired windows, then purge windows past retention.
    ///
    /// `filter` only narrows the affected set. Storage errors from either
    /// phase are returned unchanged; an archive phase that already committed
    /// is not rolled back.
    pub async fn archive_expired_windows(
        &self,
        filter: Option<&WindowFilter>,
    ) -> Result<LifecycleReport, StorageError> {
        let now = self.clock.now();
        let filter = filter.cloned().unwrap_or_default();

        let archive = ArchiveCriteria {
            filter: filter.clone(),
            ended_before: now - self.retention.archive_grace,
            archived_at: now,
        };
        let archived = self
            .executor
            .execute(|| self.store.archive_matching(&archive))
            .await?;
        if archived > 0 {
            tracing::info!(
                "archived {} availability windows ended before {}",
                archived,
                archive.ended_before
            );
            self.record_audit(LifecycleAction::Archive, archived, archive.ended_before, &filter, now);
        }

        // Windows stamped by this run stay archived until a later run.
        let purge = PurgeCriteria {
            filter,
            archived_at_or_before: (now - self.retention.purge_after)
                .min(now - Duration::nanoseconds(1)),
        };
        let purged = self
            .executor
            .execute(|| self.store.purge_matching(&purge))
            .await?;
        if purged > 0 {
            tracing::info!(
                "purged {} availability windows archived by {}",
                purged,
                purge.archived_at_or_before
            );
            self.record_audit(
                LifecycleAction::Purge,
                purged,
                purge.archived_at_or_before,
                &purge.filter,
                now,
            );
        }

        tracing::debug!("lifecycle run at {} finished", now);
        Ok(LifecycleReport {
            ran_at: now,
            archived,
            purged,
        })
    }

    fn record_audit(
        &self,
        action: LifecycleAction,
        affected: u64,
        cutoff: DateTime<Utc>,
        filter: &WindowFilter,
        now: DateTime<Utc>,
    ) {
        if let Some(audit) = &self.audit {
            audit.lock().record(LifecycleAuditEvent::new(
                action,
                affected,
                cutoff,
                filter.doctor_id,
                now,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, h, 0, 0).unwrap()
    }

    #[test]
    fn archive_criteria_requires_unarchived_and_expired() {
        let doctor = Uuid::new_v4();
        let criteria = ArchiveCriteria {
            filter: WindowFilter::default(),
            ended_before: at(10, 12),
            archived_at: at(11, 12),
        };
        let mut window = AvailabilityWindow::new(doctor, at(10, 9), at(10, 11));
        assert!(criteria.matches(&window));

        window.ends_at = at(10, 12);
        assert!(!criteria.matches(&window));

        window.ends_at = at(10, 11);
        window.archived_at = Some(at(10, 13));
        assert!(!criteria.matches(&window));
    }

    #[test]
    fn purge_criteria_is_inclusive_and_filtered() {
        let doctor = Uuid::new_v4();
        let mut window = AvailabilityWindow::new(doctor, at(1, 9), at(1, 10));
        window.archived_at = Some(at(2, 12));

        let criteria = PurgeCriteria {
            filter: WindowFilter::for_doctor(doctor),
            archived_at_or_before: at(2, 12),
        };
        assert!(criteria.matches(&window));

        let earlier = PurgeCriteria {
            archived_at_or_before: at(2, 12) - Duration::seconds(1),
            ..criteria.clone()
        };
        assert!(!earlier.matches(&window));

        let other_doctor = PurgeCriteria {
            filter: WindowFilter::for_doctor(Uuid::new_v4()),
            ..criteria
        };
        assert!(!other_doctor.matches(&window));
    }

    #[test]
    fn report_noop() {
        let report = LifecycleReport {
            ran_at: at(1, 0),
            archived: 0,
            purged: 0,
        };
        assert!(report.is_noop());
    }
}
