//! Postgres statements for the availability-window lifecycle.
//!
//! Renders the schema and the two bulk lifecycle statements with positional
//! parameters. Executing them is left to whichever client the integration
//! layer uses; the caller filter is always appended with `AND`, so it can only
//! narrow the time-based predicate.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::{ArchiveCriteria, PurgeCriteria, WindowFilter};

/// Bound parameter for a rendered statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    /// `TIMESTAMPTZ` value.
    Timestamp(DateTime<Utc>),
    /// `UUID` value.
    Uuid(Uuid),
    /// `UUID[]` value.
    UuidArray(Vec<Uuid>),
}

/// SQL text with its positional parameters (`$1`, `$2`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    /// Statement text.
    pub sql: String,
    /// Parameters in positional order.
    pub params: Vec<SqlParam>,
}

impl SqlStatement {
    fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn and(&mut self, column_op: &str, param: SqlParam) {
        let placeholder = self.bind(param);
        self.sql.push_str(&format!(" AND {column_op} {placeholder}"));
    }

    fn and_filter(&mut self, filter: &WindowFilter) {
        if let Some(doctor_id) = filter.doctor_id {
            self.and("doctor_id =", SqlParam::Uuid(doctor_id));
        }
        if let Some(ids) = &filter.window_ids {
            let placeholder = self.bind(SqlParam::UuidArray(ids.clone()));
            self.sql.push_str(&format!(" AND id = ANY({placeholder})"));
        }
        if let Some(from) = filter.starts_from {
            self.and("starts_at >=", SqlParam::Timestamp(from));
        }
        if let Some(before) = filter.starts_before {
            self.and("starts_at <", SqlParam::Timestamp(before));
        }
    }
}

/// Statement builders for a Postgres-backed window store.
pub struct PostgresWindowStatements;

impl PostgresWindowStatements {
    /// Migration statements for the availability-window table.
    pub fn migrations() -> &'static [&'static str] {
        &[r"
CREATE TABLE IF NOT EXISTS availability_windows (
    id UUID PRIMARY KEY,
    doctor_id UUID NOT NULL,
    starts_at TIMESTAMPTZ NOT NULL,
    ends_at TIMESTAMPTZ NOT NULL,
    archived_at TIMESTAMPTZ,
    CHECK (ends_at >= starts_at)
);
CREATE INDEX IF NOT EXISTS idx_availability_windows_unarchived_end
    ON availability_windows (ends_at) WHERE archived_at IS NULL;
CREATE INDEX IF NOT EXISTS idx_availability_windows_archived
    ON availability_windows (archived_at) WHERE archived_at IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_availability_windows_doctor ON availability_windows (doctor_id);
"]
    }

    /// Bulk archive of unarchived windows that ended before the cutoff.
    pub fn archive(criteria: &ArchiveCriteria) -> SqlStatement {
        let mut stmt = SqlStatement::new("UPDATE availability_windows SET archived_at = ");
        let archived_at = stmt.bind(SqlParam::Timestamp(criteria.archived_at));
        stmt.sql.push_str(&archived_at);
        stmt.sql.push_str(" WHERE archived_at IS NULL");
        stmt.and("ends_at <", SqlParam::Timestamp(criteria.ended_before));
        stmt.and_filter(&criteria.filter);
        stmt
    }

    /// Bulk delete of windows archived at or before the cutoff.
    pub fn purge(criteria: &PurgeCriteria) -> SqlStatement {
        let mut stmt =
            SqlStatement::new("DELETE FROM availability_windows WHERE archived_at IS NOT NULL");
        stmt.and(
            "archived_at <=",
            SqlParam::Timestamp(criteria.archived_at_or_before),
        );
        stmt.and_filter(&criteria.filter);
        stmt
    }
}
