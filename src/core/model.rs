//! Availability windows, doctor specializations and retention policy.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A doctor's bookable time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Window identifier.
    pub id: Uuid,
    /// Owning doctor.
    pub doctor_id: Uuid,
    /// Start of the slot.
    pub starts_at: DateTime<Utc>,
    /// End of the slot.
    pub ends_at: DateTime<Utc>,
    /// When the window was archived; `None` while active or awaiting archival.
    pub archived_at: Option<DateTime<Utc>>,
}

impl AvailabilityWindow {
    /// New, unarchived window with a random identifier.
    pub fn new(doctor_id: Uuid, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            doctor_id,
            starts_at,
            ends_at,
            archived_at: None,
        }
    }

    /// Derived lifecycle state at `now`.
    pub fn state_at(&self, now: DateTime<Utc>) -> WindowState {
        if self.archived_at.is_some() {
            WindowState::Archived
        } else if self.ends_at <= now {
            WindowState::Expired
        } else {
            WindowState::Active
        }
    }

    /// Unarchived and ended strictly before `cutoff`.
    pub fn is_due_for_archive(&self, cutoff: DateTime<Utc>) -> bool {
        self.archived_at.is_none() && self.ends_at < cutoff
    }

    /// Archived at or before `cutoff`.
    pub fn is_due_for_purge(&self, cutoff: DateTime<Utc>) -> bool {
        self.archived_at.is_some_and(|archived| archived <= cutoff)
    }
}

/// Lifecycle state of a window. Never stored; deleted windows simply do not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    /// Window has not ended yet.
    Active,
    /// Window has ended but has not been archived.
    Expired,
    /// Window carries an archive timestamp.
    Archived,
}

/// Doctor specialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Specialization {
    /// General practice.
    GeneralPractice,
    /// Dentistry.
    Dentistry,
    /// Pediatrics.
    Pediatrics,
    /// Physiotherapy.
    Physiotherapy,
    /// Dermatology.
    Dermatology,
    /// Any specialization without dedicated handling, normalized to snake case.
    Other(String),
}

impl Specialization {
    /// Parse a specialization label; unknown labels become [`Specialization::Other`].
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "general_practice" | "general" | "gp" => Self::GeneralPractice,
            "dentistry" | "dental" | "dentist" => Self::Dentistry,
            "pediatrics" | "paediatrics" | "pediatric" => Self::Pediatrics,
            "physiotherapy" | "physio" | "physical_therapy" => Self::Physiotherapy,
            "dermatology" => Self::Dermatology,
            _ => Self::Other(normalized),
        }
    }
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeneralPractice => f.write_str("general_practice"),
            Self::Dentistry => f.write_str("dentistry"),
            Self::Pediatrics => f.write_str("pediatrics"),
            Self::Physiotherapy => f.write_str("physiotherapy"),
            Self::Dermatology => f.write_str("dermatology"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

impl From<String> for Specialization {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<&str> for Specialization {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl From<Specialization> for String {
    fn from(spec: Specialization) -> Self {
        spec.to_string()
    }
}

/// Caller-supplied narrowing of the windows a lifecycle run may touch.
///
/// Every field only restricts the candidate set; time-based archival and
/// purge criteria stay owned by the lifecycle manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFilter {
    /// Restrict to one doctor.
    pub doctor_id: Option<Uuid>,
    /// Restrict to these windows. An empty list matches nothing.
    pub window_ids: Option<Vec<Uuid>>,
    /// Restrict to windows starting at or after this instant.
    pub starts_from: Option<DateTime<Utc>>,
    /// Restrict to windows starting strictly before this instant.
    pub starts_before: Option<DateTime<Utc>>,
}

impl WindowFilter {
    /// Filter matching one doctor's windows.
    pub fn for_doctor(doctor_id: Uuid) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            ..Self::default()
        }
    }

    /// Restrict to specific window identifiers.
    #[must_use]
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.window_ids = Some(ids.into_iter().collect());
        self
    }

    /// Restrict to windows starting in `[from, before)`.
    #[must_use]
    pub fn starting_between(mut self, from: DateTime<Utc>, before: DateTime<Utc>) -> Self {
        self.starts_from = Some(from);
        self.starts_before = Some(before);
        self
    }

    /// Whether `window` satisfies every populated constraint.
    pub fn matches(&self, window: &AvailabilityWindow) -> bool {
        self.doctor_id.is_none_or(|id| window.doctor_id == id)
            && self
                .window_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&window.id))
            && self.starts_from.is_none_or(|from| window.starts_at >= from)
            && self
                .starts_before
                .is_none_or(|before| window.starts_at < before)
    }
}

/// Grace periods governing archival and deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Time after a window ends before it is archived.
    pub archive_grace: Duration,
    /// Time after archival before a window is deleted.
    pub purge_after: Duration,
}

impl RetentionPolicy {
    /// Policy with explicit grace periods.
    pub const fn new(archive_grace: Duration, purge_after: Duration) -> Self {
        Self {
            archive_grace,
            purge_after,
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(Duration::hours(24), Duration::hours(24))
    }
}
