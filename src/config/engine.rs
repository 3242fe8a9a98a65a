//! Engine configuration structures.

use std::collections::BTreeMap;

use anyhow::Context;
use chrono::{Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::core::executor::DEFAULT_TRANSIENT_SIGNATURES;
use crate::core::{
    AppResult, DisconnectClassifier, RetentionPolicy, Specialization, WeeklyClosingPolicy,
    DEFAULT_MIN_LEAD_DAYS,
};
use crate::util::calendar::{parse_weekday, ClinicCalendar};

/// Upper bound accepted for any configured duration (ten years).
const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Upper bound accepted for the booking lead time.
const MAX_LEAD_DAYS: u32 = 366;

/// Clinic calendar configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    /// IANA time zone the clinic operates in.
    pub timezone: String,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".into(),
        }
    }
}

impl ClinicConfig {
    /// Validate the time zone name.
    pub fn validate(&self) -> Result<(), String> {
        self.calendar().map(|_| ())
    }

    /// Calendar for the configured zone.
    pub fn calendar(&self) -> Result<ClinicCalendar, String> {
        ClinicCalendar::from_name(&self.timezone)
    }
}

/// Booking-window policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Minimum days between now and the earliest bookable date.
    pub min_lead_days: u32,
    /// Weekdays closed for every specialization.
    pub closed_weekdays: Vec<String>,
    /// Weekdays closed except for the listed specializations.
    pub restricted_weekdays: BTreeMap<String, Vec<Specialization>>,
    /// Civil dates the clinic is closed.
    pub holidays: Vec<NaiveDate>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            min_lead_days: DEFAULT_MIN_LEAD_DAYS,
            closed_weekdays: vec!["sunday".into()],
            restricted_weekdays: BTreeMap::from([(
                "saturday".to_string(),
                vec![Specialization::Physiotherapy],
            )]),
            holidays: Vec::new(),
        }
    }
}

impl BookingConfig {
    /// Validate lead time and weekday labels.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_lead_days > MAX_LEAD_DAYS {
            return Err(format!("min_lead_days must be at most {MAX_LEAD_DAYS}"));
        }
        let closed = parse_weekdays(&self.closed_weekdays)?;
        for label in self.restricted_weekdays.keys() {
            let weekday = parse_label(label)?;
            if closed.contains(&weekday) {
                return Err(format!(
                    "weekday `{label}` cannot be both closed and restricted"
                ));
            }
        }
        Ok(())
    }

    /// Weekly closing policy described by this configuration.
    pub fn closing_policy(&self) -> Result<WeeklyClosingPolicy, String> {
        self.validate()?;
        let mut policy = WeeklyClosingPolicy::open_every_day();
        for weekday in parse_weekdays(&self.closed_weekdays)? {
            policy = policy.close(weekday);
        }
        for (label, open_for) in &self.restricted_weekdays {
            policy = policy.restrict(parse_label(label)?, open_for.iter().cloned());
        }
        Ok(policy)
    }
}

fn parse_label(label: &str) -> Result<Weekday, String> {
    parse_weekday(label).ok_or_else(|| format!("unknown weekday `{label}`"))
}

fn parse_weekdays(labels: &[String]) -> Result<Vec<Weekday>, String> {
    labels.iter().map(|label| parse_label(label)).collect()
}

/// Archive and purge grace periods in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Seconds after a window ends before it is archived.
    pub archive_grace_secs: u64,
    /// Seconds after archival before a window is deleted.
    pub purge_after_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            archive_grace_secs: 24 * 60 * 60,
            purge_after_secs: 24 * 60 * 60,
        }
    }
}

impl RetentionConfig {
    /// Validate duration bounds. Both periods must be at least one second.
    pub fn validate(&self) -> Result<(), String> {
        if self.archive_grace_secs == 0 {
            return Err("archive_grace_secs must be greater than 0".into());
        }
        if self.purge_after_secs == 0 {
            return Err("purge_after_secs must be greater than 0".into());
        }
        if self.archive_grace_secs > MAX_DURATION_SECS {
            return Err("archive_grace_secs is too large".into());
        }
        if self.purge_after_secs > MAX_DURATION_SECS {
            return Err("purge_after_secs is too large".into());
        }
        Ok(())
    }

    /// Retention policy described by this configuration.
    pub fn policy(&self) -> Result<RetentionPolicy, String> {
        self.validate()?;
        Ok(RetentionPolicy::new(
            seconds(self.archive_grace_secs),
            seconds(self.purge_after_secs),
        ))
    }
}

fn seconds(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1_000))
}

/// Storage access configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Backend error fragments treated as a dropped connection.
    pub transient_signatures: Vec<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            transient_signatures: DEFAULT_TRANSIENT_SIGNATURES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl ExecutorConfig {
    /// Reject blank signatures, which would match every error.
    pub fn validate(&self) -> Result<(), String> {
        if self.transient_signatures.iter().any(|s| s.trim().is_empty()) {
            return Err("transient_signatures must not contain empty entries".into());
        }
        Ok(())
    }

    /// Classifier described by this configuration.
    pub fn classifier(&self) -> DisconnectClassifier {
        DisconnectClassifier::with_signatures(self.transient_signatures.iter().cloned())
    }
}

/// Periodic lifecycle sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Whether a periodic sweep should be started.
    pub enabled: bool,
    /// Seconds between sweeps.
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 60 * 60,
        }
    }
}

impl SweepConfig {
    /// Validate the interval.
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.interval_secs == 0 {
            return Err("interval_secs must be greater than 0".into());
        }
        if self.interval_secs > MAX_DURATION_SECS {
            return Err("interval_secs is too large".into());
        }
        Ok(())
    }

    /// Interval between sweeps.
    pub const fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }
}

/// Root engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Clinic calendar.
    pub clinic: ClinicConfig,
    /// Booking-window policy.
    pub booking: BookingConfig,
    /// Archive and purge retention.
    pub retention: RetentionConfig,
    /// Storage access.
    pub executor: ExecutorConfig,
    /// Periodic sweep.
    pub sweep: SweepConfig,
}

impl EngineConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.clinic
            .validate()
            .map_err(|e| format!("clinic invalid: {e}"))?;
        self.booking
            .validate()
            .map_err(|e| format!("booking invalid: {e}"))?;
        self.retention
            .validate()
            .map_err(|e| format!("retention invalid: {e}"))?;
        self.executor
            .validate()
            .map_err(|e| format!("executor invalid: {e}"))?;
        self.sweep
            .validate()
            .map_err(|e| format!("sweep invalid: {e}"))?;
        Ok(())
    }

    /// Parse engine configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file is read first if present. `CLINIC_ENGINE_CONFIG` may
    /// point at a JSON file used as the base; individual variables override it.
    pub fn from_env() -> AppResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("loaded environment from {}", path.display());
        }
        let mut cfg = match std::env::var("CLINIC_ENGINE_CONFIG") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {path}"))?;
                Self::from_json_str(&raw).map_err(anyhow::Error::msg)?
            }
            Err(_) => Self::default(),
        };
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }

    /// Apply `KEY=value` overrides from `lookup`.
    ///
    /// Recognized keys: `CLINIC_TIMEZONE`, `BOOKING_MIN_LEAD_DAYS`,
    /// `ARCHIVE_GRACE_SECS`, `PURGE_AFTER_SECS`, `SWEEP_ENABLED`,
    /// `SWEEP_INTERVAL_SECS`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tz) = lookup("CLINIC_TIMEZONE") {
            self.clinic.timezone = tz;
        }
        if let Some(days) = lookup("BOOKING_MIN_LEAD_DAYS") {
            self.booking.min_lead_days = days
                .trim()
                .parse()
                .with_context(|| format!("BOOKING_MIN_LEAD_DAYS must be a day count, got `{days}`"))?;
        }
        if let Some(secs) = lookup("ARCHIVE_GRACE_SECS") {
            self.retention.archive_grace_secs = parse_secs("ARCHIVE_GRACE_SECS", &secs)?;
        }
        if let Some(secs) = lookup("PURGE_AFTER_SECS") {
            self.retention.purge_after_secs = parse_secs("PURGE_AFTER_SECS", &secs)?;
        }
        if let Some(enabled) = lookup("SWEEP_ENABLED") {
            self.sweep.enabled = matches!(
                enabled.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(secs) = lookup("SWEEP_INTERVAL_SECS") {
            self.sweep.interval_secs = parse_secs("SWEEP_INTERVAL_SECS", &secs)?;
        }
        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> AppResult<u64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a number of seconds, got `{value}`"))
}
