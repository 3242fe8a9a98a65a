//! Civil-calendar adapter for the clinic's fixed time zone.
//!
//! All date arithmetic in the engine goes through [`CalendarAdapter`]: the
//! booking calculator never inspects offsets itself. [`ClinicCalendar`] is the
//! `chrono-tz` backed implementation for a single IANA zone.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A calendar date as observed in the clinic's time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CivilDay {
    /// Civil date.
    pub date: NaiveDate,
    /// Day of week, `None` when it could not be determined.
    pub weekday: Option<Weekday>,
}

impl CivilDay {
    /// Civil day whose weekday is derived from the date itself.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date,
            weekday: Some(date.weekday()),
        }
    }

    /// Civil day whose weekday comes from an external label such as `"Saturday"`.
    pub fn from_label(date: NaiveDate, label: &str) -> Self {
        Self {
            date,
            weekday: parse_weekday(label),
        }
    }
}

/// Parse a weekday name (`"sat"`, `"Saturday"`, case-insensitive).
pub fn parse_weekday(label: &str) -> Option<Weekday> {
    label.trim().parse::<Weekday>().ok()
}

/// Conversion between instants and civil days in one fixed time zone.
pub trait CalendarAdapter: Send + Sync {
    /// Civil day containing `instant`.
    fn to_civil_day(&self, instant: DateTime<Utc>) -> CivilDay;

    /// Civil day for a date already expressed in the clinic's calendar.
    fn civil_day(&self, date: NaiveDate) -> CivilDay {
        CivilDay::from_date(date)
    }

    /// First instant of `date` in the clinic's time zone.
    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc>;
}

/// `chrono-tz` backed calendar for a single clinic time zone.
#[derive(Debug, Clone, Copy)]
pub struct ClinicCalendar {
    tz: Tz,
}

impl ClinicCalendar {
    /// Calendar for the given zone.
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Calendar for an IANA zone name such as `Europe/Berlin`.
    pub fn from_name(name: &str) -> Result<Self, String> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|e| format!("unknown time zone `{name}`: {e}"))
    }

    /// The configured zone.
    pub const fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Default for ClinicCalendar {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl CalendarAdapter for ClinicCalendar {
    fn to_civil_day(&self, instant: DateTime<Utc>) -> CivilDay {
        CivilDay::from_date(instant.with_timezone(&self.tz).date_naive())
    }

    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        // Ambiguous midnights resolve to the earlier offset; skipped midnights
        // (DST starting at 00:00) resolve to the first local time that exists.
        self.tz
            .from_local_datetime(&midnight)
            .earliest()
            .or_else(|| {
                (1..=96).find_map(|step| {
                    self.tz
                        .from_local_datetime(&(midnight + Duration::minutes(15 * step)))
                        .earliest()
                })
            })
            .map_or_else(
                || Utc.from_utc_datetime(&midnight),
                |local| local.with_timezone(&Utc),
            )
    }
}
