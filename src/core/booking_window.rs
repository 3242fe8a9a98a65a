//! Earliest-bookable-date calculation under clinic closing-day rules.
//!
//! The calculator adds the minimum lead time to `now`, maps the result onto
//! the clinic's civil calendar and walks forward one day at a time until the
//! [`ClosingDayPolicy`] reports an open day. The walk is bounded to
//! [`MAX_SEARCH_DAYS`] evaluations; when a policy closes every day in that
//! range the last evaluated day is returned instead of failing.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};

use crate::core::{BookingError, Specialization};
use crate::util::calendar::{CalendarAdapter, CivilDay, ClinicCalendar};

/// Default minimum number of days between now and the earliest booking.
pub const DEFAULT_MIN_LEAD_DAYS: u32 = 3;

/// Maximum number of civil days evaluated per search.
///
/// The first candidate day counts as the first evaluation, so a search
/// advances at most `MAX_SEARCH_DAYS - 1` days past it. When every evaluated
/// day is closed the fallback is the first candidate plus 30 days.
pub const MAX_SEARCH_DAYS: u32 = 31;

/// Decides whether the clinic is closed on a civil day for a specialization.
pub trait ClosingDayPolicy: Send + Sync {
    /// `true` when `day` cannot be booked for `specialization`.
    fn is_closed(&self, day: &CivilDay, specialization: Option<&Specialization>) -> bool;
}

impl<F> ClosingDayPolicy for F
where
    F: Fn(&CivilDay, Option<&Specialization>) -> bool + Send + Sync,
{
    fn is_closed(&self, day: &CivilDay, specialization: Option<&Specialization>) -> bool {
        self(day, specialization)
    }
}

/// Weekly closing rules: some weekdays are always closed, others are closed
/// except for a set of specializations.
///
/// The default closes Sunday for everyone and Saturday for everyone but
/// physiotherapy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyClosingPolicy {
    always_closed: HashSet<Weekday>,
    restricted: HashMap<Weekday, HashSet<Specialization>>,
}

impl WeeklyClosingPolicy {
    /// Policy with every weekday open.
    pub fn open_every_day() -> Self {
        Self {
            always_closed: HashSet::new(),
            restricted: HashMap::new(),
        }
    }

    /// Close `weekday` for every specialization.
    #[must_use]
    pub fn close(mut self, weekday: Weekday) -> Self {
        self.restricted.remove(&weekday);
        self.always_closed.insert(weekday);
        self
    }

    /// Close `weekday` except for the listed specializations.
    #[must_use]
    pub fn restrict(
        mut self,
        weekday: Weekday,
        open_for: impl IntoIterator<Item = Specialization>,
    ) -> Self {
        self.always_closed.remove(&weekday);
        self.restricted
            .entry(weekday)
            .or_default()
            .extend(open_for);
        self
    }

    /// Weekdays closed for everyone.
    pub const fn always_closed(&self) -> &HashSet<Weekday> {
        &self.always_closed
    }

    /// Specializations allowed on an otherwise closed `weekday`, if it is restricted.
    pub fn open_for(&self, weekday: Weekday) -> Option<&HashSet<Specialization>> {
        self.restricted.get(&weekday)
    }
}

impl Default for WeeklyClosingPolicy {
    fn default() -> Self {
        Self::open_every_day()
            .close(Weekday::Sun)
            .restrict(Weekday::Sat, [Specialization::Physiotherapy])
    }
}

impl ClosingDayPolicy for WeeklyClosingPolicy {
    fn is_closed(&self, day: &CivilDay, specialization: Option<&Specialization>) -> bool {
        // Unknown weekday: fewer bookable days rather than more.
        let Some(weekday) = day.weekday else {
            return true;
        };
        if self.always_closed.contains(&weekday) {
            return true;
        }
        self.restricted.get(&weekday).is_some_and(|open_for| {
            !specialization.is_some_and(|spec| open_for.contains(spec))
        })
    }
}

/// Closes fixed civil dates on top of another policy.
#[derive(Debug, Clone)]
pub struct HolidayClosingPolicy<P> {
    inner: P,
    holidays: BTreeSet<NaiveDate>,
}

impl<P: ClosingDayPolicy> HolidayClosingPolicy<P> {
    /// Wrap `inner`, closing every date in `holidays`.
    pub fn new(inner: P, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            inner,
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Configured holidays in ascending order.
    pub const fn holidays(&self) -> &BTreeSet<NaiveDate> {
        &self.holidays
    }
}

impl<P: ClosingDayPolicy> ClosingDayPolicy for HolidayClosingPolicy<P> {
    fn is_closed(&self, day: &CivilDay, specialization: Option<&Specialization>) -> bool {
        self.holidays.contains(&day.date) || self.inner.is_closed(day, specialization)
    }
}

/// A requested day that passed the booking-window check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedBooking {
    /// Requested civil day.
    pub requested: CivilDay,
    /// Earliest bookable civil date at the time of the check.
    pub earliest: NaiveDate,
}

/// Search outcome when every evaluated day was closed.
struct Exhausted {
    first: NaiveDate,
    last: NaiveDate,
}

/// Computes the earliest date a doctor may be booked.
#[derive(Debug, Clone)]
pub struct BookingWindowCalculator<C = ClinicCalendar, P = WeeklyClosingPolicy> {
    calendar: C,
    policy: P,
    min_lead_days: u32,
}

impl<C, P> BookingWindowCalculator<C, P>
where
    C: CalendarAdapter,
    P: ClosingDayPolicy,
{
    /// Calculator with the default lead of [`DEFAULT_MIN_LEAD_DAYS`].
    pub const fn new(calendar: C, policy: P) -> Self {
        Self {
            calendar,
            policy,
            min_lead_days: DEFAULT_MIN_LEAD_DAYS,
        }
    }

    /// Override the default lead time.
    #[must_use]
    pub const fn with_min_lead_days(mut self, min_lead_days: u32) -> Self {
        self.min_lead_days = min_lead_days;
        self
    }

    /// Default lead time in days.
    pub const fn min_lead_days(&self) -> u32 {
        self.min_lead_days
    }

    /// Calendar used for civil-date conversion.
    pub const fn calendar(&self) -> &C {
        &self.calendar
    }

    /// Whether `day` can be booked for `specialization`.
    pub fn is_open(&self, day: &CivilDay, specialization: Option<&Specialization>) -> bool {
        !self.policy.is_closed(day, specialization)
    }

    /// Start of the earliest bookable civil day using the configured lead time.
    pub fn earliest_bookable_date(
        &self,
        now: DateTime<Utc>,
        specialization: Option<&Specialization>,
    ) -> DateTime<Utc> {
        self.earliest_bookable_date_with_lead(now, specialization, self.min_lead_days)
    }

    /// Start of the earliest bookable civil day at least `min_lead_days` after `now`.
    ///
    /// Never fails: if no open day exists within [`MAX_SEARCH_DAYS`], the start
    /// of the last evaluated day is returned.
    pub fn earliest_bookable_date_with_lead(
        &self,
        now: DateTime<Utc>,
        specialization: Option<&Specialization>,
        min_lead_days: u32,
    ) -> DateTime<Utc> {
        let date = match self.search(now, specialization, min_lead_days) {
            Ok(day) => day.date,
            Err(exhausted) => {
                tracing::warn!(
                    "no open day within {} days of {} for {:?}; falling back to {}",
                    MAX_SEARCH_DAYS,
                    exhausted.first,
                    specialization,
                    exhausted.last
                );
                exhausted.last
            }
        };
        self.calendar.start_of_day(date)
    }

    /// Like [`Self::earliest_bookable_date_with_lead`] but reports an exhausted
    /// search as [`BookingError::PolicyExhausted`].
    pub fn try_earliest_bookable_date_with_lead(
        &self,
        now: DateTime<Utc>,
        specialization: Option<&Specialization>,
        min_lead_days: u32,
    ) -> Result<DateTime<Utc>, BookingError> {
        self.search(now, specialization, min_lead_days)
            .map(|day| self.calendar.start_of_day(day.date))
            .map_err(|exhausted| BookingError::PolicyExhausted {
                first_candidate: exhausted.first,
                searched_days: MAX_SEARCH_DAYS,
            })
    }

    /// Validate a requested appointment instant against the booking window.
    ///
    /// Accepts the requested civil day when it is on or after the earliest
    /// bookable date and the clinic is open for `specialization` on it. The
    /// earliest date is returned either way, inside the acceptance or the error.
    pub fn check_requested_date(
        &self,
        now: DateTime<Utc>,
        specialization: Option<&Specialization>,
        requested: DateTime<Utc>,
    ) -> Result<AcceptedBooking, BookingError> {
        let earliest = self
            .calendar
            .to_civil_day(self.earliest_bookable_date(now, specialization))
            .date;
        let requested = self.calendar.to_civil_day(requested);

        if requested.date < earliest {
            tracing::debug!(
                "rejecting booking on {}: earliest is {}",
                requested.date,
                earliest
            );
            return Err(BookingError::TooEarly {
                requested: requested.date,
                earliest,
            });
        }
        if !self.is_open(&requested, specialization) {
            tracing::debug!("rejecting booking on closed day {}", requested.date);
            return Err(BookingError::ClosedDay {
                date: requested.date,
                weekday: requested.weekday,
                earliest,
            });
        }
        Ok(AcceptedBooking {
            requested,
            earliest,
        })
    }

    fn search(
        &self,
        now: DateTime<Utc>,
        specialization: Option<&Specialization>,
        min_lead_days: u32,
    ) -> Result<CivilDay, Exhausted> {
        let candidate = now
            .checked_add_signed(Duration::days(i64::from(min_lead_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let first = self.calendar.to_civil_day(candidate);

        let mut day = first;
        for evaluated in 1..=MAX_SEARCH_DAYS {
            if !self.policy.is_closed(&day, specialization) {
                tracing::debug!(
                    "earliest bookable day for {:?} is {} after {} evaluation(s)",
                    specialization,
                    day.date,
                    evaluated
                );
                return Ok(day);
            }
            if evaluated == MAX_SEARCH_DAYS {
                break;
            }
            match day.date.succ_opt() {
                Some(next) => day = self.calendar.civil_day(next),
                None => break,
            }
        }

        Err(Exhausted {
            first: first.date,
            last: day.date,
        })
    }
}
