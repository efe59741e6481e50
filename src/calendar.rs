//! Working-day calendar for the business timezone
//!
//! Every date in this module is a civil day (`NaiveDate`) as observed in the
//! business timezone. Instants are only turned into civil days through
//! [`BusinessCalendar`], so arithmetic here never crosses a daylight-saving
//! boundary.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ranges::DateRange;

/// Timezone the dashboards report in unless configured otherwise.
pub const DEFAULT_BUSINESS_TIMEZONE: Tz = chrono_tz::America::New_York;

/// ISO civil date format used for every date sent to the data store.
pub const CIVIL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Upper bound on the backward walk that clamps a date to a working day.
const MAX_CLAMP_STEPS: u32 = 14;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("no working day found within {steps} days before {from}")]
    BoundedSearchExceeded { from: NaiveDate, steps: u32 },
}

/// Which weekend days count as non-working.
///
/// The default treats only Sunday as non-working; Saturday is a working day
/// unless `exclude_saturday` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDayPolicy {
    pub include_sunday: bool,
    pub exclude_saturday: bool,
}

impl WorkingDayPolicy {
    pub fn new(include_sunday: bool, exclude_saturday: bool) -> Self {
        Self { include_sunday, exclude_saturday }
    }

    /// Monday to Friday only.
    pub fn weekdays_only() -> Self {
        Self { include_sunday: false, exclude_saturday: true }
    }
}

/// Converts instants into civil days of a fixed business timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    timezone: Tz,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::new(DEFAULT_BUSINESS_TIMEZONE)
    }
}

impl BusinessCalendar {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Parse an IANA timezone name such as `America/New_York`.
    pub fn from_name(name: &str) -> anyhow::Result<Self> {
        let timezone: Tz = name
            .parse()
            .map_err(|e| anyhow::anyhow!("Unknown business timezone {}: {}", name, e))?;
        Ok(Self::new(timezone))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Civil day of `instant` in the business timezone.
    pub fn civil_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.civil_date(Utc::now())
    }

    pub fn weekday(&self, instant: DateTime<Utc>) -> Weekday {
        self.civil_date(instant).weekday()
    }

    /// Short weekday name ("Sun".."Sat") of `instant` in the business timezone.
    pub fn weekday_name(&self, instant: DateTime<Utc>) -> &'static str {
        weekday_short_name(self.weekday(instant))
    }

    /// `YYYY-MM-DD` of `instant` in the business timezone.
    pub fn format_civil_date(&self, instant: DateTime<Utc>) -> String {
        format_civil_date(self.civil_date(instant))
    }
}

pub fn format_civil_date(date: NaiveDate) -> String {
    date.format(CIVIL_DATE_FORMAT).to_string()
}

pub fn parse_civil_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), CIVIL_DATE_FORMAT)
        .map_err(|e| anyhow::anyhow!("Invalid date {:?} (expected YYYY-MM-DD): {}", value, e))
}

pub fn weekday_short_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sun",
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
    }
}

pub fn is_working_day(date: NaiveDate, policy: WorkingDayPolicy) -> bool {
    match date.weekday() {
        Weekday::Sun => policy.include_sunday,
        Weekday::Sat => !policy.exclude_saturday,
        _ => true,
    }
}

/// Latest working day at or before `date`.
pub fn previous_working_day(
    date: NaiveDate,
    policy: WorkingDayPolicy,
) -> Result<NaiveDate, CalendarError> {
    let mut cursor = date;
    for _ in 0..MAX_CLAMP_STEPS {
        if is_working_day(cursor, policy) {
            return Ok(cursor);
        }
        cursor = match cursor.pred_opt() {
            Some(previous) => previous,
            None => break,
        };
    }

    Err(CalendarError::BoundedSearchExceeded { from: date, steps: MAX_CLAMP_STEPS })
}

/// Working days in `start..=end`, ascending.
pub fn working_days_between(
    start: NaiveDate,
    end: NaiveDate,
    policy: WorkingDayPolicy,
) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| is_working_day(*day, policy))
        .collect()
}

/// The `n` working days ending at the latest working day on or before
/// `end_inclusive`, ascending.
pub fn last_n_working_days(
    end_inclusive: NaiveDate,
    n: usize,
    policy: WorkingDayPolicy,
) -> Result<Vec<NaiveDate>, CalendarError> {
    if n == 0 {
        return Ok(Vec::new());
    }

    let end = previous_working_day(end_inclusive, policy)?;
    let max_steps = n.saturating_mul(7).saturating_add(MAX_CLAMP_STEPS as usize);

    let mut dates = Vec::with_capacity(n);
    let mut cursor = Some(end);
    let mut steps = 0usize;

    while dates.len() < n {
        let day = match cursor {
            Some(day) if steps < max_steps => day,
            _ => {
                return Err(CalendarError::BoundedSearchExceeded {
                    from: end_inclusive,
                    steps: u32::try_from(steps).unwrap_or(u32::MAX),
                })
            }
        };

        if is_working_day(day, policy) {
            dates.push(day);
        }
        cursor = day.pred_opt();
        steps += 1;
    }

    dates.reverse();
    Ok(dates)
}

/// The period of equal working-day length immediately preceding `current`.
///
/// The window ends the day before the earliest date in `current` and is
/// clamped to a working day like [`last_n_working_days`].
pub fn previous_comparison_window(
    current: &[NaiveDate],
    policy: WorkingDayPolicy,
) -> Result<Vec<NaiveDate>, CalendarError> {
    let earliest = match current.iter().min() {
        Some(earliest) => *earliest,
        None => return Ok(Vec::new()),
    };

    let previous_end = match earliest.pred_opt() {
        Some(day) => day,
        None => return Err(CalendarError::BoundedSearchExceeded { from: earliest, steps: 0 }),
    };

    last_n_working_days(previous_end, current.len(), policy)
}

/// Calendar period of the same length ending the day before `range.start`.
///
/// `None` when that period would start before the first representable date.
pub fn previous_period_range(range: &DateRange) -> Option<DateRange> {
    let end = range.start.pred_opt()?;
    let start = end.checked_sub_signed(Duration::days(range.days() - 1))?;
    Some(DateRange { start, end })
}
