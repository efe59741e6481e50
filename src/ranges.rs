//! Contiguous date ranges
//!
//! The data store caps how many rows a single query may return, so callers
//! fetch a sparse set of days as a handful of contiguous range queries. The
//! partitioner here has no opinion on working days: it only merges days that
//! are literally adjacent on the calendar.

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::format_civil_date;

/// Inclusive range of civil days, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Returns `None` when `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    pub fn date_from(&self) -> String {
        format_civil_date(self.start)
    }

    pub fn date_to(&self) -> String {
        format_civil_date(self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}..{}", self.start, self.end)
        }
    }
}

/// Collapse `dates` into the minimal sorted list of maximal contiguous ranges.
///
/// Duplicates collapse into one range; an empty input yields no ranges.
pub fn split_into_contiguous_ranges<I>(dates: I) -> Vec<DateRange>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut sorted: Vec<NaiveDate> = dates.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut days = sorted.into_iter();
    let first = match days.next() {
        Some(first) => first,
        None => return Vec::new(),
    };

    let mut ranges = Vec::new();
    let mut current = DateRange::single(first);

    for day in days {
        if day - current.end == Duration::days(1) {
            current.end = day;
        } else {
            ranges.push(current);
            current = DateRange::single(day);
        }
    }

    ranges.push(current);
    ranges
}
