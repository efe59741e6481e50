//! Working-day calendar tests

use chrono::{Datelike, Duration, TimeZone, Utc, Weekday};
use pretty_assertions::assert_eq;
use test_log::test;

use crate::common::test_data::{create_test_date_range, date};
use deal_flow::calendar::{
    is_working_day, last_n_working_days, previous_comparison_window, previous_working_day, working_days_between,
    BusinessCalendar, WorkingDayPolicy,
};

#[test]
fn test_default_policy_only_sunday_is_off() {
    // Two full weeks starting Monday 2024-01-08
    for day in create_test_date_range(date(2024, 1, 8), 14) {
        let expected = day.weekday() != Weekday::Sun;
        assert_eq!(is_working_day(day, WorkingDayPolicy::default()), expected, "{}", day);
    }
}

#[test]
fn test_last_three_working_days_from_sunday() {
    let sunday = date(2024, 1, 14);

    let default_days = last_n_working_days(sunday, 3, WorkingDayPolicy::default()).unwrap();
    assert_eq!(default_days, vec![date(2024, 1, 11), date(2024, 1, 12), date(2024, 1, 13)]);

    let weekdays = last_n_working_days(sunday, 3, WorkingDayPolicy::weekdays_only()).unwrap();
    assert_eq!(weekdays, vec![date(2024, 1, 10), date(2024, 1, 11), date(2024, 1, 12)]);
}

#[test]
fn test_last_n_working_days_length_and_order() {
    let policies = [
        WorkingDayPolicy::default(),
        WorkingDayPolicy::weekdays_only(),
        WorkingDayPolicy::new(true, false),
        WorkingDayPolicy::new(true, true),
    ];

    for policy in policies {
        for end in create_test_date_range(date(2024, 2, 20), 10) {
            for n in [1usize, 2, 5, 13, 40] {
                let days = last_n_working_days(end, n, policy).unwrap();
                assert_eq!(days.len(), n);
                assert!(days.windows(2).all(|w| w[0] < w[1]));
                assert!(days.iter().all(|d| is_working_day(*d, policy) && *d <= end));
            }
        }
    }
}

#[test]
fn test_zero_days_is_empty() {
    assert!(last_n_working_days(date(2024, 1, 14), 0, WorkingDayPolicy::default())
        .unwrap()
        .is_empty());
}

#[test]
fn test_comparison_window_precedes_current() {
    let current = vec![date(2024, 1, 15), date(2024, 1, 16)];
    let previous = previous_comparison_window(&current, WorkingDayPolicy::default()).unwrap();
    assert_eq!(previous, vec![date(2024, 1, 12), date(2024, 1, 13)]);

    let weekdays = previous_comparison_window(&current, WorkingDayPolicy::weekdays_only()).unwrap();
    assert_eq!(weekdays, vec![date(2024, 1, 11), date(2024, 1, 12)]);

    assert!(previous_comparison_window(&[], WorkingDayPolicy::default()).unwrap().is_empty());
}

#[test]
fn test_working_days_between_is_inclusive() {
    let days = working_days_between(date(2024, 1, 12), date(2024, 1, 15), WorkingDayPolicy::default());
    assert_eq!(days, vec![date(2024, 1, 12), date(2024, 1, 13), date(2024, 1, 15)]);

    assert!(working_days_between(date(2024, 1, 15), date(2024, 1, 12), WorkingDayPolicy::default()).is_empty());
}

#[test]
fn test_previous_working_day_clamps_weekend() {
    let weekdays = WorkingDayPolicy::weekdays_only();
    assert_eq!(previous_working_day(date(2024, 1, 14), weekdays).unwrap(), date(2024, 1, 12));
    assert_eq!(previous_working_day(date(2024, 1, 12), weekdays).unwrap(), date(2024, 1, 12));
}

#[test]
fn test_business_timezone_decides_the_day() {
    let calendar = BusinessCalendar::default();

    // Monday 03:00 UTC is still Sunday evening in New York
    let instant = Utc.with_ymd_and_hms(2024, 1, 15, 3, 0, 0).unwrap();
    assert_eq!(calendar.weekday(instant), Weekday::Sun);
    assert_eq!(calendar.weekday_name(instant), "Sun");
    assert_eq!(calendar.format_civil_date(instant), "2024-01-14");

    let later = instant + Duration::hours(1);
    assert_eq!(calendar.civil_date(later), date(2024, 1, 14));
    assert_eq!(calendar.civil_date(later + Duration::hours(3)), date(2024, 1, 15));
}

#[test]
fn test_custom_business_timezone() {
    let calendar = BusinessCalendar::from_name("Asia/Karachi").unwrap();
    let instant = Utc.with_ymd_and_hms(2024, 1, 13, 20, 0, 0).unwrap();
    assert_eq!(calendar.civil_date(instant), date(2024, 1, 14));

    assert!(BusinessCalendar::from_name("Mars/Olympus_Mons").is_err());
}
