//! Contiguous date range partition tests

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_log::test;

use crate::common::logging::{init_test_logging, log_test_data};
use crate::common::test_data::date;
use deal_flow::{split_into_contiguous_ranges, DateRange};

fn random_dates(rng: &mut StdRng) -> Vec<NaiveDate> {
    let base = date(2024, 2, 1);
    let count = rng.gen_range(0..40);
    (0..count).map(|_| base + Duration::days(rng.gen_range(0..60))).collect()
}

fn expand(ranges: &[DateRange]) -> Vec<NaiveDate> {
    ranges.iter().flat_map(|r| r.iter_days()).collect()
}

#[test]
fn test_working_day_gap_splits_ranges() {
    let ranges = split_into_contiguous_ranges(vec![date(2024, 1, 10), date(2024, 1, 11), date(2024, 1, 13)]);

    assert_eq!(
        ranges,
        vec![
            DateRange::new(date(2024, 1, 10), date(2024, 1, 11)).unwrap(),
            DateRange::single(date(2024, 1, 13)),
        ]
    );
    assert_eq!(ranges[0].date_from(), "2024-01-10");
    assert_eq!(ranges[0].date_to(), "2024-01-11");
}

#[test]
fn test_unsorted_duplicates_collapse() {
    let ranges = split_into_contiguous_ranges(vec![
        date(2024, 3, 2),
        date(2024, 2, 29),
        date(2024, 3, 1),
        date(2024, 3, 1),
    ]);
    assert_eq!(ranges, vec![DateRange::new(date(2024, 2, 29), date(2024, 3, 2)).unwrap()]);
    assert_eq!(ranges[0].days(), 3);
}

#[test]
fn test_empty_and_single() {
    assert!(split_into_contiguous_ranges(Vec::<NaiveDate>::new()).is_empty());

    let single = split_into_contiguous_ranges([date(2024, 1, 1)]);
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].start, single[0].end);
}

#[test]
fn test_partition_properties() {
    init_test_logging();
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..200 {
        let dates = random_dates(&mut rng);
        let ranges = split_into_contiguous_ranges(dates.clone());
        log_test_data("ranges", &ranges);

        // Union equals the deduplicated input
        let unique: Vec<NaiveDate> = dates.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        assert_eq!(expand(&ranges), unique);

        // Sorted, and no two ranges touch
        for pair in ranges.windows(2) {
            assert!(pair[0].end + Duration::days(1) < pair[1].start);
        }

        // Fixed point
        assert_eq!(split_into_contiguous_ranges(expand(&ranges)), ranges);
    }
}
