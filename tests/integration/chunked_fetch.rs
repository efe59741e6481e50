//! Integration tests for chunked range fetching

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use crate::common::logging::{init_test_logging, log_test_data, log_test_step};
use crate::common::test_data::{create_test_row, date};
use deal_flow::models::DailyDealFlow;
use deal_flow::{fetch_by_contiguous_ranges, ChunkFetchError, ChunkPage, ChunkedFetchOptions, DateRange, RangeQuery};

#[derive(Debug, Clone, PartialEq)]
struct UpstreamError(String);

type Calls = Arc<Mutex<Vec<RangeQuery>>>;

fn recording_fetcher(
    calls: Calls,
    failing: Option<DateRange>,
) -> impl FnMut(RangeQuery) -> std::future::Ready<Result<ChunkPage<DailyDealFlow>, UpstreamError>> {
    move |query: RangeQuery| {
        calls.lock().unwrap().push(query.clone());

        let result = if Some(query.range) == failing {
            Err(UpstreamError(format!("boom {}", query.date_from)))
        } else {
            let rows: Vec<DailyDealFlow> = query
                .range
                .iter_days()
                .map(|day| create_test_row(&format!("row-{}", day), day, "Pending Approval"))
                .collect();
            let count = rows.len() as u64;
            Ok(ChunkPage::new(rows, Some(count)))
        };
        std::future::ready(result)
    }
}

#[tokio::test]
async fn test_ranges_fetched_in_order() {
    init_test_logging();
    log_test_step("Fetching three ranges in ascending order");

    let calls: Calls = Arc::default();
    let dates = vec![date(2024, 1, 15), date(2024, 1, 10), date(2024, 1, 11), date(2024, 1, 13)];

    let rows = fetch_by_contiguous_ranges(dates, ChunkedFetchOptions::default(), recording_fetcher(calls.clone(), None))
        .await
        .unwrap();

    let recorded = calls.lock().unwrap().clone();
    log_test_data("Recorded queries", &recorded);

    let windows: Vec<(&str, &str)> = recorded.iter().map(|q| (q.date_from.as_str(), q.date_to.as_str())).collect();
    assert_eq!(
        windows,
        vec![("2024-01-10", "2024-01-11"), ("2024-01-13", "2024-01-13"), ("2024-01-15", "2024-01-15")]
    );
    assert!(recorded.iter().all(|q| q.limit == 10_000 && q.offset == 0));

    let days: Vec<_> = rows.iter().map(|r| r.date.unwrap()).collect();
    assert_eq!(days, vec![date(2024, 1, 10), date(2024, 1, 11), date(2024, 1, 13), date(2024, 1, 15)]);
}

#[tokio::test]
async fn test_second_range_failure_stops_the_fetch() {
    init_test_logging();
    log_test_step("Failing the second of three ranges");

    let calls: Calls = Arc::default();
    let failing = DateRange::single(date(2024, 1, 13));
    let dates = vec![date(2024, 1, 10), date(2024, 1, 11), date(2024, 1, 13), date(2024, 1, 15)];

    let result = fetch_by_contiguous_ranges(
        dates,
        ChunkedFetchOptions::default(),
        recording_fetcher(calls.clone(), Some(failing)),
    )
    .await;

    assert_matches!(&result, Err(ChunkFetchError::Fetch { range, .. }) if *range == failing);
    let source = result.unwrap_err().into_source();
    assert_eq!(source, Some(UpstreamError("boom 2024-01-13".to_string())));

    // The third range is never requested
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_dates_never_fetch() {
    let calls: Calls = Arc::default();

    let rows = fetch_by_contiguous_ranges(
        Vec::<NaiveDate>::new(),
        ChunkedFetchOptions::default(),
        recording_fetcher(calls.clone(), None),
    )
    .await
    .unwrap();

    assert!(rows.is_empty());
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_range_larger_than_page_is_rejected() {
    let result = fetch_by_contiguous_ranges(
        vec![date(2024, 1, 10), date(2024, 1, 11), date(2024, 1, 12)],
        ChunkedFetchOptions::with_page_size(2),
        |query: RangeQuery| async move {
            let rows = vec![create_test_row("a", query.range.start, "DQ"); 2];
            Ok::<_, UpstreamError>(ChunkPage::new(rows, Some(3)))
        },
    )
    .await;

    assert_matches!(
        result,
        Err(ChunkFetchError::Truncated { count: 3, limit: 2, .. })
    );
}

#[tokio::test]
async fn test_server_capped_page_is_rejected() {
    init_test_logging();
    log_test_step("Store caps the response at 1000 rows while reporting 5000");

    let result = fetch_by_contiguous_ranges(
        vec![date(2024, 1, 10)],
        ChunkedFetchOptions::default(),
        |query: RangeQuery| async move {
            let rows = vec![create_test_row("a", query.range.start, "DQ"); 1000];
            Ok::<_, UpstreamError>(ChunkPage::new(rows, Some(5000)))
        },
    )
    .await;

    assert_matches!(
        result,
        Err(ChunkFetchError::Truncated { count: 5000, returned: 1000, limit: 10_000, .. })
    );
}
