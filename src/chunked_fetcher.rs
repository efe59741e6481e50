//! Chunked range fetching
//!
//! Splits a set of civil days into contiguous ranges and fetches each range
//! with one request, strictly one after another. The merge is all-or-nothing:
//! the first failing range aborts the whole fetch and nothing fetched so far
//! is returned.

use std::future::Future;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ranges::{split_into_contiguous_ranges, DateRange};

/// Rows requested per range unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10_000;

/// One range query handed to the injected fetch function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    pub range: DateRange,
    /// `YYYY-MM-DD`, inclusive
    pub date_from: String,
    /// `YYYY-MM-DD`, inclusive
    pub date_to: String,
    pub limit: usize,
    pub offset: usize,
}

impl RangeQuery {
    pub fn new(range: DateRange, limit: usize) -> Self {
        Self {
            range,
            date_from: range.date_from(),
            date_to: range.date_to(),
            limit,
            offset: 0,
        }
    }
}

/// Rows returned for one range, with the store's total row count when known.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkPage<T> {
    pub records: Vec<T>,
    pub count: Option<u64>,
}

impl<T> ChunkPage<T> {
    pub fn new(records: Vec<T>, count: Option<u64>) -> Self {
        Self { records, count }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkedFetchOptions {
    pub page_size: usize,
}

impl Default for ChunkedFetchOptions {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE }
    }
}

impl ChunkedFetchOptions {
    /// A page size of zero falls back to [`DEFAULT_PAGE_SIZE`].
    pub fn with_page_size(page_size: usize) -> Self {
        let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
        Self { page_size }
    }
}

#[derive(Debug, Error)]
pub enum ChunkFetchError<E> {
    #[error("fetch for {range} failed: {source}")]
    Fetch {
        range: DateRange,
        #[source]
        source: E,
    },

    /// The store reported more rows than the page carried, either because
    /// the range outgrew the page size or because the server capped the response.
    #[error("range {range} holds {count} rows but only {returned} came back (page size {limit})")]
    Truncated { range: DateRange, count: u64, returned: usize, limit: usize },
}

impl<E> ChunkFetchError<E> {
    pub fn range(&self) -> DateRange {
        match self {
            ChunkFetchError::Fetch { range, .. } => *range,
            ChunkFetchError::Truncated { range, .. } => *range,
        }
    }

    /// The upstream error, unchanged, if the fetch function failed.
    pub fn into_source(self) -> Option<E> {
        match self {
            ChunkFetchError::Fetch { source, .. } => Some(source),
            ChunkFetchError::Truncated { .. } => None,
        }
    }
}

/// Fetch every day in `dates`, one request per contiguous range.
///
/// Ranges are fetched in ascending order, each awaited before the next is
/// issued. An empty `dates` never calls `fetch_range`.
pub async fn fetch_by_contiguous_ranges<T, E, F, Fut, I>(
    dates: I,
    options: ChunkedFetchOptions,
    mut fetch_range: F,
) -> Result<Vec<T>, ChunkFetchError<E>>
where
    I: IntoIterator<Item = NaiveDate>,
    F: FnMut(RangeQuery) -> Fut,
    Fut: Future<Output = Result<ChunkPage<T>, E>>,
{
    let ranges = split_into_contiguous_ranges(dates);
    if ranges.is_empty() {
        debug!("No dates requested, skipping chunked fetch");
        return Ok(Vec::new());
    }

    let limit = ChunkedFetchOptions::with_page_size(options.page_size).page_size;
    info!("📅 Chunked fetch plan: {} contiguous ranges, page size {}", ranges.len(), limit);

    let mut all = Vec::new();

    for (i, range) in ranges.iter().enumerate() {
        debug!("🔄 Range {}/{}: {}", i + 1, ranges.len(), range);

        let page = match fetch_range(RangeQuery::new(*range, limit)).await {
            Ok(page) => page,
            Err(source) => {
                warn!("❌ Range {}/{} ({}) failed, discarding {} fetched rows", i + 1, ranges.len(), range, all.len());
                return Err(ChunkFetchError::Fetch { range: *range, source });
            }
        };

        if let Some(count) = page.count {
            let returned = page.records.len();
            if count > limit as u64 || count > returned as u64 {
                warn!("❌ Range {} reports {} rows but returned {} (page size {})", range, count, returned, limit);
                return Err(ChunkFetchError::Truncated { range: *range, count, returned, limit });
            }
        }

        debug!("✅ Range {}/{}: {} rows", i + 1, ranges.len(), page.records.len());
        all.extend(page.records);
    }

    info!("🏁 Chunked fetch complete: {} rows from {} ranges", all.len(), ranges.len());
    Ok(all)
}
