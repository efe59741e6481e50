pub mod access;
pub mod api;
pub mod calendar;
pub mod chunked_fetcher;
pub mod deal_flow;
pub mod error;
pub mod export;
pub mod metrics;
pub mod models;
pub mod ranges;
pub mod report;
pub mod seed;

pub use calendar::{BusinessCalendar, WorkingDayPolicy};
pub use chunked_fetcher::{fetch_by_contiguous_ranges, ChunkFetchError, ChunkPage, ChunkedFetchOptions, RangeQuery};
pub use error::{DealFlowError, Result};
pub use ranges::{split_into_contiguous_ranges, DateRange};
