use thiserror::Error;

use crate::calendar::CalendarError;
use crate::chunked_fetcher::ChunkFetchError;

#[derive(Debug, Error)]
pub enum DealFlowError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error("Chunked fetch failed: {0}")]
    Chunked(#[from] Box<ChunkFetchError<DealFlowError>>),
}

impl From<ChunkFetchError<DealFlowError>> for DealFlowError {
    fn from(error: ChunkFetchError<DealFlowError>) -> Self {
        DealFlowError::Chunked(Box::new(error))
    }
}

pub type Result<T> = std::result::Result<T, DealFlowError>;
