use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

use crate::access::AccessScope;
use crate::error::Result;
use crate::models::{DailyDealFlow, DealFlowFilters, DealFlowInsert, DealFlowUpdate};

pub mod postgrest_client;
pub use postgrest_client::PostgrestClient;

/// Request rate limiter shared by every call a client makes
pub struct ApiRateLimiter {
    limiter: DefaultDirectRateLimiter,
}

impl ApiRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        // Default one request per second; requests are spaced, never burst
        let per_minute = NonZeroU32::new(requests_per_minute)
            .or(NonZeroU32::new(60))
            .unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: RateLimiter::direct(Quota::per_minute(per_minute).allow_burst(NonZeroU32::MIN)),
        }
    }

    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

/// One page of deal flow rows plus the store's exact total for the query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealFlowPage {
    pub records: Vec<DailyDealFlow>,
    pub count: u64,
}

/// Remote `daily_deal_flow` table
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DealFlowSource: Send + Sync {
    async fn fetch_page(&self, filters: &DealFlowFilters, scope: &AccessScope) -> Result<DealFlowPage>;
    async fn fetch_by_id(&self, id: &str) -> Result<Option<DailyDealFlow>>;
    async fn insert(&self, entries: &[DealFlowInsert]) -> Result<Vec<DailyDealFlow>>;
    async fn update(&self, id: &str, changes: &DealFlowUpdate) -> Result<DailyDealFlow>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Who is signed in and which center they belong to
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CenterDirectory: Send + Sync {
    /// `None` when there is no signed-in session.
    async fn current_user_id(&self) -> Result<Option<String>>;
    async fn lead_vendor_for_user(&self, user_id: &str) -> Result<Option<String>>;
}
