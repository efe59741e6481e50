use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE},
    Client, Method, RequestBuilder, Response,
};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{ApiRateLimiter, CenterDirectory, DealFlowPage, DealFlowSource};
use crate::access::AccessScope;
use crate::calendar::format_civil_date;
use crate::error::{DealFlowError, Result};
use crate::models::{Config, DailyDealFlow, DealFlowFilters, DealFlowInsert, DealFlowUpdate};

const DEAL_FLOW_TABLE: &str = "daily_deal_flow";
const CENTERS_TABLE: &str = "centers";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

#[derive(Debug, Deserialize)]
struct SessionUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CenterRow {
    lead_vendor: Option<String>,
}

/// Client for the hosted PostgREST data store
///
/// Built once at startup from [`Config`] and shared by reference; nothing in
/// the crate holds a global instance.
pub struct PostgrestClient {
    client: Client,
    base_url: Url,
    api_key: String,
    access_token: Option<String>,
    rate_limiter: ApiRateLimiter,
}

impl PostgrestClient {
    /// Create a new client
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .user_agent("deal-flow/1.0")
            .build()?;

        let mut base_url = Url::parse(&config.supabase_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            api_key: config.supabase_key.clone(),
            access_token: config.access_token.clone(),
            rate_limiter: ApiRateLimiter::new(config.rate_limit_per_minute),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DealFlowError::InvalidRequest(format!("bad endpoint {}: {}", path, e)))
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.endpoint(&format!("rest/v1/{}", table))
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&self.api_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", bearer))?);
        Ok(headers)
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        self.rate_limiter.wait().await;
        debug!("Making {} request to: {}", method, url);
        Ok(self.client.request(method, url).headers(self.auth_headers()?))
    }

    /// Build the list query for `filters` within `scope`.
    pub fn deal_flow_query_url(&self, filters: &DealFlowFilters, scope: &AccessScope) -> Result<Url> {
        let mut url = self.table_url(DEAL_FLOW_TABLE)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            query.append_pair("order", "created_at.desc");

            if let AccessScope::LeadVendor(lead_vendor) = scope {
                query.append_pair("lead_vendor", &format!("eq.{}", lead_vendor));
            }

            // Repeated columns are ANDed, so a center user filtering on
            // another vendor gets no rows
            for (column, value) in filters.equality_filters() {
                query.append_pair(column, &format!("eq.{}", value));
            }

            if let Some(name) = filters.insured_name_pattern() {
                query.append_pair("insured_name", &format!("ilike.*{}*", name));
            }
            if let Some(from) = filters.date_from {
                query.append_pair("date", &format!("gte.{}", format_civil_date(from)));
            }
            if let Some(to) = filters.date_to {
                query.append_pair("date", &format!("lte.{}", format_civil_date(to)));
            }
        }
        Ok(url)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(DealFlowError::Api { status: status.as_u16(), message });
        }

        Ok(response)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| DealFlowError::InvalidRequest(format!("invalid header value: {}", e)))
}

/// Total row count from a `Content-Range: 0-24/3573` header.
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl DealFlowSource for PostgrestClient {
    async fn fetch_page(&self, filters: &DealFlowFilters, scope: &AccessScope) -> Result<DealFlowPage> {
        let url = self.deal_flow_query_url(filters, scope)?;
        let offset = filters.page_offset();
        let limit = filters.page_size();

        let builder = self
            .request(Method::GET, url)
            .await?
            .header("Range-Unit", "items")
            .header("Range", format!("{}-{}", offset, offset + limit - 1))
            .header("Prefer", "count=exact");

        let response = self.send(builder).await?;
        let count = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        let records: Vec<DailyDealFlow> = response.json().await?;
        let count = count.unwrap_or(records.len() as u64);

        debug!("Fetched {} deal flow rows (total {})", records.len(), count);
        Ok(DealFlowPage { records, count })
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<DailyDealFlow>> {
        let mut url = self.table_url(DEAL_FLOW_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{}", id))
            .append_pair("limit", "1");

        let response = self.send(self.request(Method::GET, url).await?).await?;
        let mut rows: Vec<DailyDealFlow> = response.json().await?;
        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    async fn insert(&self, entries: &[DealFlowInsert]) -> Result<Vec<DailyDealFlow>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.table_url(DEAL_FLOW_TABLE)?;
        let builder = self
            .request(Method::POST, url)
            .await?
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
            .json(entries);

        let rows: Vec<DailyDealFlow> = self.send(builder).await?.json().await?;
        debug!("Inserted {} deal flow rows", rows.len());
        Ok(rows)
    }

    async fn update(&self, id: &str, changes: &DealFlowUpdate) -> Result<DailyDealFlow> {
        let mut url = self.table_url(DEAL_FLOW_TABLE)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));

        let builder = self
            .request(Method::PATCH, url)
            .await?
            .header(ACCEPT, SINGLE_OBJECT)
            .header("Prefer", "return=representation")
            .json(changes);

        let row: DailyDealFlow = self.send(builder).await?.json().await?;
        Ok(row)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut url = self.table_url(DEAL_FLOW_TABLE)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));

        self.send(self.request(Method::DELETE, url).await?).await?;
        debug!("Deleted deal flow row {}", id);
        Ok(())
    }
}

#[async_trait]
impl CenterDirectory for PostgrestClient {
    async fn current_user_id(&self) -> Result<Option<String>> {
        if self.access_token.is_none() {
            return Ok(None);
        }

        let url = self.endpoint("auth/v1/user")?;
        let response = self.request(Method::GET, url).await?.send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(DealFlowError::Api { status: status.as_u16(), message });
        }

        let user: SessionUser = response.json().await?;
        Ok(Some(user.id))
    }

    async fn lead_vendor_for_user(&self, user_id: &str) -> Result<Option<String>> {
        let mut url = self.table_url(CENTERS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "lead_vendor")
            .append_pair("user_id", &format!("eq.{}", user_id))
            .append_pair("limit", "1");

        let rows: Vec<CenterRow> = self.send(self.request(Method::GET, url).await?).await?.json().await?;
        Ok(rows.into_iter().next().and_then(|row| row.lead_vendor))
    }
}
