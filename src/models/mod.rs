use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{BusinessCalendar, DEFAULT_BUSINESS_TIMEZONE};
use crate::chunked_fetcher::DEFAULT_PAGE_SIZE;
use crate::ranges::DateRange;

/// Status a transfer carries once an application was taken.
pub const STATUS_PENDING_APPROVAL: &str = "Pending Approval";
pub const STATUS_GI_CURRENTLY_DQ: &str = "GI - Currently DQ";
pub const CALL_RESULT_UNDERWRITING: &str = "Underwriting";
pub const CALL_RESULT_SUBMITTED: &str = "Submitted";
pub const CALL_RESULT_NOT_SUBMITTED: &str = "Not Submitted";

/// Statuses counted towards the DQ rate on the dashboard.
pub const DQ_STATUSES: [&str; 3] = ["DQ", "Quality Issue", "Failed Quality Check"];

/// Filter value meaning "do not filter on this column".
pub const FILTER_ALL: &str = "all";

/// One row of the `daily_deal_flow` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyDealFlow {
    pub id: String,
    pub submission_id: String,
    pub client_phone_number: Option<String>,
    pub lead_vendor: Option<String>,
    pub date: Option<NaiveDate>,
    pub insured_name: Option<String>,
    pub buffer_agent: Option<String>,
    pub agent: Option<String>,
    pub licensed_agent_account: Option<String>,
    pub status: Option<String>,
    pub call_result: Option<String>,
    pub carrier: Option<String>,
    pub product_type: Option<String>,
    pub draft_date: Option<NaiveDate>,
    pub monthly_premium: Option<f64>,
    pub face_amount: Option<f64>,
    pub from_callback: Option<bool>,
    pub notes: Option<String>,
    pub policy_number: Option<String>,
    pub carrier_audit: Option<String>,
    pub product_type_carrier: Option<String>,
    pub level_or_gi: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub is_callback: Option<bool>,
    pub is_retention_call: Option<bool>,
    pub placement_status: Option<String>,
    pub ghl_location_id: Option<String>,
    pub ghl_opportunity_id: Option<String>,
    pub ghlcontactid: Option<String>,
    pub sync_status: Option<String>,
    pub retention_agent: Option<String>,
    pub retention_agent_id: Option<String>,
}

impl DailyDealFlow {
    pub fn has_status(&self, status: &str) -> bool {
        self.status.as_deref() == Some(status)
    }

    pub fn has_call_result(&self, call_result: &str) -> bool {
        self.call_result.as_deref() == Some(call_result)
    }

    pub fn is_sale(&self) -> bool {
        self.has_status(STATUS_PENDING_APPROVAL)
    }

    pub fn is_dq(&self) -> bool {
        self.status
            .as_deref()
            .map(|status| DQ_STATUSES.contains(&status))
            .unwrap_or(false)
    }
}

/// New row; the store assigns `id` and the timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DealFlowInsert {
    pub submission_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insured_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licensed_agent_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_premium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_callback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_callback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update; `None` columns are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DealFlowUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_premium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_status: Option<String>,
}

/// Filters for listing deal flow rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealFlowFilters {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub agent: Option<String>,
    pub status: Option<String>,
    pub carrier: Option<String>,
    pub call_result: Option<String>,
    pub lead_vendor: Option<String>,
    /// Case-insensitive substring match
    pub insured_name: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl DealFlowFilters {
    pub const DEFAULT_LIMIT: usize = 1000;

    pub fn for_day(day: NaiveDate) -> Self {
        Self::for_range(DateRange::single(day))
    }

    pub fn for_range(range: DateRange) -> Self {
        Self { date_from: Some(range.start), date_to: Some(range.end), ..Self::default() }
    }

    pub fn page_size(&self) -> usize {
        self.limit.filter(|limit| *limit > 0).unwrap_or(Self::DEFAULT_LIMIT)
    }

    pub fn page_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    /// Equality filters that actually constrain the query, `"all"` dropped.
    pub fn equality_filters(&self) -> Vec<(&'static str, &str)> {
        [
            ("status", &self.status),
            ("agent", &self.agent),
            ("carrier", &self.carrier),
            ("call_result", &self.call_result),
            ("lead_vendor", &self.lead_vendor),
        ]
        .into_iter()
        .filter_map(|(column, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty() && *v != FILTER_ALL)
                .map(|v| (column, v))
        })
        .collect()
    }

    pub fn insured_name_pattern(&self) -> Option<&str> {
        self.insured_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    pub access_token: Option<String>,
    pub calendar: BusinessCalendar,
    pub page_size: usize,
    pub rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Business calendar alone, for commands that never touch the store.
    pub fn calendar_from_env() -> anyhow::Result<BusinessCalendar> {
        dotenvy::dotenv().ok();

        Self::calendar_from_lookup(|key| std::env::var(key).ok())
    }

    pub fn calendar_from_lookup<F>(lookup: F) -> anyhow::Result<BusinessCalendar>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("BUSINESS_TIMEZONE") {
            Some(name) => BusinessCalendar::from_name(&name),
            None => Ok(BusinessCalendar::new(DEFAULT_BUSINESS_TIMEZONE)),
        }
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            supabase_url: lookup("SUPABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_URL environment variable required"))?,
            supabase_key: lookup("SUPABASE_KEY")
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_KEY environment variable required"))?,
            access_token: lookup("SUPABASE_ACCESS_TOKEN").filter(|token| !token.is_empty()),
            calendar: Self::calendar_from_lookup(&lookup)?,
            page_size: lookup("PAGE_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PAGE_SIZE),
            rate_limit_per_minute: lookup("RATE_LIMIT_PER_MINUTE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        })
    }
}
