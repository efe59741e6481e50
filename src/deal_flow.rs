use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::access::{AccessRole, AccessRoleResolver};
use crate::api::{DealFlowPage, DealFlowSource};
use crate::calendar::{
    last_n_working_days, previous_comparison_window, previous_period_range, BusinessCalendar,
    WorkingDayPolicy,
};
use crate::chunked_fetcher::{fetch_by_contiguous_ranges, ChunkPage, ChunkedFetchOptions, RangeQuery};
use crate::error::{DealFlowError, Result};
use crate::metrics::{
    build_stats_from_metrics, calculate_metrics_from_data, default_stats, metrics_with_comparison,
    DashboardMetrics, MetricChanges, MetricsComparison, StatResult,
};
use crate::models::{DailyDealFlow, DealFlowFilters, DealFlowInsert, DealFlowUpdate};
use crate::ranges::DateRange;

/// Current and previous working-day windows with their rows
#[derive(Debug, Clone)]
pub struct WorkingDayComparison {
    pub current_dates: Vec<NaiveDate>,
    pub previous_dates: Vec<NaiveDate>,
    pub current: Vec<DailyDealFlow>,
    pub previous: Vec<DailyDealFlow>,
    pub comparison: MetricsComparison,
}

/// Role-aware access to the deal flow table
pub struct DealFlowService {
    source: Arc<dyn DealFlowSource>,
    access: Arc<AccessRoleResolver>,
    calendar: BusinessCalendar,
}

impl DealFlowService {
    pub fn new(
        source: Arc<dyn DealFlowSource>,
        access: Arc<AccessRoleResolver>,
        calendar: BusinessCalendar,
    ) -> Self {
        Self { source, access, calendar }
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub async fn role(&self) -> AccessRole {
        self.access.ensure_resolved().await
    }

    /// One page of rows matching `filters`, scoped to the caller's role.
    pub async fn fetch_all(&self, filters: &DealFlowFilters) -> Result<DealFlowPage> {
        let role = self.access.ensure_resolved().await;
        let scope = role.scope();

        let page = self.source.fetch_page(filters, &scope).await?;
        debug!("Fetched {} rows, total count {} ({:?})", page.records.len(), page.count, scope);
        Ok(page)
    }

    /// Every row on `dates`, fetched one contiguous range at a time.
    ///
    /// All-or-nothing: a failing range fails the whole call.
    pub async fn fetch_all_by_working_dates(
        &self,
        dates: &[NaiveDate],
        filters: &DealFlowFilters,
    ) -> Result<Vec<DailyDealFlow>> {
        let options = ChunkedFetchOptions::with_page_size(filters.limit.unwrap_or(0));
        let base = filters;

        let rows = fetch_by_contiguous_ranges(dates.iter().copied(), options, |query: RangeQuery| {
            let range_filters = DealFlowFilters {
                date_from: Some(query.range.start),
                date_to: Some(query.range.end),
                limit: Some(query.limit),
                offset: Some(query.offset),
                ..base.clone()
            };
            async move {
                let page = self.fetch_all(&range_filters).await?;
                Ok::<_, DealFlowError>(ChunkPage::new(page.records, Some(page.count)))
            }
        })
        .await?;

        Ok(rows)
    }

    pub async fn fetch_by_id(&self, id: &str) -> Result<Option<DailyDealFlow>> {
        self.source.fetch_by_id(id).await
    }

    pub async fn create(&self, entry: DealFlowInsert) -> Result<DailyDealFlow> {
        let mut rows = self.source.insert(std::slice::from_ref(&entry)).await?;
        rows.pop()
            .ok_or_else(|| DealFlowError::Decode("insert returned no row".to_string()))
    }

    pub async fn create_many(&self, entries: &[DealFlowInsert]) -> Result<Vec<DailyDealFlow>> {
        self.source.insert(entries).await
    }

    pub async fn update(&self, id: &str, changes: &DealFlowUpdate) -> Result<DailyDealFlow> {
        self.source.update(id, changes).await
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.source.delete(id).await
    }

    /// Dashboard metrics for one civil day, today when `date` is `None`.
    pub async fn get_metrics(&self, date: Option<NaiveDate>) -> Result<DashboardMetrics> {
        let day = date.unwrap_or_else(|| self.calendar.today());
        let rows = self
            .fetch_all_by_working_dates(&[day], &DealFlowFilters::for_day(day))
            .await?;

        let metrics = DashboardMetrics::from_records(&rows);
        info!("📊 Metrics for {}: {} transfers, {:.1}% approval", day, metrics.total_transfers, metrics.approval_rate);
        Ok(metrics)
    }

    /// Stat cards for `range` against the calendar period right before it.
    ///
    /// Never fails: a broken current period yields default stats, a broken
    /// previous period yields zero variations.
    pub async fn analytics_stats(&self, range: DateRange) -> Vec<StatResult> {
        let current = match self.fetch_period(range).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Error fetching current period analytics data: {}", e);
                return default_stats();
            }
        };

        let previous = match previous_period_range(&range) {
            Some(previous_range) => self.fetch_period(previous_range).await,
            None => Err(DealFlowError::InvalidRequest(format!("no calendar period before {}", range))),
        };
        match previous {
            Ok(previous) => {
                let comparison = metrics_with_comparison(
                    &current.records,
                    current.count,
                    &previous.records,
                    previous.count,
                );
                build_stats_from_metrics(&comparison.metrics, &comparison.changes)
            }
            Err(e) => {
                warn!("Error fetching previous period analytics data: {}", e);
                let metrics = calculate_metrics_from_data(&current.records, current.count);
                build_stats_from_metrics(&metrics, &MetricChanges::default())
            }
        }
    }

    async fn fetch_period(&self, range: DateRange) -> Result<DealFlowPage> {
        let filters = DealFlowFilters {
            limit: Some(crate::chunked_fetcher::DEFAULT_PAGE_SIZE),
            offset: Some(0),
            ..DealFlowFilters::for_range(range)
        };
        self.fetch_all(&filters).await
    }

    /// The last `n` working days up to `end` against the window before them.
    pub async fn compare_working_days(
        &self,
        end: NaiveDate,
        n: usize,
        policy: WorkingDayPolicy,
        filters: &DealFlowFilters,
    ) -> Result<WorkingDayComparison> {
        let current_dates = last_n_working_days(end, n, policy)?;
        let previous_dates = previous_comparison_window(&current_dates, policy)?;

        info!(
            "📅 Comparing {} working days ending {} with {} days before",
            current_dates.len(),
            end,
            previous_dates.len()
        );

        let current = self.fetch_all_by_working_dates(&current_dates, filters).await?;
        let previous = self.fetch_all_by_working_dates(&previous_dates, filters).await?;

        let comparison = metrics_with_comparison(
            &current,
            current.len() as u64,
            &previous,
            previous.len() as u64,
        );

        Ok(WorkingDayComparison {
            current_dates,
            previous_dates,
            current,
            previous,
            comparison,
        })
    }
}
