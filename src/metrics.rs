//! Dashboard aggregates over deal flow rows

use serde::{Deserialize, Serialize};

use crate::models::{DailyDealFlow, CALL_RESULT_UNDERWRITING, STATUS_GI_CURRENTLY_DQ, STATUS_PENDING_APPROVAL};

/// Headline counts for one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDealFlowMetrics {
    pub total_transfers: i64,
    pub pending_approval: i64,
    pub underwriting: i64,
    /// Pending approval minus underwriting
    pub approved: i64,
    pub gi_currently_dq: i64,
}

/// Percent change of each metric against the previous period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricChanges {
    pub total_transfers: i64,
    pub pending_approval: i64,
    pub underwriting: i64,
    pub approved: i64,
    pub gi_currently_dq: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsComparison {
    pub metrics: DailyDealFlowMetrics,
    pub previous: DailyDealFlowMetrics,
    pub changes: MetricChanges,
}

/// Rates shown on the daily dashboard, in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_transfers: usize,
    pub total_sales: usize,
    pub total_underwriting: usize,
    pub approval_rate: f64,
    pub callback_rate: f64,
    pub dq_rate: f64,
}

impl DashboardMetrics {
    pub fn from_records(records: &[DailyDealFlow]) -> Self {
        let total_transfers = records.len();
        let total_sales = records.iter().filter(|r| r.is_sale()).count();
        let total_underwriting = records
            .iter()
            .filter(|r| r.is_sale() && r.has_call_result(CALL_RESULT_UNDERWRITING))
            .count();
        let callbacks = records.iter().filter(|r| r.is_callback == Some(true)).count();
        let dq = records.iter().filter(|r| r.is_dq()).count();

        Self {
            total_transfers,
            total_sales,
            total_underwriting,
            approval_rate: rate(total_sales, total_transfers),
            callback_rate: rate(callbacks, total_transfers),
            dq_rate: rate(dq, total_transfers),
        }
    }
}

/// `part / total` in percent, zero when there is nothing to divide.
pub fn rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Metrics for `records`; `count` is the store's total for the query.
pub fn calculate_metrics_from_data(records: &[DailyDealFlow], count: u64) -> DailyDealFlowMetrics {
    let pending_approval = records.iter().filter(|r| r.has_status(STATUS_PENDING_APPROVAL)).count() as i64;
    let underwriting = records.iter().filter(|r| r.has_call_result(CALL_RESULT_UNDERWRITING)).count() as i64;
    let gi_currently_dq = records.iter().filter(|r| r.has_status(STATUS_GI_CURRENTLY_DQ)).count() as i64;

    DailyDealFlowMetrics {
        total_transfers: i64::try_from(count).unwrap_or(i64::MAX),
        pending_approval,
        underwriting,
        approved: pending_approval - underwriting,
        gi_currently_dq,
    }
}

/// Whole-percent change from `previous` to `current`.
///
/// A zero baseline reports 100 when anything happened and 0 otherwise.
pub fn percentage_change(current: i64, previous: i64) -> i64 {
    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }
    let change = (current - previous) as f64 / previous as f64 * 100.0;
    // Halves round up, matching how the dashboard has always displayed them
    (change + 0.5).floor() as i64
}

pub fn metrics_with_comparison(
    current: &[DailyDealFlow],
    current_count: u64,
    previous: &[DailyDealFlow],
    previous_count: u64,
) -> MetricsComparison {
    let metrics = calculate_metrics_from_data(current, current_count);
    let previous = calculate_metrics_from_data(previous, previous_count);

    MetricsComparison {
        metrics,
        previous,
        changes: MetricChanges {
            total_transfers: percentage_change(metrics.total_transfers, previous.total_transfers),
            pending_approval: percentage_change(metrics.pending_approval, previous.pending_approval),
            underwriting: percentage_change(metrics.underwriting, previous.underwriting),
            approved: percentage_change(metrics.approved, previous.approved),
            gi_currently_dq: percentage_change(metrics.gi_currently_dq, previous.gi_currently_dq),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatConfig {
    pub title: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

/// One stat card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatResult {
    pub title: String,
    pub icon: String,
    pub value: i64,
    pub variation: i64,
    pub color: String,
}

pub fn base_stats_config() -> [StatConfig; 5] {
    [
        StatConfig { title: "Total Transfers", icon: "i-lucide-send", color: "primary" },
        StatConfig { title: "Pending Approval", icon: "i-lucide-clock", color: "warning" },
        StatConfig { title: "Underwriting", icon: "i-lucide-file-text", color: "info" },
        StatConfig { title: "Approved", icon: "i-lucide-check-circle", color: "success" },
        StatConfig { title: "GI - Currently DQ", icon: "i-lucide-alert-triangle", color: "error" },
    ]
}

pub fn default_stats() -> Vec<StatResult> {
    build_stats_from_metrics(&DailyDealFlowMetrics::default(), &MetricChanges::default())
}

pub fn build_stats_from_metrics(metrics: &DailyDealFlowMetrics, changes: &MetricChanges) -> Vec<StatResult> {
    let values = [
        (metrics.total_transfers, changes.total_transfers),
        (metrics.pending_approval, changes.pending_approval),
        (metrics.underwriting, changes.underwriting),
        (metrics.approved, changes.approved),
        (metrics.gi_currently_dq, changes.gi_currently_dq),
    ];

    base_stats_config()
        .into_iter()
        .zip(values)
        .map(|(config, (value, variation))| StatResult {
            title: config.title.to_string(),
            icon: config.icon.to_string(),
            value,
            variation,
            color: config.color.to_string(),
        })
        .collect()
}
