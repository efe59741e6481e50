//! Weekly agency and call center performance reports
//!
//! Reports are computed from two weeks of rows and rendered as standalone,
//! print-ready HTML documents.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::metrics::{percentage_change, rate};
use crate::models::{DailyDealFlow, CALL_RESULT_UNDERWRITING};

/// Lead vendor label for rows that carry none.
pub const UNASSIGNED_CENTER: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutiveSummaryRow {
    pub metric: String,
    pub this_week: i64,
    pub last_week: i64,
    pub delta_percent: String,
}

impl ExecutiveSummaryRow {
    fn new(metric: &str, this_week: usize, last_week: usize) -> Self {
        let this_week = this_week as i64;
        let last_week = last_week as i64;
        Self {
            metric: metric.to_string(),
            this_week,
            last_week,
            delta_percent: format_delta(percentage_change(this_week, last_week)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceRateRow {
    pub kpi: String,
    pub rate: String,
    pub formula: String,
    pub interpretation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Performer {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopPerformers {
    pub highest_transfer: Performer,
    pub highest_sales: Performer,
    pub most_improved: Performer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CenterFeedback {
    pub title: String,
    pub description: String,
    pub feedback_by: String,
    pub created_at: Option<String>,
}

/// One center's section of the call center report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallCenterReport {
    pub center_name: String,
    pub metrics: Vec<ExecutiveSummaryRow>,
    pub feedbacks: Vec<CenterFeedback>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyAgencyReport {
    pub week_label: String,
    pub executive_summary: Vec<ExecutiveSummaryRow>,
    pub performance_rates: Vec<PerformanceRateRow>,
    pub top_performers: TopPerformers,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct WeekCounts {
    transfers: usize,
    sales: usize,
    underwriting: usize,
    dq: usize,
    callbacks: usize,
}

impl WeekCounts {
    fn add(&mut self, record: &DailyDealFlow) {
        self.transfers += 1;
        if record.is_sale() {
            self.sales += 1;
            if record.has_call_result(CALL_RESULT_UNDERWRITING) {
                self.underwriting += 1;
            }
        }
        if record.is_dq() {
            self.dq += 1;
        }
        if record.is_callback == Some(true) {
            self.callbacks += 1;
        }
    }

    fn from_records<'a>(records: impl IntoIterator<Item = &'a DailyDealFlow>) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.add(record);
        }
        counts
    }
}

fn center_name(record: &DailyDealFlow) -> &str {
    record
        .lead_vendor
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(UNASSIGNED_CENTER)
}

fn counts_by_center(records: &[DailyDealFlow]) -> BTreeMap<String, WeekCounts> {
    let mut centers: BTreeMap<String, WeekCounts> = BTreeMap::new();
    for record in records {
        centers.entry(center_name(record).to_string()).or_default().add(record);
    }
    centers
}

/// Signed whole-percent change, e.g. `+12%`.
pub fn format_delta(change: i64) -> String {
    if change > 0 {
        format!("+{}%", change)
    } else {
        format!("{}%", change)
    }
}

fn format_rate(value: f64) -> String {
    format!("{:.1}%", value)
}

impl WeeklyAgencyReport {
    pub fn from_records(week_label: &str, this_week: &[DailyDealFlow], last_week: &[DailyDealFlow]) -> Self {
        let current = WeekCounts::from_records(this_week);
        let previous = WeekCounts::from_records(last_week);

        let executive_summary = vec![
            ExecutiveSummaryRow::new("Total Transfers", current.transfers, previous.transfers),
            ExecutiveSummaryRow::new("Sales (Pending Approval)", current.sales, previous.sales),
            ExecutiveSummaryRow::new("Underwriting", current.underwriting, previous.underwriting),
            ExecutiveSummaryRow::new("DQ", current.dq, previous.dq),
            ExecutiveSummaryRow::new("Callbacks", current.callbacks, previous.callbacks),
        ];

        let performance_rates = vec![
            PerformanceRateRow {
                kpi: "Approval Rate".to_string(),
                rate: format_rate(rate(current.sales, current.transfers)),
                formula: "Sales / Transfers".to_string(),
                interpretation: "Share of transfers that became applications".to_string(),
            },
            PerformanceRateRow {
                kpi: "Underwriting Rate".to_string(),
                rate: format_rate(rate(current.underwriting, current.sales)),
                formula: "Underwriting / Sales".to_string(),
                interpretation: "Share of applications still in underwriting".to_string(),
            },
            PerformanceRateRow {
                kpi: "DQ Rate".to_string(),
                rate: format_rate(rate(current.dq, current.transfers)),
                formula: "DQ / Transfers".to_string(),
                interpretation: "Lower is better".to_string(),
            },
            PerformanceRateRow {
                kpi: "Callback Rate".to_string(),
                rate: format_rate(rate(current.callbacks, current.transfers)),
                formula: "Callbacks / Transfers".to_string(),
                interpretation: "Transfers that needed a second call".to_string(),
            },
        ];

        Self {
            week_label: week_label.to_string(),
            executive_summary,
            performance_rates,
            top_performers: top_performers(this_week, last_week),
        }
    }
}

fn top_performers(this_week: &[DailyDealFlow], last_week: &[DailyDealFlow]) -> TopPerformers {
    let current = counts_by_center(this_week);
    let previous = counts_by_center(last_week);

    // Ties go to the alphabetically first center
    let best_by = |key: fn(&WeekCounts) -> usize| {
        current
            .iter()
            .max_by(|(a_name, a), (b_name, b)| key(a).cmp(&key(b)).then_with(|| b_name.cmp(a_name)))
            .map(|(name, counts)| (name.clone(), key(counts)))
    };

    let highest_transfer = best_by(|c: &WeekCounts| c.transfers)
        .map(|(name, value)| Performer { name, value: format!("{} transfers", value) })
        .unwrap_or_default();
    let highest_sales = best_by(|c: &WeekCounts| c.sales)
        .map(|(name, value)| Performer { name, value: format!("{} sales", value) })
        .unwrap_or_default();

    let most_improved = current
        .iter()
        .map(|(name, counts)| {
            let before = previous.get(name).map(|c| c.sales).unwrap_or(0);
            (name, percentage_change(counts.sales as i64, before as i64))
        })
        .max_by(|(a_name, a), (b_name, b)| a.cmp(b).then_with(|| b_name.cmp(a_name)))
        .map(|(name, change)| Performer {
            name: name.clone(),
            value: format!("{} sales vs last week", format_delta(change)),
        })
        .unwrap_or_default();

    TopPerformers {
        highest_transfer,
        highest_sales,
        most_improved,
    }
}

impl CallCenterReport {
    /// One section per center seen in either week, ordered by name.
    pub fn per_center(this_week: &[DailyDealFlow], last_week: &[DailyDealFlow]) -> Vec<Self> {
        let current = counts_by_center(this_week);
        let previous = counts_by_center(last_week);

        let mut names: Vec<&String> = current.keys().chain(previous.keys()).collect();
        names.sort();
        names.dedup();

        names
            .into_iter()
            .map(|name| {
                let now = current.get(name).copied().unwrap_or_default();
                let before = previous.get(name).copied().unwrap_or_default();
                Self {
                    center_name: name.clone(),
                    metrics: vec![
                        ExecutiveSummaryRow::new("Transfers", now.transfers, before.transfers),
                        ExecutiveSummaryRow::new("Sales", now.sales, before.sales),
                        ExecutiveSummaryRow::new("Underwriting", now.underwriting, before.underwriting),
                        ExecutiveSummaryRow::new("DQ", now.dq, before.dq),
                    ],
                    feedbacks: Vec::new(),
                }
            })
            .collect()
    }

    pub fn with_feedback(mut self, feedback: CenterFeedback) -> Self {
        self.feedbacks.push(feedback);
        self
    }
}

/// Minimal HTML escaping for text nodes.
pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const REPORT_STYLE: &str = r#"    :root { color-scheme: light; }
    body { font-family: ui-sans-serif, system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial; margin: 28px; color: #111827; }
    .header { display: flex; justify-content: space-between; align-items: baseline; gap: 16px; border-bottom: 1px solid #e5e7eb; padding-bottom: 12px; margin-bottom: 18px; }
    .header h1 { font-size: 18px; margin: 0; letter-spacing: 0.04em; text-transform: uppercase; }
    .header .week { font-size: 13px; color: #374151; white-space: nowrap; }
    h2 { font-size: 14px; margin: 18px 0 6px; text-transform: uppercase; letter-spacing: 0.03em; }
    p.desc { margin: 0 0 10px; font-size: 12.5px; color: #374151; }
    table { width: 100%; border-collapse: collapse; margin: 8px 0 16px; }
    th, td { border: 1px solid #e5e7eb; padding: 8px 10px; font-size: 12.5px; vertical-align: top; }
    th { background: #f9fafb; text-align: left; font-weight: 600; }
    td.num { text-align: right; font-variant-numeric: tabular-nums; }
    .top h2, .top .desc { text-align: center; }
    .top ul { list-style: none; padding: 0; margin: 10px 0 0; }
    .top li { margin: 6px 0; font-size: 13px; }
    .feedback { margin: 6px 0 12px; font-size: 12px; }
    @media print { body { margin: 14mm; } }
"#;

fn document(title: &str, week_label: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\" />\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n  \
         <title>{title}</title>\n  <style>\n{style}  </style>\n</head>\n<body>\n  \
         <div class=\"header\">\n    <h1>{heading}</h1>\n    <div class=\"week\">{week}</div>\n  </div>\n\
         {body}</body>\n</html>\n",
        title = escape_html(title),
        style = REPORT_STYLE,
        heading = escape_html(&title.to_uppercase()),
        week = escape_html(week_label),
        body = body,
    )
}

fn metric_table(rows: &[ExecutiveSummaryRow], out: &mut String) {
    out.push_str("  <table>\n    <thead>\n      <tr><th>Metric</th><th>This Week</th><th>Last Week</th><th>Δ %</th></tr>\n    </thead>\n    <tbody>\n");
    for row in rows {
        let _ = writeln!(
            out,
            "      <tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
            escape_html(&row.metric),
            row.this_week,
            row.last_week,
            escape_html(&row.delta_percent),
        );
    }
    out.push_str("    </tbody>\n  </table>\n");
}

pub fn build_agency_report_html(report: &WeeklyAgencyReport) -> String {
    let mut body = String::new();

    body.push_str("  <h2>1. Executive Summary</h2>\n");
    body.push_str("  <p class=\"desc\">A quick overview of the agency's weekly performance.</p>\n");
    metric_table(&report.executive_summary, &mut body);

    body.push_str("  <h2>2. Performance Rates</h2>\n");
    body.push_str("  <table>\n    <thead>\n      <tr><th>KPI</th><th>Rate</th><th>Formula</th><th>Interpretation</th></tr>\n    </thead>\n    <tbody>\n");
    for row in &report.performance_rates {
        let _ = writeln!(
            body,
            "      <tr><td>{}</td><td class=\"num\">{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.kpi),
            escape_html(&row.rate),
            escape_html(&row.formula),
            escape_html(&row.interpretation),
        );
    }
    body.push_str("    </tbody>\n  </table>\n");

    let top = &report.top_performers;
    body.push_str("  <div class=\"top\">\n    <h2>Top Performers of the Week</h2>\n");
    body.push_str("    <p class=\"desc\">Highlighting individuals or teams boosts morale.</p>\n    <ul>\n");
    for (label, performer) in [
        ("🥇 Highest Transfer", &top.highest_transfer),
        ("🥇 Highest Sales", &top.highest_sales),
        ("⭐ Most Improved center", &top.most_improved),
    ] {
        let _ = writeln!(
            body,
            "      <li>{}: {} – {}</li>",
            label,
            escape_html(&performer.name),
            escape_html(&performer.value),
        );
    }
    body.push_str("    </ul>\n  </div>\n");

    document("Weekly Agency Performance Report", &report.week_label, &body)
}

pub fn build_call_center_report_html(week_label: &str, centers: &[CallCenterReport]) -> String {
    let mut body = String::new();

    if centers.is_empty() {
        body.push_str("  <p class=\"desc\">No call center data available for the selected range.</p>\n");
    }

    for (i, center) in centers.iter().enumerate() {
        let _ = writeln!(body, "  <h2>{}. {}</h2>", i + 1, escape_html(&center.center_name));
        metric_table(&center.metrics, &mut body);

        if !center.feedbacks.is_empty() {
            body.push_str("  <p><strong>LA Feedback:</strong></p>\n");
        }
        for feedback in &center.feedbacks {
            let by = if feedback.feedback_by.is_empty() { "admin" } else { &feedback.feedback_by };
            let by_line = match &feedback.created_at {
                Some(at) => format!("Feedback by {} ({}):", by, at),
                None => format!("Feedback by {}:", by),
            };
            let _ = writeln!(
                body,
                "  <div class=\"feedback\"><div>{}</div><div><strong>{}</strong></div><div>{}</div></div>",
                escape_html(&by_line),
                escape_html(&feedback.title),
                escape_html(&feedback.description),
            );
        }
    }

    document("Weekly Call Center Performance Report", week_label, &body)
}

pub fn write_report(path: &Path, html: &str) -> Result<()> {
    std::fs::write(path, html).with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!("📝 Report written to {}", path.display());
    Ok(())
}
