//! Common test utilities and helpers

#![allow(dead_code)]

use chrono::NaiveDate;

/// Test data utilities
pub mod test_data {
    use super::*;
    use deal_flow::models::DailyDealFlow;

    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// Create a test deal flow row
    pub fn create_test_row(id: &str, day: NaiveDate, status: &str) -> DailyDealFlow {
        DailyDealFlow {
            id: id.to_string(),
            submission_id: format!("{:016}", id.len()),
            lead_vendor: Some("Ark Tech".to_string()),
            date: Some(day),
            insured_name: Some("Jane Smith".to_string()),
            status: Some(status.to_string()),
            call_result: Some("Submitted".to_string()),
            created_at: Some(format!("{}T15:00:00+00:00", day)),
            ..DailyDealFlow::default()
        }
    }

    /// Create a range of consecutive test dates
    pub fn create_test_date_range(start_date: NaiveDate, days: i64) -> Vec<NaiveDate> {
        (0..days)
            .map(|i| start_date + chrono::Duration::days(i))
            .collect()
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;
    use tracing::{debug, info};

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            // Another test harness may already have installed one
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("deal_flow=debug,test=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }

    /// Log test data
    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("📊 {}: {:?}", label, data);
    }
}
