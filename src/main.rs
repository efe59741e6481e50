use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{Duration, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use deal_flow::access::AccessRoleResolver;
use deal_flow::api::PostgrestClient;
use deal_flow::calendar::{last_n_working_days, parse_civil_date, weekday_short_name, working_days_between};
use deal_flow::deal_flow::DealFlowService;
use deal_flow::export::export_csv;
use deal_flow::models::{Config, DealFlowFilters};
use deal_flow::report::{
    build_agency_report_html, build_call_center_report_html, write_report, CallCenterReport, WeeklyAgencyReport,
};
use deal_flow::{split_into_contiguous_ranges, BusinessCalendar, DateRange, WorkingDayPolicy};

#[derive(Parser)]
#[command(name = "deal-flow", about = "Daily deal flow working-day fetcher and reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone, Copy)]
struct PolicyArgs {
    /// Count Sundays as working days
    #[arg(long)]
    include_sunday: bool,
    /// Do not count Saturdays as working days
    #[arg(long)]
    exclude_saturday: bool,
}

impl From<PolicyArgs> for WorkingDayPolicy {
    fn from(args: PolicyArgs) -> Self {
        WorkingDayPolicy::new(args.include_sunday, args.exclude_saturday)
    }
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    #[arg(long)]
    agent: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    carrier: Option<String>,
    #[arg(long)]
    call_result: Option<String>,
    #[arg(long)]
    lead_vendor: Option<String>,
    #[arg(long)]
    insured_name: Option<String>,
}

impl FilterArgs {
    fn into_filters(self, page_size: usize) -> DealFlowFilters {
        DealFlowFilters {
            agent: self.agent,
            status: self.status,
            carrier: self.carrier,
            call_result: self.call_result,
            lead_vendor: self.lead_vendor,
            insured_name: self.insured_name,
            limit: Some(page_size),
            ..DealFlowFilters::default()
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Collapse dates into contiguous ranges
    Ranges {
        /// Dates as YYYY-MM-DD, any order
        #[arg(required = true)]
        dates: Vec<String>,
    },
    /// List working days, either the last N or those inside a range
    WorkingDays {
        /// Last day to consider, defaults to today in the business timezone
        #[arg(long)]
        end: Option<String>,
        #[arg(long, default_value_t = 7)]
        count: usize,
        /// With --start, list every working day from start to end instead
        #[arg(long)]
        start: Option<String>,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Fetch rows for the last N working days
    Fetch {
        #[arg(long)]
        end: Option<String>,
        #[arg(long, default_value_t = 7)]
        count: usize,
        #[command(flatten)]
        policy: PolicyArgs,
        #[command(flatten)]
        filters: FilterArgs,
        /// Write the rows to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Dashboard metrics for one day
    Metrics {
        #[arg(long)]
        date: Option<String>,
    },
    /// Last N working days against the N before them
    Compare {
        #[arg(long)]
        end: Option<String>,
        #[arg(long, default_value_t = 5)]
        count: usize,
        #[command(flatten)]
        policy: PolicyArgs,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Weekly agency and call center HTML reports
    Report {
        /// Last day of the reported week
        #[arg(long)]
        end: Option<String>,
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deal_flow=info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn resolve_day(value: Option<&str>, calendar: &BusinessCalendar) -> Result<NaiveDate> {
    match value {
        Some(value) => parse_civil_date(value),
        None => Ok(calendar.today()),
    }
}

fn print_dates(dates: &[NaiveDate]) {
    for date in dates {
        println!("{} {}", date, weekday_short_name(chrono::Datelike::weekday(date)));
    }
}

fn build_service(config: &Config) -> Result<DealFlowService> {
    let client = Arc::new(PostgrestClient::new(config)?);
    let access = Arc::new(AccessRoleResolver::new(client.clone()));
    Ok(DealFlowService::new(client, access, config.calendar))
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run(Cli::parse()).await {
        error!("Command failed: {:#}", e);
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Ranges { dates } => {
            let parsed = dates.iter().map(|d| parse_civil_date(d)).collect::<Result<Vec<_>>>()?;
            for range in split_into_contiguous_ranges(parsed) {
                println!("{}", range);
            }
        }
        Command::WorkingDays { end, count, start, policy } => {
            let calendar = Config::calendar_from_env()?;
            let end = resolve_day(end.as_deref(), &calendar)?;
            let dates = match start {
                Some(start) => working_days_between(parse_civil_date(&start)?, end, policy.into()),
                None => last_n_working_days(end, count, policy.into())?,
            };
            print_dates(&dates);
        }
        Command::Fetch { end, count, policy, filters, csv } => {
            let config = Config::from_env()?;
            let service = build_service(&config)?;
            let end = resolve_day(end.as_deref(), &config.calendar)?;

            let dates = last_n_working_days(end, count, policy.into())?;
            let rows = service
                .fetch_all_by_working_dates(&dates, &filters.into_filters(config.page_size))
                .await?;

            info!("✅ Fetched {} rows over {} working days", rows.len(), dates.len());
            match csv {
                Some(path) => export_csv(&rows, &path)?,
                None => println!("{}", serde_json::to_string_pretty(&rows)?),
            }
        }
        Command::Metrics { date } => {
            let config = Config::from_env()?;
            let service = build_service(&config)?;
            let day = date.as_deref().map(parse_civil_date).transpose()?;

            let metrics = service.get_metrics(day).await?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        Command::Compare { end, count, policy, filters } => {
            if count == 0 {
                bail!("--count must be at least 1");
            }
            let config = Config::from_env()?;
            let service = build_service(&config)?;
            let end = resolve_day(end.as_deref(), &config.calendar)?;

            let result = service
                .compare_working_days(end, count, policy.into(), &filters.into_filters(config.page_size))
                .await?;

            println!("Current:  {:?}", result.current_dates);
            println!("Previous: {:?}", result.previous_dates);
            println!("{}", serde_json::to_string_pretty(&result.comparison)?);
        }
        Command::Report { end, out_dir } => {
            let config = Config::from_env()?;
            let service = build_service(&config)?;
            let end = resolve_day(end.as_deref(), &config.calendar)?;

            let this_week = end
                .checked_sub_signed(Duration::days(6))
                .and_then(|start| DateRange::new(start, end))
                .ok_or_else(|| anyhow::anyhow!("invalid report week ending {}", end))?;
            let last_week = deal_flow::calendar::previous_period_range(&this_week)
                .ok_or_else(|| anyhow::anyhow!("no week before {}", this_week))?;
            let filters = DealFlowFilters { limit: Some(config.page_size), ..DealFlowFilters::default() };

            let current: Vec<NaiveDate> = this_week.iter_days().collect();
            let previous: Vec<NaiveDate> = last_week.iter_days().collect();
            let current_rows = service.fetch_all_by_working_dates(&current, &filters).await?;
            let previous_rows = service.fetch_all_by_working_dates(&previous, &filters).await?;

            let week_label = format!("{} to {}", this_week.start, this_week.end);
            let agency = WeeklyAgencyReport::from_records(&week_label, &current_rows, &previous_rows);
            let centers = CallCenterReport::per_center(&current_rows, &previous_rows);

            std::fs::create_dir_all(&out_dir)?;
            write_report(&out_dir.join("agency_performance.html"), &build_agency_report_html(&agency))?;
            write_report(
                &out_dir.join("call_center_performance.html"),
                &build_call_center_report_html(&week_label, &centers),
            )?;
            info!("🏁 Reports for {} ready in {}", week_label, out_dir.display());
        }
    }

    Ok(())
}
