use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use deal_flow::access::AccessRoleResolver;
use deal_flow::api::PostgrestClient;
use deal_flow::deal_flow::DealFlowService;
use deal_flow::models::Config;
use deal_flow::seed::{generate_entries, SeedOptions};

/// Rows per insert request
const INSERT_BATCH_SIZE: usize = 500;

#[derive(Parser)]
#[command(name = "seed_deal_flow", about = "Generate synthetic daily deal flow rows")]
struct Args {
    #[arg(long, default_value_t = 7)]
    days: u32,
    #[arg(long, default_value_t = 5)]
    min_per_day: u32,
    #[arg(long, default_value_t = 15)]
    max_per_day: u32,
    /// Insert into the data store instead of printing JSON
    #[arg(long)]
    insert: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deal_flow=info,seed_deal_flow=info"));
    tracing::subscriber::set_global_default(FmtSubscriber::builder().with_env_filter(filter).finish())?;

    let args = Args::parse();
    let options = SeedOptions::new(args.days, args.min_per_day, args.max_per_day);

    if !args.insert {
        let today = Config::calendar_from_env()?.today();
        let entries = generate_entries(today, options, &mut rand::thread_rng());
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let config = Config::from_env()?;
    let client = Arc::new(PostgrestClient::new(&config)?);
    let access = Arc::new(AccessRoleResolver::new(client.clone()));
    let service = DealFlowService::new(client, access, config.calendar);

    let entries = generate_entries(config.calendar.today(), options, &mut rand::thread_rng());
    info!("🌱 Seeding {} entries across {} days", entries.len(), options.days);

    let mut inserted = 0;
    for (i, batch) in entries.chunks(INSERT_BATCH_SIZE).enumerate() {
        match service.create_many(batch).await {
            Ok(rows) => {
                inserted += rows.len();
                info!("✅ Batch {} inserted {} rows", i + 1, rows.len());
            }
            Err(e) => {
                warn!("❌ Batch {} failed: {}", i + 1, e);
                return Err(e.into());
            }
        }
    }

    info!("🏁 Successfully seeded {} entries across {} days", inserted, options.days);
    Ok(())
}
