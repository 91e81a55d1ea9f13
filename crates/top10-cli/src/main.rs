mod pipeline;
mod schedule;

use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use top10_core::{AppConfig, RunStatus};
use top10_db::{MemoryRankingStore, PgRankingStore, PoolConfig};
use top10_scraper::Top10Client;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "top10")]
#[command(about = "Weekly top-10 ranking collector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect one week of rankings and print the run result as JSON
    Run {
        /// Week-start date to collect instead of the latest (YYYY-MM-DD)
        #[arg(long, value_parser = parse_week)]
        week: Option<NaiveDate>,
        /// Fetch and validate without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Apply pending database migrations
    Migrate,
    /// List recent collection runs
    Runs {
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(i64).range(1..))]
        limit: i64,
    },
    /// Run the collector on the configured cron schedule until interrupted
    Schedule,
}

fn parse_week(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = top10_core::load_app_config()?;

    // Logs go to stderr so `run` output on stdout stays machine-readable.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Run { week, dry_run } => run_once(&config, week, dry_run).await,
        Commands::Migrate => {
            let pool = top10_db::connect_pool(
                config.require_database_url()?,
                PoolConfig::from_app_config(&config),
            )
            .await?;
            let applied = top10_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Runs { limit } => {
            let pool = top10_db::connect_pool(
                config.require_database_url()?,
                PoolConfig::from_app_config(&config),
            )
            .await?;
            for run in top10_db::list_runs(&pool, limit).await? {
                println!(
                    "{}  {:<15}  {:<8}  saved={:<3}  errors={:<3}  {}",
                    run.started_at.format("%Y-%m-%d %H:%M:%S"),
                    run.status,
                    run.source_used,
                    run.documents_saved,
                    run.errors.len(),
                    run.run_id
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Schedule => {
            schedule::run_scheduler(Arc::new(config)).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_once(
    config: &AppConfig,
    week: Option<NaiveDate>,
    dry_run: bool,
) -> anyhow::Result<ExitCode> {
    let client = Top10Client::from_config(config)?;

    let result = if dry_run {
        tracing::info!("dry run: rankings are kept in memory only");
        let store = MemoryRankingStore::new();
        pipeline::run_pipeline(config, &client, &store, week).await
    } else {
        let database_url = config.require_database_url()?;
        let pool =
            top10_db::shared_pool(database_url, PoolConfig::from_app_config(config)).await?;
        let store = PgRankingStore::new(pool);
        pipeline::run_pipeline(config, &client, &store, week).await
    };

    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.status == RunStatus::Failure {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
