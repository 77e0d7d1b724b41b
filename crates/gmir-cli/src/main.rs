mod query;
mod run;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gmir-cli")]
#[command(about = "Global Map Intelligence Report command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run the daily report pipeline once
    Run {
        /// Report date (YYYY-MM-DD); defaults to today in the configured offset
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Fetch, filter and summarize without writing runs or items to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Show recent report runs
    Status {
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Print a stored report as JSON
    Report {
        /// Report date (YYYY-MM-DD); defaults to the latest run
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{raw}'; expected YYYY-MM-DD"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("gmir-cli ready; run with --help to list commands");
        return Ok(());
    };

    let config = gmir_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = gmir_db::PoolConfig::from_app_config(&config);
    let pool = gmir_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            gmir_db::health_check(&pool).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = gmir_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Run { date, dry_run } => run::run_report(pool, &config, date, dry_run).await?,
        Commands::Status { limit } => query::run_status(pool, limit).await?,
        Commands::Report { date } => query::run_report_json(pool, date).await?,
    }

    Ok(())
}
