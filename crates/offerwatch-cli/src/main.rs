mod log;
mod scrape;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "offerwatch-cli")]
#[command(about = "Offerwatch command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape offer listings and reconcile them into the store
    Scrape {
        /// Source selector: all, us, us-only, us-florida or ca
        #[arg(long)]
        source: Option<String>,

        /// Classify offers without writing to the store
        #[arg(long)]
        dry_run: bool,

        /// Read raw offers from a JSON file and reconcile into memory instead
        /// of fetching and using the database
        #[arg(long, value_name = "FILE")]
        fixture: Option<std::path::PathBuf>,
    },
    /// Show recent scrape log entries
    Log {
        /// Maximum number of entries to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // The fixture path runs without DATABASE_URL, so the level is read
    // directly rather than through `AppConfig`.
    let log_level = std::env::var("OFFERWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    // stdout carries the run report; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Scrape {
            source,
            dry_run,
            fixture,
        }) => {
            let options = scrape::ScrapeOptions {
                selector: source,
                dry_run,
                fixture,
            };
            scrape::run_scrape_command(&options).await?;
        }
        Some(Commands::Log { limit }) => {
            let pool = connect().await?;
            log::run_log(&pool, limit).await?;
        }
        Some(Commands::Migrate) => {
            let pool = connect().await?;
            let applied = offerwatch_db::run_migrations(&pool).await?;
            println!("migrations up to date ({applied} applied)");
        }
        None => {
            println!("offerwatch-cli: pass --help to list commands");
        }
    }

    Ok(())
}

/// Loads the full application config and opens a pool with its settings.
pub(crate) async fn connect() -> anyhow::Result<sqlx::PgPool> {
    let config = offerwatch_core::load_app_config()?;
    let pool_config = offerwatch_db::PoolConfig::from_app_config(&config);
    let pool = offerwatch_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}
