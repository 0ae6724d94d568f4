mod pipeline;

use clap::{Parser, Subcommand};
use kpulse_core::AppConfig;
use kpulse_pipeline::Pipeline;

#[derive(Debug, Parser)]
#[command(name = "kpulse-cli")]
#[command(about = "kpulse news pipeline command line interface")]
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
    /// Fetch feeds and upsert new articles
    Collect,
    /// Translate, classify, and tag a batch of untranslated articles
    Translate {
        /// Articles to translate (1-15, default 5)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Generate last week's per-group roundups
    Roundup,
    /// Collect, then translate one batch
    News,
    /// Show article and source counts
    Status,
    /// List recent pipeline runs
    Runs {
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("kpulse-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = kpulse_core::load_app_config()?;
    let pool_config = kpulse_db::PoolConfig::from_app_config(&config);
    let pool = kpulse_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            kpulse_db::ping(&pool).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = kpulse_db::run_migrations(&pool).await?;
            println!("applied {applied} migrations");
        }
        Commands::Runs { limit } => pipeline::run_runs(&pool, limit).await?,
        Commands::Collect => pipeline::run_collect(&build_pipeline(&config, pool)?).await?,
        Commands::Translate { limit } => {
            pipeline::run_translate(&build_pipeline(&config, pool)?, limit).await?;
        }
        Commands::Roundup => pipeline::run_roundup(&build_pipeline(&config, pool)?).await?,
        Commands::News => pipeline::run_news(&build_pipeline(&config, pool)?).await,
        Commands::Status => pipeline::run_status(&build_pipeline(&config, pool)?).await?,
    }

    Ok(())
}

fn build_pipeline(config: &AppConfig, pool: sqlx::PgPool) -> anyhow::Result<Pipeline> {
    Ok(Pipeline::from_app_config(config, pool)?)
}
