mod db;
mod export;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "portal-cli")]
#[command(about = "Pricing portal operator commands")]
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
    /// Write the pricing spreadsheet to disk
    Export {
        /// Output file (defaults to product-pricing-<today>.xlsx)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database answers
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Replace the catalog with the sample products
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("portal-cli: nothing to do (try --help)");
        return Ok(());
    };

    let config = portal_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = portal_db::PoolConfig::from_app_config(&config);
    let pool = portal_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => db::run_ping(&pool).await?,
            DbCommands::Migrate => db::run_migrate(&pool).await?,
            DbCommands::Seed => db::run_seed(&pool).await?,
        },
        Commands::Export { out } => export::run_export(&pool, out).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
