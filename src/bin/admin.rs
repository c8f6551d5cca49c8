//! CLI administration tool for snip.
//!
//! Inspects and maintains the registry directly, without going through the
//! HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Service-wide totals
//! cargo run --bin admin -- stats
//!
//! # One record
//! cargo run --bin admin -- show q3Zk1_Ab
//!
//! # Run one expiration sweep now
//! cargo run --bin admin -- sweep
//!
//! # Delete every record (asks for confirmation unless -y)
//! cargo run --bin admin -- purge
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Reads the same variables as the server (see `snip::config`). `REDIS_URL`
//! is needed for `sweep` and `purge` to clear cache entries.

use snip::application::services::{DeleteAllPolicy, LinkService, StatsService};
use snip::config::Config;
use snip::domain::expiration_sweeper::ExpirationSweeper;
use snip::domain::repositories::Registry;
use snip::infrastructure::persistence::PgRegistry;
use snip::server::{connect_cache, connect_pool};

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing snip.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Show service-wide statistics
    Stats,

    /// Show one short URL
    Show {
        /// Token of the short URL
        token: String,
    },

    /// Run one expiration sweep
    Sweep,

    /// Delete every short URL
    Purge {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let pool = connect_pool(&config).await?;
    let registry: Arc<dyn Registry> =
        Arc::new(PgRegistry::new(Arc::new(pool.clone()), config.io_timeout));

    match cli.command {
        Commands::Stats => handle_stats(registry, &pool).await?,
        Commands::Show { token } => handle_show(registry, &token).await?,
        Commands::Sweep => handle_sweep(registry, &config).await?,
        Commands::Purge { yes } => handle_purge(registry, &config, yes).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Prints totals and the number of expired records awaiting a sweep.
async fn handle_stats(registry: Arc<dyn Registry>, pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let stats = StatsService::new(registry).service_stats().await?;

    let awaiting_sweep: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM short_urls WHERE expiration <= now()")
            .fetch_one(pool)
            .await?;

    println!(
        "  URLs:            {}",
        stats.total_urls.to_string().bright_green().bold()
    );
    println!(
        "  Redirects:       {}",
        stats.total_redirects.to_string().bright_green().bold()
    );
    println!(
        "  Awaiting sweep:  {}",
        awaiting_sweep.to_string().bright_yellow()
    );
    println!();

    Ok(())
}

/// Prints one record.
async fn handle_show(registry: Arc<dyn Registry>, token: &str) -> Result<()> {
    let record = StatsService::new(registry)
        .url_stats(token)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load '{}': {}", token, e))?;

    let status = if record.is_expired() {
        "EXPIRED".red()
    } else {
        "LIVE".green()
    };

    println!("{}", "🔗 Short URL".bright_blue().bold());
    println!();
    println!("  Token:      {}", record.token.cyan());
    println!("  URL:        {}", record.url.bright_white());
    println!("  Short URL:  {}", record.shortened_url.bright_white());
    println!(
        "  Expires:    {} {}",
        record
            .expiration
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string()
            .bright_black(),
        status
    );
    println!(
        "  Redirects:  {}",
        record.redirects.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Runs a single sweeper pass.
async fn handle_sweep(registry: Arc<dyn Registry>, config: &Config) -> Result<()> {
    println!("{}", "🧹 Sweeping expired URLs...".bright_blue());

    let cache = connect_cache(config).await;
    let sweeper = ExpirationSweeper::new(
        registry,
        cache,
        config.sweep.interval,
        config.sweep.batch_size,
    );

    let report = sweeper.run_once(Utc::now()).await?;

    println!(
        "  Scanned: {}  Purged: {}  Failed: {}",
        report.scanned.to_string().bright_white(),
        report.purged.to_string().bright_green().bold(),
        report.failed.to_string().red()
    );

    Ok(())
}

/// Deletes every record in one transaction after confirmation.
async fn handle_purge(registry: Arc<dyn Registry>, config: &Config, yes: bool) -> Result<()> {
    println!("{}", "🗑️  Purge all short URLs".bright_blue().bold());
    println!();

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Delete every short URL? This cannot be undone")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let cache = connect_cache(config).await;
    let links = LinkService::new(registry, cache, config.links.clone());

    let report = links.delete_all(DeleteAllPolicy::AllOrNothing).await?;

    println!(
        "{} {}",
        "✅ Deleted".green().bold(),
        report.deleted.to_string().bright_white().bold()
    );

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL:  {}", version.bright_white());
            println!("  Migrations:  {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
