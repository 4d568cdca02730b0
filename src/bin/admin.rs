//! CLI administration tool for clck.
//!
//! Inspects and maintains the short URL store without going through the
//! HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Print the code a URL maps to (no database needed)
//! cargo run --bin admin -- derive https://example.com/a/b
//!
//! # Show the record behind a code
//! cargo run --bin admin -- lookup A8SlAtQ
//!
//! # Record counts
//! cargo run --bin admin -- stats
//!
//! # Delete expired records
//! cargo run --bin admin -- purge-expired
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_HOST`/`DB_USER`/`DB_PASSWORD`/`DB_NAME`: PostgreSQL
//!   connection (all commands except `derive`)
//! - `SHORT_CODE_LENGTH`: default length for `derive`
//! - `REDIS_URL` or `REDIS_HOST`/...: cache to invalidate after `purge-expired`

use clck::config::{Config, MIN_CODE_LENGTH};
use clck::domain::repositories::UrlStore;
use clck::infrastructure::cache::{RedisCache, invalidate_codes};
use clck::infrastructure::persistence::PgUrlStore;
use clck::utils::code_generator::{DEFAULT_CODE_LENGTH, MAX_CODE_LENGTH, derive_code};
use clck::utils::url_validator::validate_url;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing clck.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Print the short code derived from a URL
    Derive {
        url: String,

        /// Code length (defaults to SHORT_CODE_LENGTH or 7)
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Show the record stored for a short code
    Lookup { code: String },

    /// Show record counts
    Stats,

    /// Delete records whose expiry has passed
    PurgeExpired {
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

    match cli.command {
        Commands::Derive { url, length } => handle_derive(&url, length)?,
        Commands::Lookup { code } => handle_lookup(&connect().await?, &code).await?,
        Commands::Stats => handle_stats(&connect().await?).await?,
        Commands::PurgeExpired { yes } => handle_purge(&connect().await?, yes).await?,
        Commands::Db { action } => handle_db_action(action, &connect().await?).await?,
    }

    Ok(())
}

async fn connect() -> Result<PgPool> {
    let database_url = Config::load_database_url()?;

    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

fn store(pool: &PgPool) -> PgUrlStore {
    PgUrlStore::new(Arc::new(pool.clone()))
}

/// Validates a URL and prints the code the service would assign it.
fn handle_derive(url: &str, length: Option<usize>) -> Result<()> {
    let length = length
        .or_else(|| {
            std::env::var("SHORT_CODE_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
        })
        .unwrap_or(DEFAULT_CODE_LENGTH);

    if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&length) {
        anyhow::bail!("length must be between {MIN_CODE_LENGTH} and {MAX_CODE_LENGTH}, got {length}");
    }

    let target_url = validate_url(url).map_err(|e| anyhow::anyhow!("Rejected URL: {}", e))?;
    let code = derive_code(&target_url, length);

    println!("  URL:  {}", target_url.cyan());
    println!("  Code: {}", code.bright_yellow().bold());

    Ok(())
}

async fn handle_lookup(pool: &PgPool, code: &str) -> Result<()> {
    println!("{}", "🔎 Lookup".bright_blue().bold());
    println!();

    let record = store(pool)
        .lookup(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    let Some(record) = record else {
        println!("  {}", format!("No record for '{code}'").yellow());
        return Ok(());
    };

    let status = if record.is_expired_at(Utc::now()) {
        "EXPIRED".red()
    } else {
        "ACTIVE".green()
    };

    println!("  Code:    {}", record.short_code.bright_yellow());
    println!("  Target:  {}", record.target_url.cyan());
    println!(
        "  Created: {}",
        record.created_at.format("%Y-%m-%d %H:%M").to_string().bright_black()
    );
    println!(
        "  Expires: {}",
        record.expires_at.format("%Y-%m-%d %H:%M").to_string().bright_black()
    );
    println!("  Status:  {}", status);
    println!();

    Ok(())
}

/// Displays record counts.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let store = store(pool);

    let total = store
        .count_all()
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;
    let expired = store
        .count_expired()
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    println!("  Records: {}", total.to_string().bright_green().bold());
    println!("  Expired: {}", expired.to_string().yellow().bold());
    println!(
        "  Active:  {}",
        (total - expired).to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Deletes expired records after confirmation.
///
/// The service itself never deletes records; this is the only removal path.
async fn handle_purge(pool: &PgPool, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Purge expired records".bright_blue().bold());
    println!();

    let store = store(pool);

    let expired = store
        .count_expired()
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    if expired == 0 {
        println!("{}", "  Nothing to purge".green());
        return Ok(());
    }

    println!("  Expired records: {}", expired.to_string().yellow().bold());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete these records?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let purged = store
        .purge_expired()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to purge: {}", e))?;

    println!();
    println!(
        "{}",
        format!("✅ Deleted {} expired records", purged.len()).green().bold()
    );

    invalidate_purged(&purged).await?;
    println!();

    Ok(())
}

/// Drops cache entries for purged codes so resolves cannot serve them.
async fn invalidate_purged(codes: &[String]) -> Result<()> {
    let Some(redis_url) = Config::load_redis_url() else {
        return Ok(());
    };

    let ttl = std::env::var("CACHE_TTL_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3600);

    let cache = RedisCache::connect(&redis_url, ttl).await.map_err(|e| {
        anyhow::anyhow!(
            "Records deleted but cache not invalidated ({}); flush the cache or wait {}s",
            e,
            ttl
        )
    })?;

    let failed = invalidate_codes(&cache, codes).await;
    if failed.is_empty() {
        println!("  {}", "Cache entries invalidated".green());
        Ok(())
    } else {
        anyhow::bail!(
            "Failed to invalidate {} cache entries: {}",
            failed.len(),
            failed.join(", ")
        )
    }
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            store(pool)
                .ping()
                .await
                .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}
