use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::adapters::{PostgresAuditRepository, PostgresTransactionRepository};
use crate::config::Config;
use crate::services::{AuditRecorder, CleanupService};
use crate::validation::swift::SwiftValidator;

#[derive(Parser)]
#[command(name = "remit-guard")]
#[command(about = "Remit Guard - interbank payment validation and verification", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Transaction maintenance commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// SWIFT/BIC utilities
    #[command(subcommand)]
    Swift(SwiftCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Purge pending transactions older than STALE_PENDING_DAYS
    PurgeStale,
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
pub enum SwiftCommands {
    /// Validate a SWIFT/BIC code against the restricted-country policy
    Validate {
        #[arg(value_name = "CODE")]
        code: String,
    },
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;

    println!("✓ Database migrations completed");

    Ok(())
}

pub async fn handle_tx_purge_stale(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;
    let cleanup = CleanupService::new(
        Arc::new(PostgresTransactionRepository::new(pool.clone())),
        AuditRecorder::new(Arc::new(PostgresAuditRepository::new(pool))),
        config.stale_pending_days,
    );

    let purged = cleanup.purge_stale_pending().await?;
    println!(
        "✓ Purged {} pending transaction(s) older than {} days",
        purged, config.stale_pending_days
    );

    Ok(())
}

/// Needs no database, so it runs without a loaded `Config`.
pub fn handle_swift_validate(code: &str) -> anyhow::Result<()> {
    let validator = SwiftValidator::from_policy(&crate::config::PolicyConfig::default().risk);
    let result = validator.validate(code);

    println!("{}: {}", result.swift_code, result.reason);
    if !result.valid {
        anyhow::bail!("{}", result.reason);
    }

    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Database URL: {}", mask_password(&config.database_url));
    println!("  Account Number Policy: {}", config.account_number_policy);
    println!("  Stale Pending Days: {}", config.stale_pending_days);
    println!("  Cleanup Schedule: {}", config.cleanup_schedule);
    println!("  Log Format: {:?}", config.log_format);

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
