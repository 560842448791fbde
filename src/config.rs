use anyhow::Result;
use dotenvy::dotenv;
use std::env;

pub mod policy;

pub use policy::{AccountNumberPolicy, PolicyConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub account_number_policy: AccountNumberPolicy,
    pub stale_pending_days: i64,
    pub cleanup_schedule: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let cleanup_schedule =
            env::var("CLEANUP_SCHEDULE").unwrap_or_else(|_| "0 0 0 * * *".to_string());
        cleanup_schedule
            .parse::<cron::Schedule>()
            .map_err(|e| {
                anyhow::anyhow!("CLEANUP_SCHEDULE is not a valid cron expression: {}", e)
            })?;

        let stale_pending_days: i64 = env::var("STALE_PENDING_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?;
        if stale_pending_days <= 0 {
            anyhow::bail!("STALE_PENDING_DAYS must be greater than 0");
        }

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            account_number_policy: env::var("ACCOUNT_NUMBER_POLICY")
                .unwrap_or_else(|_| "alphanumeric".to_string())
                .parse()?,
            stale_pending_days,
            cleanup_schedule,
            log_format: parse_log_format(&env::var("LOG_FORMAT").unwrap_or_default())?,
        })
    }

    /// Business policy for this deployment.
    pub fn policy(&self) -> PolicyConfig {
        PolicyConfig::default().with_account_number_policy(self.account_number_policy)
    }
}

fn parse_log_format(raw: &str) -> Result<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => anyhow::bail!("LOG_FORMAT must be 'text' or 'json', got '{}'", other),
    }
}
