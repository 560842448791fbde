use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use remit_guard::adapters::{PostgresAuditRepository, PostgresTransactionRepository};
use remit_guard::cli::{self, Cli, Commands, DbCommands, SwiftCommands, TxCommands};
use remit_guard::config::{Config, LogFormat};
use remit_guard::ports::{AuditStore, TransactionStore};
use remit_guard::services::CleanupService;
use remit_guard::{create_app, db, AppState};

fn init_tracing(format: LogFormat) {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    );

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    if let Some(Commands::Swift(SwiftCommands::Validate { code })) = &args.command {
        return cli::handle_swift_validate(code);
    }

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Tx(TxCommands::PurgeStale) => cli::handle_tx_purge_stale(&config).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Swift(SwiftCommands::Validate { code }) => cli::handle_swift_validate(&code),
        Commands::Config => cli::handle_config_validate(&config),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;

    let transactions: Arc<dyn TransactionStore> =
        Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let audit: Arc<dyn AuditStore> = Arc::new(PostgresAuditRepository::new(pool));

    let state = AppState::new(transactions.clone(), audit, config.policy());

    let schedule = config
        .cleanup_schedule
        .parse::<cron::Schedule>()
        .map_err(|e| anyhow::anyhow!("Invalid cleanup schedule: {}", e))?;
    CleanupService::new(transactions, state.audit.clone(), config.stale_pending_days)
        .start(schedule);
    tracing::info!(
        schedule = %config.cleanup_schedule,
        stale_pending_days = config.stale_pending_days,
        "Stale pending cleanup scheduled"
    );

    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
