//! ReportBuddy Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;

use anyhow::Context;
use teloxide::dispatching::Dispatcher as UpdateDispatcher;
use teloxide::dptree;
use teloxide::Bot;
use tokio::sync::watch;
use tracing::{info, warn};

use ReportBuddy::{
    bot,
    config::Settings,
    database::{
        connection::DatabaseConfig, create_pool, run_migrations, DatabaseService, MemoryStore,
        Store,
    },
    dispatch::{spawn_workers, BackgroundQueue, Dispatcher, UserLocks},
    policy::{SystemClock, WindowPolicy},
    services::{analyzer_from_config, TelegramTransport},
    state::AppContext,
    utils::logging,
};

const MEMORY_STORE_URL: &str = "memory://";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;
    settings.validate()?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", ReportBuddy::info());

    let store: Arc<dyn Store> = if settings.database.url == MEMORY_STORE_URL {
        warn!("Using the in-memory store, data is lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        info!("Connecting to database...");
        let pool = create_pool(&DatabaseConfig::from(&settings.database)).await?;
        run_migrations(&pool).await?;
        Arc::new(DatabaseService::new(pool))
    };

    let policy = WindowPolicy::from_config(&settings.schedule)?;
    let clock = Arc::new(SystemClock::new(policy.timezone()));
    let analyzer = analyzer_from_config(&settings.analyzer)?;

    let telegram = Bot::new(&settings.bot.token);
    let transport = Arc::new(TelegramTransport::new(telegram.clone()));

    let ctx = Arc::new(AppContext::new(settings.clone(), store, transport, analyzer, clock)?);

    let (queue, receiver) = BackgroundQueue::channel(settings.dispatch.queue_capacity);
    let dispatcher = Arc::new(Dispatcher::new(ctx, UserLocks::new(), queue));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let workers =
        spawn_workers(dispatcher.clone(), receiver, settings.dispatch.workers, shutdown_rx);
    info!(workers = workers.len(), "Background workers started");

    let mut updates = UpdateDispatcher::builder(telegram, bot::schema())
        .dependencies(dptree::deps![dispatcher.clone()])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("ReportBuddy bot is ready, polling for updates");
    updates.dispatch().await;

    info!("Stopping background workers...");
    let _ = shutdown_tx.send(true);
    for worker in workers {
        if let Err(e) = worker.await {
            warn!(error = %e, "Background worker ended abnormally");
        }
    }

    let stats = dispatcher.locks().stats();
    info!(
        entered = stats.entered,
        exited = stats.exited,
        "ReportBuddy bot has been shut down"
    );

    Ok(())
}
