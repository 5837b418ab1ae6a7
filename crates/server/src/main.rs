use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelforge_core::{
    AccountPool, DeliveryFanout, GeminiScreenwriter, Scheduler, Sink, SqliteIdeaStore,
    SqliteSchedulerStore, SqliteTaskStore, TaskOrchestrator, TelegramSink, TelegramUpdateSource,
    TikTokSink, UpdatePoller, UpdateSource, VeoClient, load_config,
};

use reelforge_server::api::create_router;
use reelforge_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("REELFORGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration (validation included)
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Generation accounts: {}", config.accounts.len());

    // Persistent stores share the same database file
    let task_store = Arc::new(
        SqliteTaskStore::new(&config.database.path).context("Failed to create task store")?,
    );
    info!("Task store initialized");

    let idea_store = Arc::new(
        SqliteIdeaStore::new(&config.database.path).context("Failed to create idea store")?,
    );
    info!("Idea store initialized");

    let scheduler_store = Arc::new(
        SqliteSchedulerStore::new(&config.database.path)
            .context("Failed to create scheduler store")?,
    );
    info!("Scheduler store initialized");

    // Account pool with background cooldown reviver
    let pool = Arc::new(AccountPool::new(
        config.pool.clone(),
        config.account_seeds(),
    ));
    pool.spawn_reviver();

    // Upstream clients
    let screenwriter = Arc::new(
        GeminiScreenwriter::new(&config.screenwriter)
            .context("Failed to create screenwriter client")?,
    );
    let generator = Arc::new(
        VeoClient::new(&config.generator).context("Failed to create video generator client")?,
    );

    // Delivery sinks
    let mut fanout = DeliveryFanout::new();
    if let Some(ref telegram_config) = config.telegram {
        let sink = TelegramSink::new(telegram_config)
            .context("Failed to create telegram sink")?;
        fanout = fanout.register(Arc::new(sink) as Arc<dyn Sink>);
        info!("Telegram sink configured");
    }
    if let Some(ref tiktok_config) = config.tiktok {
        let sink =
            TikTokSink::new(tiktok_config).context("Failed to create tiktok sink")?;
        fanout = fanout.register(Arc::new(sink) as Arc<dyn Sink>);
        info!("TikTok sink configured");
    }

    // Orchestrator owns the pipeline
    let orchestrator = TaskOrchestrator::new(
        Arc::clone(&task_store) as _,
        Arc::clone(&idea_store) as _,
        screenwriter,
        generator,
        Arc::clone(&pool),
        Arc::new(fanout),
    );

    // Scheduler with persisted schedule
    let scheduler = Arc::new(
        Scheduler::new(
            orchestrator.clone(),
            Arc::clone(&idea_store) as _,
            scheduler_store,
            &config.scheduler,
        )
        .context("Failed to create scheduler")?,
    );
    scheduler.spawn();
    info!("Scheduler tick loop started");

    // Bot listener, when enabled
    let poller = match config.bot {
        Some(ref bot_config) if bot_config.enabled => {
            let telegram_config = config
                .telegram
                .as_ref()
                .context("Bot listener enabled but telegram is not configured")?;
            let source = Arc::new(
                TelegramUpdateSource::new(telegram_config)
                    .context("Failed to create telegram update source")?,
            ) as Arc<dyn UpdateSource>;
            let poller = Arc::new(UpdatePoller::new(
                source,
                orchestrator.clone(),
                bot_config,
            ));
            poller.spawn();
            info!("Bot update poller started");
            Some(poller)
        }
        _ => {
            info!("Bot listener disabled");
            None
        }
    };

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        orchestrator,
        Arc::clone(&scheduler),
        idea_store,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    scheduler.shutdown();
    if let Some(ref poller) = poller {
        poller.shutdown();
    }
    pool.stop();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
