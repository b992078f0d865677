mod auth;
mod config;
mod http;
mod state;

use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::sync::broadcast;
use tracing::info;

use config::Settings;
use engine::{
    DbAccountDirectory, DbActivityFeed, FsDocumentStore, HttpStatSink, ModerationEngine,
    NoopStatSink, PublishGate, PublishService, StatSink,
};
use http::router::build_router;
use state::AppState;
use storage::Db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let db = Db::new(&settings.database.url).await?;

    // 可选的管理员引导，便于空库起步
    if let Some(admin_id) = &settings.security.bootstrap_admin {
        db.upsert_account(admin_id, "admin", chrono::Utc::now().naive_utc(), None)
            .await?;
        info!("Bootstrapped admin account: {}", admin_id);
    }

    let (tx_events, _rx_events) = broadcast::channel(100);

    let docs = Arc::new(FsDocumentStore::new(settings.content.root.clone()));
    let accounts = Arc::new(DbAccountDirectory::new(db.clone()));
    let activity = Arc::new(DbActivityFeed::new(db.clone()));
    let stats: Arc<dyn StatSink> = match &settings.stats.endpoint {
        Some(endpoint) => {
            info!("Stat events forwarded to {}", endpoint);
            Arc::new(HttpStatSink::new(endpoint.clone()))
        }
        None => Arc::new(NoopStatSink),
    };

    let gate = PublishGate::new(docs.clone(), accounts.clone(), activity);
    let publish = Arc::new(PublishService::new(db.clone(), docs, gate));
    let moderation = Arc::new(ModerationEngine::new(
        db.clone(),
        accounts,
        stats,
        tx_events.clone(),
    ));

    let state = AppState {
        db,
        publish,
        moderation,
        tx_events,
        token_secret: settings.security.actor_token_secret.clone(),
    };

    let app = build_router(state, &settings.server.cors_origins);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
