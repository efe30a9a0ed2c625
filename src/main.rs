//! Star quest backend entrypoint wiring the REST layer, the state cache and the quest store.

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;
use star_quest_back::{
    config::AppConfig,
    dao::game_store::{QuestStore, memory::MemoryQuestStore},
    routes,
    services::{
        mailer::{EmailSender, LogEmailSender},
        write_worker::TokioExecutor,
    },
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Longest wait for queued write-backs once the server stopped accepting requests.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(AppConfig::load());
    let executor = TokioExecutor::new(config.write_workers());
    let app_state = AppState::new(config, Arc::new(executor.clone()), build_mailer());

    start_store(app_state.clone()).await?;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    info!(pending = executor.in_flight(), "draining background writes");
    if tokio::time::timeout(DRAIN_TIMEOUT, executor.wait_idle())
        .await
        .is_err()
    {
        warn!(
            pending = executor.in_flight(),
            "background writes still running at shutdown"
        );
    }

    Ok(())
}

/// Mail relay from `MAIL_WEBHOOK_URL`, or a sender that only logs.
#[cfg(feature = "http-mailer")]
fn build_mailer() -> Arc<dyn EmailSender> {
    use star_quest_back::services::mailer::WebhookEmailSender;

    let Ok(url) = env::var("MAIL_WEBHOOK_URL") else {
        return Arc::new(LogEmailSender);
    };
    match WebhookEmailSender::new(url) {
        Ok(sender) => {
            info!("completion emails go through the mail webhook");
            Arc::new(sender)
        }
        Err(err) => {
            warn!(error = %err, "mail webhook unusable; logging emails instead");
            Arc::new(LogEmailSender)
        }
    }
}

#[cfg(not(feature = "http-mailer"))]
fn build_mailer() -> Arc<dyn EmailSender> {
    Arc::new(LogEmailSender)
}

/// Install the store selected by `STORE_BACKEND`.
///
/// The in-memory store is installed right away; MongoDB is connected by the storage supervisor
/// in the background, the server answering in degraded mode until then.
async fn start_store(state: SharedState) -> anyhow::Result<()> {
    let default_backend = if cfg!(feature = "mongo-store") {
        "mongo"
    } else {
        "memory"
    };
    let backend = env::var("STORE_BACKEND").unwrap_or_else(|_| default_backend.into());

    match backend.as_str() {
        "memory" => {
            info!("using the in-memory quest store");
            let store: Arc<dyn QuestStore> = Arc::new(MemoryQuestStore::new());
            state.set_game_store(store).await;
            Ok(())
        }
        #[cfg(feature = "mongo-store")]
        "mongo" => {
            tokio::spawn(run_mongo_supervisor(state));
            Ok(())
        }
        other => anyhow::bail!("unsupported STORE_BACKEND `{other}`"),
    }
}

#[cfg(feature = "mongo-store")]
async fn run_mongo_supervisor(state: SharedState) {
    use star_quest_back::dao::{
        game_store::mongodb::{MongoConfig, MongoQuestStore},
        storage::StorageError,
    };

    let uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let db_name = env::var("MONGO_DB").ok();

    star_quest_back::services::storage_supervisor::run(state, move || {
        let uri = uri.clone();
        let db_name = db_name.clone();
        async move {
            let config = MongoConfig::from_uri(&uri, db_name.as_deref())
                .await
                .map_err(StorageError::from)?;
            let store = MongoQuestStore::connect(config)
                .await
                .map_err(StorageError::from)?;
            Ok(Arc::new(store) as Arc<dyn QuestStore>)
        }
    })
    .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
