//! Shared test helpers for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use futures::future::BoxFuture;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use star_quest_back::config::AppConfig;
use star_quest_back::dao::game_store::memory::MemoryQuestStore;
use star_quest_back::routes;
use star_quest_back::services::mailer::{CompletionEmail, EmailSender, MailerError};
use star_quest_back::services::write_worker::QueuedExecutor;
use star_quest_back::state::{AppState, SharedState};

/// Mailer keeping every letter it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<CompletionEmail>>,
    reject: bool,
}

impl RecordingMailer {
    /// Mailer refusing every letter, still recording the attempts.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<CompletionEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl EmailSender for RecordingMailer {
    fn send(&self, email: CompletionEmail) -> BoxFuture<'static, Result<(), MailerError>> {
        self.sent.lock().unwrap().push(email);
        let reject = self.reject;
        Box::pin(async move {
            if reject {
                Err(MailerError::Rejected { status: 502 })
            } else {
                Ok(())
            }
        })
    }
}

/// Application wired to an in-memory store and a queued executor.
pub struct TestApp {
    pub state: SharedState,
    pub store: MemoryQuestStore,
    pub executor: Arc<QueuedExecutor>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_mailer(RecordingMailer::default()).await
    }

    pub async fn with_mailer(mailer: RecordingMailer) -> Self {
        let store = MemoryQuestStore::new();
        let executor = Arc::new(QueuedExecutor::new());
        let mailer = Arc::new(mailer);
        let state = AppState::new(
            Arc::new(AppConfig::default()),
            executor.clone(),
            mailer.clone(),
        );
        state.set_game_store(Arc::new(store.clone())).await;

        Self {
            state,
            store,
            executor,
            mailer,
        }
    }

    /// Application without any store installed.
    pub fn degraded() -> SharedState {
        AppState::new(
            Arc::new(AppConfig::default()),
            Arc::new(QueuedExecutor::new()),
            Arc::new(RecordingMailer::default()),
        )
    }

    pub fn router(&self) -> Router {
        routes::router(self.state.clone())
    }

    /// Run every queued write-back.
    pub async fn flush(&self) -> usize {
        self.executor.run_pending().await
    }
}

/// Request body completing the quest with the fox.
pub fn completion_body() -> serde_json::Value {
    serde_json::json!({
        "email": "player@example.com",
        "concern": "I keep losing my stars.",
        "selected_npc": "여우",
    })
}

pub fn progress_uri(player: Uuid, suffix: &str) -> String {
    format!("/api/v1/game/progress/{player}{suffix}")
}

/// Send a request with an optional JSON body and return the status and JSON response.
pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send_json(app, Method::GET, uri, None).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(app, Method::POST, uri, Some(body)).await
}

pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send_json(app, Method::POST, uri, None).await
}
