use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the store is usable, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_game_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let cached_players = state.cache().size();
    if state.is_degraded().await {
        HealthResponse::degraded(cached_players)
    } else {
        HealthResponse::ok(cached_players)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::game_store::memory::MemoryQuestStore,
        services::{mailer::LogEmailSender, write_worker::QueuedExecutor},
        state::AppState,
    };

    fn state() -> SharedState {
        AppState::new(
            Arc::new(AppConfig::default()),
            Arc::new(QueuedExecutor::new()),
            Arc::new(LogEmailSender),
        )
    }

    #[tokio::test]
    async fn degraded_until_a_store_is_installed() {
        let state = state();
        assert_eq!(health_status(&state).await.status, "degraded");

        state
            .set_game_store(Arc::new(MemoryQuestStore::new()))
            .await;
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.cached_players, 0);
    }
}
