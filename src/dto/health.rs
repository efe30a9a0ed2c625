use serde::Serialize;
use utoipa::ToSchema;

/// Payload of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" while a store is installed and reachable, "degraded" otherwise.
    pub status: String,
    /// Players currently held in the state cache.
    pub cached_players: usize,
}

impl HealthResponse {
    /// Store reachable.
    pub fn ok(cached_players: usize) -> Self {
        Self {
            status: "ok".to_string(),
            cached_players,
        }
    }

    /// Running without a usable store; cached players are still served.
    pub fn degraded(cached_players: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            cached_players,
        }
    }
}
