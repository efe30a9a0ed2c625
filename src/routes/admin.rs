use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::admin::{CacheClearResponse, CacheEntryResponse, CacheSizeResponse},
    state::SharedState,
};

/// Inspection of the player state cache.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/cache", get(cache_size))
        .route(
            "/admin/cache/{player_id}",
            get(cache_entry).delete(clear_cache_entry),
        )
}

/// Number of cached players.
#[utoipa::path(
    get,
    path = "/admin/cache",
    tag = "admin",
    responses((status = 200, description = "Cache size", body = CacheSizeResponse))
)]
pub async fn cache_size(State(state): State<SharedState>) -> Json<CacheSizeResponse> {
    Json(CacheSizeResponse {
        size: state.cache().size(),
    })
}

/// Cached state of one player.
#[utoipa::path(
    get,
    path = "/admin/cache/{player_id}",
    tag = "admin",
    params(("player_id" = Uuid, Path, description = "Player identifier")),
    responses((status = 200, description = "Cache entry", body = CacheEntryResponse))
)]
pub async fn cache_entry(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
) -> Json<CacheEntryResponse> {
    Json(CacheEntryResponse::new(
        player_id,
        state.cache().get(player_id),
    ))
}

/// Drop a player from the cache; the next read reloads it from the store.
#[utoipa::path(
    delete,
    path = "/admin/cache/{player_id}",
    tag = "admin",
    params(("player_id" = Uuid, Path, description = "Player identifier")),
    responses((status = 200, description = "Entry dropped", body = CacheClearResponse))
)]
pub async fn clear_cache_entry(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
) -> Json<CacheClearResponse> {
    let cleared = state.cache().clear(player_id);
    info!(%player_id, cleared, "cache entry cleared");
    Json(CacheClearResponse { player_id, cleared })
}
