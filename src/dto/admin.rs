//! DTO definitions used by the admin cache routes.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    cache::CachedPlayerState,
    stage::{GameStage, StarType},
};

/// Number of players in the state cache.
#[derive(Debug, Serialize, ToSchema)]
pub struct CacheSizeResponse {
    pub size: usize,
}

/// Cached state of one player, when present.
#[derive(Debug, Serialize, ToSchema)]
pub struct CacheEntryResponse {
    pub player_id: Uuid,
    pub cached: bool,
    pub stage: Option<GameStage>,
    pub collected: Vec<StarType>,
    pub delivered: Vec<StarType>,
}

impl CacheEntryResponse {
    /// Build the response from a cache lookup.
    pub fn new(player_id: Uuid, state: Option<CachedPlayerState>) -> Self {
        match state {
            Some(state) => Self {
                player_id,
                cached: true,
                stage: Some(state.stage),
                collected: state.collected.stars(),
                delivered: state.delivered.stars(),
            },
            None => Self {
                player_id,
                cached: false,
                stage: None,
                collected: Vec::new(),
                delivered: Vec::new(),
            },
        }
    }
}

/// Outcome of dropping a player from the cache.
#[derive(Debug, Serialize, ToSchema)]
pub struct CacheClearResponse {
    pub player_id: Uuid,
    /// Whether an entry existed.
    pub cleared: bool,
}
