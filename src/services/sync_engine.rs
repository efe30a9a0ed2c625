//! Cache-aside access to player state.
//!
//! Reads are served from the [`StateCache`] and fall back to the durable store on a miss, which
//! then populates the cache. Writes go to the cache first; persisting them is the job of the
//! write worker.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::game_store::QuestStore,
    error::ServiceError,
    state::{
        cache::{CachedPlayerState, StateCache, StateTransition},
        stage::GameStage,
    },
};

/// Keeps the in-memory state and the durable store in step for reads.
#[derive(Clone)]
pub struct StateSyncEngine {
    cache: Arc<dyn StateCache>,
    store: Arc<dyn QuestStore>,
}

impl StateSyncEngine {
    /// Engine over `cache`, falling back to `store`.
    pub fn new(cache: Arc<dyn StateCache>, store: Arc<dyn QuestStore>) -> Self {
        Self { cache, store }
    }

    /// Durable store behind the cache.
    pub fn store(&self) -> &Arc<dyn QuestStore> {
        &self.store
    }

    /// Stage of `player_id`; `NotFound` when neither cache nor store knows the player.
    pub async fn current_stage(&self, player_id: Uuid) -> Result<GameStage, ServiceError> {
        if let Some(state) = self.cache.get(player_id) {
            return Ok(state.stage);
        }
        Ok(self.hydrate(player_id).await?.stage)
    }

    /// Full cached state of `player_id`, loading it from the store on a miss.
    pub async fn load_state(&self, player_id: Uuid) -> Result<CachedPlayerState, ServiceError> {
        match self.cache.get(player_id) {
            Some(state) => Ok(state),
            None => self.hydrate(player_id).await,
        }
    }

    /// Like [`StateSyncEngine::load_state`], but a player without progress yields `None`.
    pub async fn try_load_state(
        &self,
        player_id: Uuid,
    ) -> Result<Option<CachedPlayerState>, ServiceError> {
        match self.load_state(player_id).await {
            Ok(state) => Ok(Some(state)),
            Err(ServiceError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Make sure the player is cached, then apply `transition` atomically.
    ///
    /// The loaded state seeds the entry again if it was evicted in between.
    pub async fn commit(
        &self,
        player_id: Uuid,
        transition: StateTransition<'_>,
    ) -> Result<CachedPlayerState, ServiceError> {
        let loaded = self.load_state(player_id).await?;
        self.cache.apply_or(player_id, loaded, transition)
    }

    /// Apply `transition` without requiring the player to exist yet.
    pub async fn commit_new(
        &self,
        player_id: Uuid,
        transition: StateTransition<'_>,
    ) -> Result<CachedPlayerState, ServiceError> {
        let loaded = self.try_load_state(player_id).await?.unwrap_or_default();
        self.cache.apply_or(player_id, loaded, transition)
    }

    async fn hydrate(&self, player_id: Uuid) -> Result<CachedPlayerState, ServiceError> {
        let progress = self.store.find_progress(player_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("progress not found for player {player_id}"))
        })?;
        let records = self.store.find_collections(player_id).await?;

        let loaded = records.iter().fold(
            CachedPlayerState::at_stage(progress.current_stage),
            |state, record| state.with_star(record.star, record.collected, record.delivered),
        );

        // A concurrent action may have cached a newer state while the store was read.
        let state = self.cache.populate(player_id, loaded);
        debug!(%player_id, stage = ?state.stage, "player state loaded from store");
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{
            game_store::{CollectionStore, ProgressStore, memory::MemoryQuestStore},
            models::{CollectionEntity, ProgressEntity},
        },
        state::{cache::DashMapStateCache, stage::StarType},
    };

    /// Cache that forgets an entry right after handing it out, like an admin clear landing
    /// between a read and the following update.
    struct EvictOnRead(DashMapStateCache);

    impl StateCache for EvictOnRead {
        fn get(&self, player_id: Uuid) -> Option<CachedPlayerState> {
            let state = self.0.get(player_id);
            self.0.clear(player_id);
            state
        }

        fn put(&self, player_id: Uuid, initial_stage: GameStage) {
            self.0.put(player_id, initial_stage)
        }

        fn populate(&self, player_id: Uuid, state: CachedPlayerState) -> CachedPlayerState {
            let state = self.0.populate(player_id, state);
            self.0.clear(player_id);
            state
        }

        fn apply_or(
            &self,
            player_id: Uuid,
            seed: CachedPlayerState,
            transition: StateTransition<'_>,
        ) -> Result<CachedPlayerState, ServiceError> {
            self.0.apply_or(player_id, seed, transition)
        }

        fn clear(&self, player_id: Uuid) -> bool {
            self.0.clear(player_id)
        }

        fn size(&self) -> usize {
            self.0.size()
        }

        fn contains(&self, player_id: Uuid) -> bool {
            self.0.contains(player_id)
        }
    }

    fn engine(store: &MemoryQuestStore) -> (StateSyncEngine, Arc<DashMapStateCache>) {
        let cache = Arc::new(DashMapStateCache::new());
        (
            StateSyncEngine::new(cache.clone(), Arc::new(store.clone())),
            cache,
        )
    }

    #[tokio::test]
    async fn unknown_player_is_not_found() {
        let store = MemoryQuestStore::new();
        let (engine, cache) = engine(&store);

        let err = engine.current_stage(Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(cache.size(), 0);
    }

    #[tokio::test]
    async fn cold_read_populates_cache_once() {
        let store = MemoryQuestStore::new();
        let (engine, cache) = engine(&store);
        let player = Uuid::new_v4();
        store
            .save_progress(ProgressEntity::new(player, GameStage::DeliverEnvy))
            .await
            .unwrap();

        assert_eq!(engine.current_stage(player).await.unwrap(), GameStage::DeliverEnvy);
        assert_eq!(engine.current_stage(player).await.unwrap(), GameStage::DeliverEnvy);

        assert_eq!(store.progress_reads(), 1);
        assert!(cache.contains(player));
    }

    #[tokio::test]
    async fn hydration_restores_star_flags() {
        let store = MemoryQuestStore::new();
        let (engine, _cache) = engine(&store);
        let player = Uuid::new_v4();
        store
            .save_progress(ProgressEntity::new(player, GameStage::CollectLonely))
            .await
            .unwrap();
        store
            .save_collection(
                CollectionEntity::fresh(player, StarType::Lonely)
                    .mark_collected(std::time::SystemTime::now()),
            )
            .await
            .unwrap();

        let state = engine.load_state(player).await.unwrap();

        assert!(state.is_collected(StarType::Lonely));
        assert!(!state.is_delivered(StarType::Lonely));
        assert!(!state.is_collected(StarType::Sad));
    }

    #[tokio::test]
    async fn store_outage_surfaces_on_cache_miss_only() {
        let store = MemoryQuestStore::new();
        let (engine, cache) = engine(&store);
        let cached = Uuid::new_v4();
        cache.put(cached, GameStage::GameStart);
        store.set_unavailable(true);

        assert_eq!(engine.current_stage(cached).await.unwrap(), GameStage::GameStart);
        assert!(matches!(
            engine.current_stage(Uuid::new_v4()).await,
            Err(ServiceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn commit_keeps_loaded_state_when_entry_is_evicted() {
        let store = MemoryQuestStore::new();
        let player = Uuid::new_v4();
        store
            .save_progress(ProgressEntity::new(player, GameStage::DeliverEnvy))
            .await
            .unwrap();
        store
            .save_collection(
                CollectionEntity::fresh(player, StarType::Envy)
                    .mark_collected(std::time::SystemTime::now()),
            )
            .await
            .unwrap();
        let cache = Arc::new(EvictOnRead(DashMapStateCache::new()));
        let engine = StateSyncEngine::new(cache.clone(), Arc::new(store.clone()));

        let deliver = |state: CachedPlayerState| {
            if state.stage != GameStage::DeliverEnvy || !state.is_collected(StarType::Envy) {
                return Err(ServiceError::InvalidState("Envy star not collected".into()));
            }
            Ok(state
                .with_star(StarType::Envy, true, true)
                .with_stage(GameStage::CollectLonely))
        };
        let state = engine.commit(player, &deliver).await.unwrap();

        assert_eq!(state.stage, GameStage::CollectLonely);
        assert!(state.is_collected(StarType::Envy));
        assert!(state.is_delivered(StarType::Envy));
        assert_eq!(cache.0.get(player), Some(state));
    }
}
