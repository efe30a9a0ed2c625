pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    CollectionEntity, CompletionEntity, InteractionEntity, InteractiveObjectEntity,
    ProgressEntity,
};
use crate::dao::storage::StorageResult;
use crate::state::stage::{InteractiveObjectType, StarType};
use futures::future::BoxFuture;
use uuid::Uuid;

/// Durable record of each player's stage.
pub trait ProgressStore: Send + Sync {
    /// Progress row of `player_id`, if the player ever started a game.
    fn find_progress(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>>;
    /// Insert or replace the player's progress row.
    fn save_progress(&self, progress: ProgressEntity) -> BoxFuture<'static, StorageResult<()>>;
}

/// Durable per (player, star) collection records.
pub trait CollectionStore: Send + Sync {
    /// Record for one star of a player.
    fn find_collection(
        &self,
        player_id: Uuid,
        star: StarType,
    ) -> BoxFuture<'static, StorageResult<Option<CollectionEntity>>>;
    /// Insert or replace a record, keyed by (player, star).
    fn save_collection(&self, record: CollectionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Every record of a player.
    fn find_collections(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<CollectionEntity>>>;
}

/// Read-only catalog of interactive objects.
pub trait InteractiveObjectStore: Send + Sync {
    /// Object of the given kind.
    fn find_object_by_type(
        &self,
        object_type: InteractiveObjectType,
    ) -> BoxFuture<'static, StorageResult<Option<InteractiveObjectEntity>>>;
    /// Every known object.
    fn list_objects(&self) -> BoxFuture<'static, StorageResult<Vec<InteractiveObjectEntity>>>;
}

/// Durable per (player, object) interaction flags.
pub trait InteractionStore: Send + Sync {
    /// Flags of a player for one object.
    fn find_interaction(
        &self,
        player_id: Uuid,
        object_id: u32,
    ) -> BoxFuture<'static, StorageResult<Option<InteractionEntity>>>;
    /// Insert or replace flags, keyed by (player, object).
    fn save_interaction(
        &self,
        interaction: InteractionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
}

/// Durable log of completion letters, one record per player.
pub trait CompletionStore: Send + Sync {
    /// Completion record of `player_id`, if the player finished the quest.
    fn find_completion(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<CompletionEntity>>>;
    /// Insert or replace the player's completion record.
    fn save_completion(&self, record: CompletionEntity) -> BoxFuture<'static, StorageResult<()>>;
}

/// Complete persistence backend of the quest, with connection supervision hooks.
pub trait QuestStore:
    ProgressStore + CollectionStore + InteractiveObjectStore + InteractionStore + CompletionStore
{
    /// Cheap round-trip proving the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the underlying connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
