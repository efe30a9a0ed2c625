//! Process-local [`QuestStore`] used for development runs and tests.
//!
//! Besides the data itself it counts reads and writes per table and can be switched to a failing
//! mode, which lets callers observe cache hits and background write failures.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use dashmap::DashMap;
use futures::future::{self, BoxFuture};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::{
            CollectionStore, CompletionStore, InteractionStore, InteractiveObjectStore,
            ProgressStore, QuestStore,
        },
        models::{
            CollectionEntity, CompletionEntity, InteractionEntity, InteractiveObjectEntity,
            ProgressEntity,
        },
        storage::{StorageError, StorageResult},
    },
    state::stage::{InteractiveObjectType, StarType},
};

/// In-memory quest store.
#[derive(Clone)]
pub struct MemoryQuestStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    progress: DashMap<Uuid, ProgressEntity>,
    collections: DashMap<(Uuid, StarType), CollectionEntity>,
    objects: Vec<InteractiveObjectEntity>,
    interactions: DashMap<(Uuid, u32), InteractionEntity>,
    completions: DashMap<Uuid, CompletionEntity>,
    unavailable: AtomicBool,
    counters: Counters,
}

#[derive(Default)]
struct Counters {
    progress_reads: AtomicUsize,
    progress_writes: AtomicUsize,
    collection_writes: AtomicUsize,
    interaction_writes: AtomicUsize,
    completion_writes: AtomicUsize,
}

impl MemoryQuestStore {
    /// Empty store seeded with the interactive object catalog.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                objects: InteractiveObjectEntity::catalog(),
                ..MemoryInner::default()
            }),
        }
    }

    /// Make every following operation fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of progress lookups served so far.
    pub fn progress_reads(&self) -> usize {
        self.inner.counters.progress_reads.load(Ordering::SeqCst)
    }

    /// Number of progress rows written so far.
    pub fn progress_writes(&self) -> usize {
        self.inner.counters.progress_writes.load(Ordering::SeqCst)
    }

    /// Number of collection records written so far.
    pub fn collection_writes(&self) -> usize {
        self.inner.counters.collection_writes.load(Ordering::SeqCst)
    }

    /// Number of interaction rows written so far.
    pub fn interaction_writes(&self) -> usize {
        self.inner.counters.interaction_writes.load(Ordering::SeqCst)
    }

    /// Number of completion records written so far.
    pub fn completion_writes(&self) -> usize {
        self.inner.counters.completion_writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                "memory store switched off".into(),
                io::Error::new(io::ErrorKind::NotConnected, "store unavailable"),
            ));
        }
        Ok(())
    }

    fn ready<T: Send + 'static>(
        &self,
        produce: impl FnOnce(&MemoryInner) -> T,
    ) -> BoxFuture<'static, StorageResult<T>> {
        let result = self.check_available().map(|()| produce(self.inner.as_ref()));
        Box::pin(future::ready(result))
    }
}

impl Default for MemoryQuestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore for MemoryQuestStore {
    fn find_progress(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>> {
        self.ready(|inner| {
            inner.counters.progress_reads.fetch_add(1, Ordering::SeqCst);
            inner.progress.get(&player_id).map(|entry| entry.clone())
        })
    }

    fn save_progress(&self, progress: ProgressEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.ready(|inner| {
            inner.counters.progress_writes.fetch_add(1, Ordering::SeqCst);
            inner.progress.insert(progress.player_id, progress);
        })
    }
}

impl CollectionStore for MemoryQuestStore {
    fn find_collection(
        &self,
        player_id: Uuid,
        star: StarType,
    ) -> BoxFuture<'static, StorageResult<Option<CollectionEntity>>> {
        self.ready(|inner| {
            inner
                .collections
                .get(&(player_id, star))
                .map(|entry| entry.clone())
        })
    }

    fn save_collection(&self, record: CollectionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.ready(|inner| {
            inner.counters.collection_writes.fetch_add(1, Ordering::SeqCst);
            inner
                .collections
                .insert((record.player_id, record.star), record);
        })
    }

    fn find_collections(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<CollectionEntity>>> {
        self.ready(|inner| {
            StarType::ALL
                .into_iter()
                .filter_map(|star| {
                    inner
                        .collections
                        .get(&(player_id, star))
                        .map(|entry| entry.clone())
                })
                .collect()
        })
    }
}

impl InteractiveObjectStore for MemoryQuestStore {
    fn find_object_by_type(
        &self,
        object_type: InteractiveObjectType,
    ) -> BoxFuture<'static, StorageResult<Option<InteractiveObjectEntity>>> {
        self.ready(|inner| {
            inner
                .objects
                .iter()
                .find(|object| object.object_type == object_type)
                .cloned()
        })
    }

    fn list_objects(&self) -> BoxFuture<'static, StorageResult<Vec<InteractiveObjectEntity>>> {
        self.ready(|inner| inner.objects.clone())
    }
}

impl InteractionStore for MemoryQuestStore {
    fn find_interaction(
        &self,
        player_id: Uuid,
        object_id: u32,
    ) -> BoxFuture<'static, StorageResult<Option<InteractionEntity>>> {
        self.ready(|inner| {
            inner
                .interactions
                .get(&(player_id, object_id))
                .map(|entry| entry.clone())
        })
    }

    fn save_interaction(
        &self,
        interaction: InteractionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.ready(|inner| {
            inner.counters.interaction_writes.fetch_add(1, Ordering::SeqCst);
            inner
                .interactions
                .insert((interaction.player_id, interaction.object_id), interaction);
        })
    }
}

impl CompletionStore for MemoryQuestStore {
    fn find_completion(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<CompletionEntity>>> {
        self.ready(|inner| inner.completions.get(&player_id).map(|entry| entry.clone()))
    }

    fn save_completion(&self, record: CompletionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.ready(|inner| {
            inner.counters.completion_writes.fetch_add(1, Ordering::SeqCst);
            inner.completions.insert(record.player_id, record);
        })
    }
}

impl QuestStore for MemoryQuestStore {
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.ready(|_| ())
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.ready(|_| ())
    }
}
