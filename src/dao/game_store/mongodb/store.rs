use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        COLLECTED_STARS_COLLECTION, COMPLETIONS_COLLECTION, INTERACTIONS_COLLECTION,
        MongoCollectionDocument, MongoCompletionDocument, MongoInteractionDocument,
        MongoObjectDocument, MongoProgressDocument, OBJECTS_COLLECTION, PROGRESS_COLLECTION,
        by_player, collection_id, interaction_id, object_id, progress_id,
    },
};
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
        storage::StorageResult,
    },
    state::stage::{InteractiveObjectType, StarType},
};

/// MongoDB-backed [`QuestStore`].
#[derive(Clone)]
pub struct MongoQuestStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.state.read().await.database.clone();

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (_client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        self.state.write().await.database = database;
        Ok(())
    }
}

impl MongoQuestStore {
    /// Connect to MongoDB, ensure indexes and seed the interactive object catalog.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (_client, database) =
            establish_connection(&config.options, &config.database_name).await?;
        info!(database = %config.database_name, "connected to MongoDB");

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        store.seed_objects().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        for collection_name in [COLLECTED_STARS_COLLECTION, INTERACTIONS_COLLECTION] {
            let collection = self
                .collection::<mongodb::bson::Document>(collection_name)
                .await;
            let index = IndexModel::builder()
                .keys(doc! { "player_id": 1 })
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection_name}_player_idx")))
                        .build(),
                )
                .build();

            collection
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: collection_name,
                    index: "player_id",
                    source,
                })?;
        }

        Ok(())
    }

    async fn seed_objects(&self) -> MongoResult<()> {
        let collection = self.objects().await;
        for object in InteractiveObjectEntity::catalog() {
            let object_type = object.object_type;
            let filter = object_id(object.id);
            let document: MongoObjectDocument = object.into();
            collection
                .replace_one(filter, &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::SeedObject {
                    object_type,
                    source,
                })?;
        }
        Ok(())
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    async fn progress(&self) -> Collection<MongoProgressDocument> {
        self.collection(PROGRESS_COLLECTION).await
    }

    async fn collected_stars(&self) -> Collection<MongoCollectionDocument> {
        self.collection(COLLECTED_STARS_COLLECTION).await
    }

    async fn objects(&self) -> Collection<MongoObjectDocument> {
        self.collection(OBJECTS_COLLECTION).await
    }

    async fn interactions(&self) -> Collection<MongoInteractionDocument> {
        self.collection(INTERACTIONS_COLLECTION).await
    }

    async fn completions(&self) -> Collection<MongoCompletionDocument> {
        self.collection(COMPLETIONS_COLLECTION).await
    }

    async fn find_progress(&self, player_id: Uuid) -> MongoResult<Option<ProgressEntity>> {
        self.progress()
            .await
            .find_one(progress_id(player_id))
            .await
            .map_err(|source| MongoDaoError::LoadProgress { player_id, source })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn save_progress(&self, progress: ProgressEntity) -> MongoResult<()> {
        let player_id = progress.player_id;
        let document: MongoProgressDocument = progress.into();
        self.progress()
            .await
            .replace_one(progress_id(player_id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveProgress { player_id, source })?;
        Ok(())
    }

    async fn find_collection(
        &self,
        player_id: Uuid,
        star: StarType,
    ) -> MongoResult<Option<CollectionEntity>> {
        self.collected_stars()
            .await
            .find_one(collection_id(player_id, star))
            .await
            .map_err(|source| MongoDaoError::LoadCollection {
                player_id,
                star,
                source,
            })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn save_collection(&self, record: CollectionEntity) -> MongoResult<()> {
        let (player_id, star) = (record.player_id, record.star);
        let document: MongoCollectionDocument = record.into();
        self.collected_stars()
            .await
            .replace_one(collection_id(player_id, star), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveCollection {
                player_id,
                star,
                source,
            })?;
        Ok(())
    }

    async fn find_collections(&self, player_id: Uuid) -> MongoResult<Vec<CollectionEntity>> {
        let documents: Vec<MongoCollectionDocument> = self
            .collected_stars()
            .await
            .find(by_player(player_id))
            .await
            .map_err(|source| MongoDaoError::ListCollections { player_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListCollections { player_id, source })?;

        let mut records = documents
            .into_iter()
            .map(CollectionEntity::try_from)
            .collect::<MongoResult<Vec<_>>>()?;
        records.sort_by_key(|record| record.star);
        Ok(records)
    }

    async fn list_objects(&self) -> MongoResult<Vec<InteractiveObjectEntity>> {
        let documents: Vec<MongoObjectDocument> = self
            .objects()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::LoadObjects { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadObjects { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_object_by_type(
        &self,
        object_type: InteractiveObjectType,
    ) -> MongoResult<Option<InteractiveObjectEntity>> {
        let objects = self.list_objects().await?;
        Ok(objects
            .into_iter()
            .find(|object| object.object_type == object_type))
    }

    async fn find_interaction(
        &self,
        player_id: Uuid,
        object_id: u32,
    ) -> MongoResult<Option<InteractionEntity>> {
        self.interactions()
            .await
            .find_one(interaction_id(player_id, object_id))
            .await
            .map_err(|source| MongoDaoError::LoadInteraction {
                player_id,
                object_id,
                source,
            })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn save_interaction(&self, interaction: InteractionEntity) -> MongoResult<()> {
        let (player_id, object_id) = (interaction.player_id, interaction.object_id);
        let document: MongoInteractionDocument = interaction.into();
        self.interactions()
            .await
            .replace_one(interaction_id(player_id, object_id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveInteraction {
                player_id,
                object_id,
                source,
            })?;
        Ok(())
    }

    async fn find_completion(&self, player_id: Uuid) -> MongoResult<Option<CompletionEntity>> {
        self.completions()
            .await
            .find_one(progress_id(player_id))
            .await
            .map_err(|source| MongoDaoError::LoadCompletion { player_id, source })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn save_completion(&self, record: CompletionEntity) -> MongoResult<()> {
        let player_id = record.player_id;
        let document: MongoCompletionDocument = record.into();
        self.completions()
            .await
            .replace_one(progress_id(player_id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveCompletion { player_id, source })?;
        Ok(())
    }
}

impl ProgressStore for MongoQuestStore {
    fn find_progress(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ProgressEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_progress(player_id).await.map_err(Into::into) })
    }

    fn save_progress(&self, progress: ProgressEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_progress(progress).await.map_err(Into::into) })
    }
}

impl CollectionStore for MongoQuestStore {
    fn find_collection(
        &self,
        player_id: Uuid,
        star: StarType,
    ) -> BoxFuture<'static, StorageResult<Option<CollectionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_collection(player_id, star)
                .await
                .map_err(Into::into)
        })
    }

    fn save_collection(&self, record: CollectionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_collection(record).await.map_err(Into::into) })
    }

    fn find_collections(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<CollectionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_collections(player_id).await.map_err(Into::into) })
    }
}

impl InteractiveObjectStore for MongoQuestStore {
    fn find_object_by_type(
        &self,
        object_type: InteractiveObjectType,
    ) -> BoxFuture<'static, StorageResult<Option<InteractiveObjectEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_object_by_type(object_type)
                .await
                .map_err(Into::into)
        })
    }

    fn list_objects(&self) -> BoxFuture<'static, StorageResult<Vec<InteractiveObjectEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_objects().await.map_err(Into::into) })
    }
}

impl InteractionStore for MongoQuestStore {
    fn find_interaction(
        &self,
        player_id: Uuid,
        object_id: u32,
    ) -> BoxFuture<'static, StorageResult<Option<InteractionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_interaction(player_id, object_id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_interaction(
        &self,
        interaction: InteractionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_interaction(interaction).await.map_err(Into::into) })
    }
}

impl CompletionStore for MongoQuestStore {
    fn find_completion(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<CompletionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_completion(player_id).await.map_err(Into::into) })
    }

    fn save_completion(&self, record: CompletionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_completion(record).await.map_err(Into::into) })
    }
}

impl QuestStore for MongoQuestStore {
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
