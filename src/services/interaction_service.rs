//! Optional in-game objects: the star guide, the character profiles and the request form.
//!
//! Flags live in the durable store only. The request form is also treated as open as soon as
//! the cached state shows the last star delivered, so the player does not wait for the
//! activation to be written back. Guide entries and profiles come from the configuration.

use std::{sync::Arc, time::SystemTime};

use tracing::info;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        game_store::QuestStore,
        models::{InteractionEntity, InteractiveObjectEntity},
    },
    error::ServiceError,
    services::{
        dialogue::{DialogueLine, DialogueProvider},
        write_worker::{AsyncWriteWorker, WriteTask},
    },
    state::{
        cache::StateCache,
        stage::{InteractiveObjectType, StarType},
    },
};

/// Flags of one object as seen by a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStatus {
    /// Catalog identifier of the object.
    pub object_id: u32,
    /// Kind of object.
    pub object_type: InteractiveObjectType,
    /// Whether the player used it at least once.
    pub has_interacted: bool,
    /// Whether it can be used right now.
    pub is_active: bool,
    /// Last use, if any.
    pub interacted_at: Option<SystemTime>,
}

/// Star guide entries shown per page.
pub const STAR_GUIDE_PAGE_SIZE: usize = 4;

/// Star guide entry with its position in the guide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarGuideItem {
    /// 1-based position in the whole guide.
    pub entry_id: usize,
    /// Name of the star.
    pub name: String,
    /// Feeling the star was born from.
    pub source: String,
    /// Entry text.
    pub description: String,
}

/// One page of the star guide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarGuidePage {
    /// Dialogue shown when the guide opens; empty when not requested.
    pub dialogues: Vec<DialogueLine>,
    /// Entries of this page.
    pub entries: Vec<StarGuideItem>,
    /// Number of pages in the guide.
    pub total_pages: usize,
    /// Page returned, after clamping.
    pub current_page: usize,
}

/// Profile of one selectable character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterProfile {
    /// 1-based position in the roster.
    pub npc_id: usize,
    /// Display name.
    pub name: String,
    /// Star the character is associated with.
    pub star: StarType,
    /// Profile text.
    pub description: String,
}

/// Character profile page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterProfiles {
    /// Dialogue shown when the page opens.
    pub dialogues: Vec<DialogueLine>,
    /// Every character of the roster.
    pub profiles: Vec<CharacterProfile>,
}

/// Reads interaction flags and schedules their updates.
#[derive(Clone)]
pub struct InteractionService {
    cache: Arc<dyn StateCache>,
    store: Arc<dyn QuestStore>,
    writer: AsyncWriteWorker,
    dialogues: Arc<dyn DialogueProvider>,
    config: Arc<AppConfig>,
}

impl InteractionService {
    /// Service reading from `store` and writing through `writer`.
    pub fn new(
        cache: Arc<dyn StateCache>,
        store: Arc<dyn QuestStore>,
        writer: AsyncWriteWorker,
        dialogues: Arc<dyn DialogueProvider>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            cache,
            store,
            writer,
            dialogues,
            config,
        }
    }

    /// Page `page` of the star guide, clamped into range.
    ///
    /// Opening the guide, the first page with its dialogue, is recorded as a use in the
    /// background.
    pub fn star_guide(
        &self,
        player_id: Uuid,
        page: i64,
        include_dialogues: bool,
    ) -> StarGuidePage {
        if page <= 0 && include_dialogues {
            self.writer.submit(
                player_id,
                WriteTask::RecordInteraction(InteractiveObjectType::StarGuide),
            );
        }

        let guide = self.config.star_guide();
        let total_pages = guide.len().div_ceil(STAR_GUIDE_PAGE_SIZE);
        let last_page = total_pages.saturating_sub(1);
        let current_page = usize::try_from(page).unwrap_or(0).min(last_page);

        let entries = guide
            .iter()
            .enumerate()
            .skip(current_page * STAR_GUIDE_PAGE_SIZE)
            .take(STAR_GUIDE_PAGE_SIZE)
            .map(|(index, entry)| StarGuideItem {
                entry_id: index + 1,
                name: entry.name.clone(),
                source: entry.source.clone(),
                description: entry.description.clone(),
            })
            .collect();

        let dialogues = if include_dialogues {
            self.dialogues.for_type("star_guide", player_id)
        } else {
            Vec::new()
        };

        StarGuidePage {
            dialogues,
            entries,
            total_pages,
            current_page,
        }
    }

    /// Profiles of every character; recorded as a use in the background.
    pub fn character_profiles(&self, player_id: Uuid) -> CharacterProfiles {
        self.writer.submit(
            player_id,
            WriteTask::RecordInteraction(InteractiveObjectType::CharacterProfile),
        );

        let profiles = self
            .config
            .npcs()
            .iter()
            .enumerate()
            .map(|(index, npc)| CharacterProfile {
                npc_id: index + 1,
                name: npc.name.clone(),
                star: npc.star,
                description: npc.description.clone(),
            })
            .collect();

        CharacterProfiles {
            dialogues: self.dialogues.for_type("character_profile", player_id),
            profiles,
        }
    }

    /// Flags of every catalog object for `player_id`.
    ///
    /// Objects the player has no row for report their starting flags.
    pub async fn object_status(&self, player_id: Uuid) -> Result<Vec<ObjectStatus>, ServiceError> {
        let objects = self.store.list_objects().await?;
        let mut statuses = Vec::with_capacity(objects.len());
        for object in objects {
            statuses.push(self.status_of(player_id, &object).await?);
        }
        Ok(statuses)
    }

    /// Use `object_type`. The request form goes through [`InteractionService::open_request_form`].
    pub async fn record_interaction(
        &self,
        player_id: Uuid,
        object_type: InteractiveObjectType,
    ) -> Result<ObjectStatus, ServiceError> {
        if object_type == InteractiveObjectType::RequestForm {
            return self.open_request_form(player_id).await;
        }

        let object = self.find_object(object_type).await?;
        let status = self.status_of(player_id, &object).await?;
        if !status.is_active {
            return Err(ServiceError::InvalidState(format!(
                "{object_type:?} is not active"
            )));
        }

        self.writer
            .submit(player_id, WriteTask::RecordInteraction(object_type));
        info!(%player_id, object = ?object_type, "object used");
        Ok(used(status))
    }

    /// Open the request form; `InvalidState` until the last star has been delivered.
    pub async fn open_request_form(&self, player_id: Uuid) -> Result<ObjectStatus, ServiceError> {
        let object = self.find_object(InteractiveObjectType::RequestForm).await?;
        let status = self.status_of(player_id, &object).await?;
        if !status.is_active {
            return Err(ServiceError::InvalidState(
                "request form is not active".into(),
            ));
        }

        self.writer.submit(
            player_id,
            WriteTask::RecordInteraction(InteractiveObjectType::RequestForm),
        );
        info!(%player_id, "request form opened");
        Ok(used(status))
    }

    async fn find_object(
        &self,
        object_type: InteractiveObjectType,
    ) -> Result<InteractiveObjectEntity, ServiceError> {
        self.store
            .find_object_by_type(object_type)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("interactive object {object_type:?}")))
    }

    async fn status_of(
        &self,
        player_id: Uuid,
        object: &InteractiveObjectEntity,
    ) -> Result<ObjectStatus, ServiceError> {
        let flags = self
            .store
            .find_interaction(player_id, object.id)
            .await?
            .unwrap_or_else(|| {
                InteractionEntity::fresh(player_id, object.id, object.object_type.starts_active())
            });

        let unlocked_in_cache = object.object_type == InteractiveObjectType::RequestForm
            && self.cache.get(player_id).is_some_and(|state| {
                StarType::ALL
                    .iter()
                    .filter(|star| star.completes_set())
                    .all(|star| state.is_delivered(*star))
            });

        Ok(ObjectStatus {
            object_id: object.id,
            object_type: object.object_type,
            has_interacted: flags.has_interacted,
            is_active: flags.is_active || unlocked_in_cache,
            interacted_at: flags.interacted_at,
        })
    }
}

fn used(status: ObjectStatus) -> ObjectStatus {
    ObjectStatus {
        has_interacted: true,
        interacted_at: Some(SystemTime::now()),
        ..status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::game_store::{InteractionStore, memory::MemoryQuestStore},
        services::{
            dialogue::CatalogDialogueProvider, mailer::LogEmailSender,
            write_worker::QueuedExecutor,
        },
        state::{cache::DashMapStateCache, stage::GameStage},
    };

    struct Fixture {
        service: InteractionService,
        store: MemoryQuestStore,
        cache: Arc<DashMapStateCache>,
        executor: Arc<QueuedExecutor>,
    }

    fn fixture() -> Fixture {
        let store = MemoryQuestStore::new();
        let cache = Arc::new(DashMapStateCache::new());
        let executor = Arc::new(QueuedExecutor::new());
        let writer = AsyncWriteWorker::new(
            Arc::new(store.clone()),
            executor.clone(),
            Arc::new(LogEmailSender),
        );
        let config = Arc::new(AppConfig::default());
        Fixture {
            service: InteractionService::new(
                cache.clone(),
                Arc::new(store.clone()),
                writer,
                Arc::new(CatalogDialogueProvider::from_config(&config)),
                config,
            ),
            store,
            cache,
            executor,
        }
    }

    #[tokio::test]
    async fn unknown_player_sees_starting_flags() {
        let fx = fixture();

        let statuses = fx.service.object_status(Uuid::new_v4()).await.unwrap();

        assert_eq!(statuses.len(), InteractiveObjectType::ALL.len());
        for status in statuses {
            assert!(!status.has_interacted);
            assert_eq!(status.is_active, status.object_type.starts_active());
        }
    }

    #[tokio::test]
    async fn guide_use_is_written_back() {
        let fx = fixture();
        let player = Uuid::new_v4();

        let status = fx
            .service
            .record_interaction(player, InteractiveObjectType::StarGuide)
            .await
            .unwrap();
        assert!(status.has_interacted);
        assert_eq!(fx.store.interaction_writes(), 0);

        fx.executor.run_pending().await;
        let stored = fx
            .store
            .find_interaction(player, status.object_id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.has_interacted);
    }

    #[tokio::test]
    async fn request_form_is_locked_until_last_delivery() {
        let fx = fixture();
        let player = Uuid::new_v4();
        fx.cache.update_stage(player, GameStage::CollectSad);

        let err = fx.service.open_request_form(player).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(fx.executor.pending(), 0);

        fx.cache.update_star_state(player, StarType::Sad, true, true);
        let status = fx
            .service
            .record_interaction(player, InteractiveObjectType::RequestForm)
            .await
            .unwrap();
        assert!(status.is_active);
        assert_eq!(fx.executor.pending(), 1);
    }

    #[tokio::test]
    async fn star_guide_pages_are_clamped() {
        let fx = fixture();
        let player = Uuid::new_v4();
        let total = AppConfig::default().star_guide().len();
        let last = total.div_ceil(STAR_GUIDE_PAGE_SIZE) - 1;

        let first = fx.service.star_guide(player, 0, true);
        assert_eq!(first.current_page, 0);
        assert_eq!(first.entries.len(), STAR_GUIDE_PAGE_SIZE);
        assert_eq!(first.entries[0].entry_id, 1);
        assert!(!first.dialogues.is_empty());

        let below = fx.service.star_guide(player, -3, false);
        assert_eq!(below.current_page, 0);
        assert!(below.dialogues.is_empty());

        let beyond = fx.service.star_guide(player, 99, false);
        assert_eq!(beyond.current_page, last);
        assert_eq!(beyond.total_pages, last + 1);
        assert_eq!(
            beyond.entries.last().map(|entry| entry.entry_id),
            Some(total)
        );
    }

    #[tokio::test]
    async fn opening_the_star_guide_is_recorded() {
        let fx = fixture();
        let player = Uuid::new_v4();

        fx.service.star_guide(player, 1, false);
        assert_eq!(fx.executor.pending(), 0);

        fx.service.star_guide(player, 0, true);
        assert_eq!(fx.executor.pending(), 1);
        fx.executor.run_pending().await;

        let stored = fx.store.find_interaction(player, 1).await.unwrap().unwrap();
        assert!(stored.has_interacted);
    }

    #[tokio::test]
    async fn character_profiles_list_the_roster_and_record_the_use() {
        let fx = fixture();
        let player = Uuid::new_v4();

        let page = fx.service.character_profiles(player);

        let names: Vec<_> = page.profiles.iter().map(|profile| profile.name.as_str()).collect();
        assert_eq!(names, ["어린왕자", "장미", "여우", "바오밥"]);
        assert!(page.profiles.iter().all(|profile| !profile.description.is_empty()));
        assert!(!page.dialogues.is_empty());

        fx.executor.run_pending().await;
        let stored = fx.store.find_interaction(player, 2).await.unwrap().unwrap();
        assert!(stored.has_interacted);
    }
}
