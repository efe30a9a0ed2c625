pub mod cache;
pub mod stage;
pub mod state_machine;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::game_store::QuestStore,
    error::ServiceError,
    services::{
        dialogue::{CatalogDialogueProvider, DialogueProvider},
        interaction_service::InteractionService,
        mailer::EmailSender,
        quest_service::QuestService,
        sync_engine::StateSyncEngine,
        write_worker::{AsyncWriteWorker, TaskExecutor},
    },
};

use self::cache::{DashMapStateCache, StateCache};

/// Cheaply cloneable handle to [`AppState`].
pub type SharedState = Arc<AppState>;

/// Process-wide state shared by every request handler.
pub struct AppState {
    config: Arc<AppConfig>,
    cache: Arc<dyn StateCache>,
    executor: Arc<dyn TaskExecutor>,
    mailer: Arc<dyn EmailSender>,
    dialogues: Arc<dyn DialogueProvider>,
    game_store: RwLock<Option<Arc<dyn QuestStore>>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a quest store is installed.
    pub fn new(
        config: Arc<AppConfig>,
        executor: Arc<dyn TaskExecutor>,
        mailer: Arc<dyn EmailSender>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let dialogues = Arc::new(CatalogDialogueProvider::from_config(&config));
        Arc::new(Self {
            config,
            cache: Arc::new(DashMapStateCache::new()),
            executor,
            mailer,
            dialogues,
            game_store: RwLock::new(None),
            degraded: degraded_tx,
        })
    }

    /// Loaded configuration.
    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    /// In-memory player state.
    pub fn cache(&self) -> &Arc<dyn StateCache> {
        &self.cache
    }

    /// Obtain a handle to the current quest store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn QuestStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current quest store, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_game_store(&self) -> Result<Arc<dyn QuestStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a quest store and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn QuestStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Quest facade bound to the installed store.
    pub async fn quest(&self) -> Result<QuestService, ServiceError> {
        let store = self.require_game_store().await?;
        Ok(QuestService::new(
            StateSyncEngine::new(self.cache.clone(), store.clone()),
            self.writer(store),
            self.dialogues.clone(),
            self.config.clone(),
        ))
    }

    /// Interaction service bound to the installed store.
    pub async fn interactions(&self) -> Result<InteractionService, ServiceError> {
        let store = self.require_game_store().await?;
        Ok(InteractionService::new(
            self.cache.clone(),
            store.clone(),
            self.writer(store),
            self.dialogues.clone(),
            self.config.clone(),
        ))
    }

    fn writer(&self, store: Arc<dyn QuestStore>) -> AsyncWriteWorker {
        AsyncWriteWorker::new(store, self.executor.clone(), self.mailer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::game_store::memory::MemoryQuestStore,
        services::{mailer::LogEmailSender, write_worker::QueuedExecutor},
    };

    fn state() -> SharedState {
        AppState::new(
            Arc::new(AppConfig::default()),
            Arc::new(QueuedExecutor::new()),
            Arc::new(LogEmailSender),
        )
    }

    #[tokio::test]
    async fn services_require_a_store() {
        let state = state();
        assert!(state.is_degraded().await);
        assert!(matches!(state.quest().await, Err(ServiceError::Degraded)));

        state
            .set_game_store(Arc::new(MemoryQuestStore::new()))
            .await;

        assert!(!state.is_degraded().await);
        assert!(state.quest().await.is_ok());
        assert!(state.interactions().await.is_ok());
    }

    #[tokio::test]
    async fn watcher_sees_changes_only() {
        let state = state();
        let mut watcher = state.degraded_watcher();

        state.update_degraded(true).await;
        assert!(!watcher.has_changed().unwrap());

        state.update_degraded(false).await;
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
    }
}
