//! Background write-back of player actions to the durable store.
//!
//! The cache has already been updated when a [`WriteTask`] is submitted. Tasks re-check the
//! durable records, persist them and log the outcome. Failures stay inside the task: nothing is
//! retried and the cache is not rolled back, the next successful write for the player brings the
//! store up to date again.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::SystemTime,
};

use futures::future::BoxFuture;
use tokio::sync::{Notify, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::QuestStore,
        models::{CollectionEntity, CompletionEntity, InteractionEntity, ProgressEntity},
    },
    error::ServiceError,
    services::mailer::{CompletionEmail, EmailSender},
    state::stage::{GameStage, InteractiveObjectType, StarType},
};

/// Work handed to a [`TaskExecutor`].
pub type TaskFuture = BoxFuture<'static, Result<(), ServiceError>>;

/// Runs background tasks off the caller's path.
///
/// Implementations must never surface a task failure to the submitter.
pub trait TaskExecutor: Send + Sync {
    /// Schedule `task`; `label` and `player_id` identify it in logs.
    fn submit(&self, label: &'static str, player_id: Uuid, task: TaskFuture);
}

/// Await `task` and log how it ended.
async fn run_logged(label: &'static str, player_id: Uuid, task: TaskFuture) {
    debug!(task = label, %player_id, "background task started");
    match task.await {
        Ok(()) => debug!(task = label, %player_id, "background task finished"),
        Err(err) => error!(task = label, %player_id, error = %err, "background task failed"),
    }
}

/// [`TaskExecutor`] spawning each task on the Tokio runtime, at most `max_concurrency` at once.
#[derive(Clone)]
pub struct TokioExecutor {
    permits: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

impl TokioExecutor {
    /// Executor allowing `max_concurrency` tasks to run at the same time.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            in_flight: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        }
    }

    /// Number of submitted tasks not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Resolve once every submitted task has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl TaskExecutor for TokioExecutor {
    fn submit(&self, label: &'static str, player_id: Uuid, task: TaskFuture) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard {
            in_flight: self.in_flight.clone(),
            idle: self.idle.clone(),
        };
        let permits = self.permits.clone();

        tokio::spawn(async move {
            let _guard = guard;
            let Ok(_permit) = permits.acquire_owned().await else {
                warn!(task = label, %player_id, "executor closed; dropping background task");
                return;
            };
            run_logged(label, player_id, task).await;
        });
    }
}

/// [`TaskExecutor`] that queues tasks until [`QueuedExecutor::run_pending`] is called.
///
/// Lets callers observe the state between a player action and its write-back.
#[derive(Default)]
pub struct QueuedExecutor {
    queue: Mutex<VecDeque<(&'static str, Uuid, TaskFuture)>>,
}

impl QueuedExecutor {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.lock().map(|queue| queue.len()).unwrap_or_default()
    }

    /// Run queued tasks in submission order until the queue is empty, returning how many ran.
    pub async fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = match self.queue.lock() {
                Ok(mut queue) => queue.pop_front(),
                Err(_) => None,
            };
            let Some((label, player_id, task)) = next else {
                return ran;
            };
            run_logged(label, player_id, task).await;
            ran += 1;
        }
    }
}

impl TaskExecutor for QueuedExecutor {
    fn submit(&self, label: &'static str, player_id: Uuid, task: TaskFuture) {
        match self.queue.lock() {
            Ok(mut queue) => queue.push_back((label, player_id, task)),
            Err(_) => error!(task = label, %player_id, "task queue poisoned; dropping task"),
        }
    }
}

/// Durable mutation deferred after a player action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteTask {
    /// Reset progress, collection records and interaction flags for a new run.
    InitializeGame,
    /// Persist a stage change.
    UpdateStage(GameStage),
    /// Persist a star pickup and the stage it led to.
    CollectStar {
        /// Star picked up.
        star: StarType,
        /// Stage reached.
        stage: GameStage,
    },
    /// Persist a star delivery and the stage it led to.
    DeliverStar {
        /// Star handed over.
        star: StarType,
        /// Stage reached.
        stage: GameStage,
    },
    /// Record a use of an interactive object.
    RecordInteraction(InteractiveObjectType),
    /// Send the completion letter.
    SendCompletionEmail(CompletionEmail),
}

impl WriteTask {
    /// Name used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            WriteTask::InitializeGame => "initialize_game",
            WriteTask::UpdateStage(_) => "update_stage",
            WriteTask::CollectStar { .. } => "collect_star",
            WriteTask::DeliverStar { .. } => "deliver_star",
            WriteTask::RecordInteraction(_) => "record_interaction",
            WriteTask::SendCompletionEmail(_) => "send_completion_email",
        }
    }
}

/// Turns [`WriteTask`]s into store writes and hands them to a [`TaskExecutor`].
#[derive(Clone)]
pub struct AsyncWriteWorker {
    store: Arc<dyn QuestStore>,
    executor: Arc<dyn TaskExecutor>,
    mailer: Arc<dyn EmailSender>,
}

impl AsyncWriteWorker {
    /// Worker writing to `store` through `executor`.
    pub fn new(
        store: Arc<dyn QuestStore>,
        executor: Arc<dyn TaskExecutor>,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            store,
            executor,
            mailer,
        }
    }

    /// Schedule `task` for `player_id`. Returns immediately.
    pub fn submit(&self, player_id: Uuid, task: WriteTask) {
        let label = task.label();
        let worker = self.clone();
        self.executor.submit(
            label,
            player_id,
            Box::pin(async move { worker.execute(player_id, task).await }),
        );
    }

    /// Run `task` to completion on the current task.
    pub async fn execute(&self, player_id: Uuid, task: WriteTask) -> Result<(), ServiceError> {
        match task {
            WriteTask::InitializeGame => self.initialize_game(player_id).await,
            WriteTask::UpdateStage(stage) => self.persist_stage(player_id, stage).await,
            WriteTask::CollectStar { star, stage } => {
                self.collect_star(player_id, star, stage).await
            }
            WriteTask::DeliverStar { star, stage } => {
                self.deliver_star(player_id, star, stage).await
            }
            WriteTask::RecordInteraction(object_type) => {
                self.record_interaction(player_id, object_type).await
            }
            WriteTask::SendCompletionEmail(email) => self.send_completion_email(email).await,
        }
    }

    async fn initialize_game(&self, player_id: Uuid) -> Result<(), ServiceError> {
        self.store
            .save_progress(ProgressEntity::new(player_id, GameStage::GameStart))
            .await?;

        for star in StarType::ALL {
            self.store
                .save_collection(CollectionEntity::fresh(player_id, star))
                .await?;
        }

        for object in self.store.list_objects().await? {
            let flags = InteractionEntity::fresh(
                player_id,
                object.id,
                object.object_type.starts_active(),
            );
            self.store.save_interaction(flags).await?;
        }

        info!(%player_id, "game records initialized");
        Ok(())
    }

    async fn persist_stage(&self, player_id: Uuid, stage: GameStage) -> Result<(), ServiceError> {
        let progress = self
            .store
            .find_progress(player_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("progress of player {player_id}")))?;

        self.store.save_progress(progress.with_stage(stage)).await?;
        debug!(%player_id, stage = ?stage, "stage persisted");
        Ok(())
    }

    async fn load_record(
        &self,
        player_id: Uuid,
        star: StarType,
    ) -> Result<CollectionEntity, ServiceError> {
        self.store
            .find_collection(player_id, star)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("{star:?} record of player {player_id}"))
            })
    }

    async fn collect_star(
        &self,
        player_id: Uuid,
        star: StarType,
        stage: GameStage,
    ) -> Result<(), ServiceError> {
        let record = self.load_record(player_id, star).await?;
        let now = SystemTime::now();

        let updated = if star.is_repeatable() {
            record.mark_delivered(now)
        } else if record.collected {
            return Err(ServiceError::InvalidState(format!(
                "{star:?} star already collected"
            )));
        } else {
            record.mark_collected(now)
        };

        self.store.save_collection(updated).await?;
        self.persist_stage(player_id, stage).await
    }

    async fn deliver_star(
        &self,
        player_id: Uuid,
        star: StarType,
        stage: GameStage,
    ) -> Result<(), ServiceError> {
        let record = self.load_record(player_id, star).await?;

        if !record.collected {
            return Err(ServiceError::InvalidState(format!(
                "{star:?} star must be collected before delivery"
            )));
        }
        if record.delivered && !star.is_repeatable() {
            return Err(ServiceError::InvalidState(format!(
                "{star:?} star already delivered"
            )));
        }

        if !record.delivered {
            self.store
                .save_collection(record.mark_delivered(SystemTime::now()))
                .await?;
        }
        self.persist_stage(player_id, stage).await?;

        if star.completes_set() {
            self.activate_request_form(player_id).await?;
        }
        Ok(())
    }

    async fn activate_request_form(&self, player_id: Uuid) -> Result<(), ServiceError> {
        let form = self
            .store
            .find_object_by_type(InteractiveObjectType::RequestForm)
            .await?
            .ok_or_else(|| ServiceError::NotFound("request form object".into()))?;

        let flags = match self.store.find_interaction(player_id, form.id).await? {
            Some(flags) if flags.is_active => {
                debug!(%player_id, "request form already active");
                return Ok(());
            }
            Some(flags) => flags.activated(),
            None => InteractionEntity::fresh(player_id, form.id, true),
        };

        self.store.save_interaction(flags).await?;
        info!(%player_id, "request form activated");
        Ok(())
    }

    async fn record_interaction(
        &self,
        player_id: Uuid,
        object_type: InteractiveObjectType,
    ) -> Result<(), ServiceError> {
        let object = self
            .store
            .find_object_by_type(object_type)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("interactive object {object_type:?}")))?;

        let flags = self
            .store
            .find_interaction(player_id, object.id)
            .await?
            .unwrap_or_else(|| {
                InteractionEntity::fresh(player_id, object.id, object_type.starts_active())
            });

        self.store
            .save_interaction(flags.interacted(SystemTime::now()))
            .await?;
        Ok(())
    }

    /// Send the letter and log the attempt, whatever its outcome.
    async fn send_completion_email(&self, email: CompletionEmail) -> Result<(), ServiceError> {
        let player_id = email.player_id;
        let record = CompletionEntity::sent(
            player_id,
            email.recipient.clone(),
            email.concern.clone(),
            email.npc_name.clone(),
            email.subject(),
        );

        let outcome = self.mailer.send(email).await;
        let record = match &outcome {
            Ok(()) => record,
            Err(err) => record.failed(err.to_string()),
        };
        let recipient = record.email.clone();
        let saved = self.store.save_completion(record).await;
        if let Err(err) = &saved {
            warn!(%player_id, error = %err, "failed to record completion letter");
        }

        outcome.map_err(|err| ServiceError::Downstream(format!("completion email: {err}")))?;
        info!(%player_id, %recipient, "completion email sent");
        saved?;
        Ok(())
    }
}
