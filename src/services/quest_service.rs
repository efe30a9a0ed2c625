//! Entry point for every player action of the quest.
//!
//! Each action validates and updates the cached state in one step, schedules the matching
//! durable write and answers from the cache, so a player always sees their own action even
//! before it reached the store.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::ServiceError,
    services::{
        dialogue::{DialogueLine, DialogueProvider},
        mailer::CompletionEmail,
        sync_engine::StateSyncEngine,
        write_worker::{AsyncWriteWorker, WriteTask},
    },
    state::{
        cache::CachedPlayerState,
        stage::{GameStage, StarType},
        state_machine::{QuestEvent, next_stage},
    },
};

/// Stage of a player together with the dialogue shown there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    /// Player the view belongs to.
    pub player_id: Uuid,
    /// Stage after the action.
    pub stage: GameStage,
    /// Dialogue of that stage.
    pub dialogues: Vec<DialogueLine>,
}

/// Data submitted to finish the quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Where the letter should be sent.
    pub email: String,
    /// Free-form request written by the player.
    pub concern: Option<String>,
    /// Name of the character answering the request.
    pub selected_npc: String,
}

/// Facade composing stage rules, the cache-aside engine and the write worker.
#[derive(Clone)]
pub struct QuestService {
    engine: StateSyncEngine,
    writer: AsyncWriteWorker,
    dialogues: Arc<dyn DialogueProvider>,
    config: Arc<AppConfig>,
}

impl QuestService {
    /// Assemble the facade.
    pub fn new(
        engine: StateSyncEngine,
        writer: AsyncWriteWorker,
        dialogues: Arc<dyn DialogueProvider>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            engine,
            writer,
            dialogues,
            config,
        }
    }

    /// Enter (or restart) the game: the player is reset to [`GameStage::GameStart`].
    pub async fn start_game(&self, player_id: Uuid) -> Result<StageView, ServiceError> {
        let transition = |state: CachedPlayerState| {
            let stage = next_stage(state.stage, QuestEvent::StartGame)?;
            Ok(CachedPlayerState::at_stage(stage))
        };
        let state = self.engine.commit_new(player_id, &transition).await?;

        self.writer.submit(player_id, WriteTask::InitializeGame);
        info!(%player_id, "game started");
        self.view(player_id, state.stage)
    }

    /// Pick up `star`.
    ///
    /// The pride star is also delivered by this call and may be collected again; any other star
    /// can only be collected once.
    pub async fn collect_star(
        &self,
        player_id: Uuid,
        star: StarType,
    ) -> Result<StageView, ServiceError> {
        let transition = |state: CachedPlayerState| {
            let stage = next_stage(state.stage, QuestEvent::Collect(star))?;
            if star.is_repeatable() {
                return Ok(state.with_star(star, true, true).with_stage(stage));
            }
            if state.is_collected(star) {
                return Err(ServiceError::InvalidState(format!(
                    "{star:?} star already collected"
                )));
            }
            Ok(state.with_star(star, true, false).with_stage(stage))
        };
        let state = self.engine.commit(player_id, &transition).await?;

        self.writer.submit(
            player_id,
            WriteTask::CollectStar {
                star,
                stage: state.stage,
            },
        );
        info!(%player_id, star = ?star, stage = ?state.stage, "star collected");
        self.view(player_id, state.stage)
    }

    /// Hand `star` over. The star must have been collected first.
    pub async fn deliver_star(
        &self,
        player_id: Uuid,
        star: StarType,
    ) -> Result<StageView, ServiceError> {
        let transition = |state: CachedPlayerState| {
            let stage = next_stage(state.stage, QuestEvent::Deliver(star))?;
            if !state.is_collected(star) {
                return Err(ServiceError::InvalidState(format!(
                    "{star:?} star must be collected before delivery"
                )));
            }
            if state.is_delivered(star) && !star.is_repeatable() {
                return Err(ServiceError::InvalidState(format!(
                    "{star:?} star already delivered"
                )));
            }
            Ok(state.with_star(star, true, true).with_stage(stage))
        };
        let state = self.engine.commit(player_id, &transition).await?;

        self.writer.submit(
            player_id,
            WriteTask::DeliverStar {
                star,
                stage: state.stage,
            },
        );
        info!(%player_id, star = ?star, stage = ?state.stage, "star delivered");
        self.view(player_id, state.stage)
    }

    /// Move the player to `new_stage` (used for the stages no star action reaches).
    ///
    /// Moving back to [`GameStage::GameStart`] restarts the run like
    /// [`QuestService::start_game`], clearing every star flag.
    pub async fn update_stage(
        &self,
        player_id: Uuid,
        new_stage: GameStage,
    ) -> Result<StageView, ServiceError> {
        if new_stage == GameStage::GameStart {
            self.engine.load_state(player_id).await?;
            return self.start_game(player_id).await;
        }

        let transition = |state: CachedPlayerState| {
            let stage = next_stage(state.stage, QuestEvent::SetStage(new_stage))?;
            Ok(state.with_stage(stage))
        };
        let state = self.engine.commit(player_id, &transition).await?;

        self.writer
            .submit(player_id, WriteTask::UpdateStage(state.stage));
        info!(%player_id, stage = ?state.stage, "stage updated");
        self.view(player_id, state.stage)
    }

    /// Current stage of the player.
    pub async fn current_stage(&self, player_id: Uuid) -> Result<GameStage, ServiceError> {
        self.engine.current_stage(player_id).await
    }

    /// Current stage of the player with its dialogue.
    pub async fn current_state(&self, player_id: Uuid) -> Result<StageView, ServiceError> {
        let state = self.engine.load_state(player_id).await?;
        self.view(player_id, state.stage)
    }

    /// Finish the quest and send the letter.
    ///
    /// Every star must be collected and delivered in the durable store; the email and the
    /// selected character are checked next. The letter is sent in the background.
    pub async fn complete_game(
        &self,
        player_id: Uuid,
        request: CompletionRequest,
    ) -> Result<StageView, ServiceError> {
        let records = self.engine.store().find_collections(player_id).await?;
        let all_delivered = StarType::ALL.iter().all(|star| {
            records
                .iter()
                .any(|record| record.star == *star && record.is_complete())
        });
        if !all_delivered {
            return Err(ServiceError::PreconditionFailed(
                "every star must be collected and delivered before completing the game".into(),
            ));
        }

        let email = request.email.trim();
        if email.is_empty() {
            return Err(ServiceError::PreconditionFailed("email is required".into()));
        }
        let npc_name = request.selected_npc.trim();
        if npc_name.is_empty() {
            return Err(ServiceError::PreconditionFailed(
                "a character must be selected".into(),
            ));
        }
        let npc = self
            .config
            .find_npc(npc_name)
            .ok_or_else(|| ServiceError::InvalidInput(format!("unknown character `{npc_name}`")))?;

        let transition = |state: CachedPlayerState| {
            let stage = next_stage(state.stage, QuestEvent::Complete)?;
            Ok(state.with_stage(stage))
        };
        let state = self.engine.commit(player_id, &transition).await?;

        self.writer
            .submit(player_id, WriteTask::UpdateStage(state.stage));
        self.writer.submit(
            player_id,
            WriteTask::SendCompletionEmail(CompletionEmail {
                player_id,
                recipient: email.to_owned(),
                sender: npc.sender_email.clone(),
                npc_name: npc.name.clone(),
                star: npc.star,
                concern: request
                    .concern
                    .map(|concern| concern.trim().to_owned())
                    .filter(|concern| !concern.is_empty()),
            }),
        );
        info!(%player_id, npc = %npc.name, "game completed");
        self.view(player_id, state.stage)
    }

    fn view(&self, player_id: Uuid, stage: GameStage) -> Result<StageView, ServiceError> {
        let dialogues = self.dialogues.for_stage(stage, player_id)?;
        Ok(StageView {
            player_id,
            stage,
            dialogues,
        })
    }
}
