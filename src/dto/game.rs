//! Wire types of the game progress routes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::validation::{validate_concern, validate_optional_email},
    services::{
        dialogue::DialogueLine,
        quest_service::{CompletionRequest, StageView},
    },
    state::stage::{GameStage, StarType},
};

/// Body of `PUT /api/v1/game/progress/{player_id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StageUpdateRequest {
    pub new_stage: GameStage,
}

/// Body of the collect and deliver routes.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StarActionRequest {
    pub star_type: StarType,
}

/// Body of `POST /api/v1/game/{player_id}/complete`.
///
/// Missing fields deserialize as blank so the service can report them as unmet preconditions.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompletionRequestBody {
    /// Address the letter is sent to.
    #[serde(default)]
    pub email: String,
    /// Request written by the player.
    #[serde(default)]
    pub concern: Option<String>,
    /// Name of the character answering.
    #[serde(default)]
    pub selected_npc: String,
}

impl Validate for CompletionRequestBody {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_optional_email(&self.email) {
            errors.add("email", e);
        }

        if let Some(ref concern) = self.concern {
            if let Err(e) = validate_concern(concern) {
                errors.add("concern", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<CompletionRequestBody> for CompletionRequest {
    fn from(body: CompletionRequestBody) -> Self {
        Self {
            email: body.email,
            concern: body.concern,
            selected_npc: body.selected_npc,
        }
    }
}

/// Stage of a player with the dialogue to display.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameStageResponse {
    pub player_id: Uuid,
    pub current_stage: GameStage,
    pub dialogues: Vec<DialogueLine>,
}

impl From<StageView> for GameStageResponse {
    fn from(view: StageView) -> Self {
        Self {
            player_id: view.player_id,
            current_stage: view.stage,
            dialogues: view.dialogues,
        }
    }
}

/// Stage only, without dialogue.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentStageResponse {
    pub player_id: Uuid,
    pub current_stage: GameStage,
}
