//! Dialogue lookup used to enrich stage responses.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{config::AppConfig, error::ServiceError, state::stage::GameStage};

/// One line of dialogue returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DialogueLine {
    /// Who speaks the line.
    pub speaker: String,
    /// Line content.
    pub text: String,
}

/// Source of the dialogue shown at each stage.
pub trait DialogueProvider: Send + Sync {
    /// Lines for `stage`; `NotFound` when the stage has none.
    fn for_stage(&self, stage: GameStage, player_id: Uuid) -> Result<Vec<DialogueLine>, ServiceError>;

    /// Lines of dialogue type `kind`, empty when the catalog has none.
    fn for_type(&self, kind: &str, player_id: Uuid) -> Vec<DialogueLine>;
}

/// Dialogue type attached to a stage, if the stage shows any dialogue.
pub fn dialogue_type(stage: GameStage) -> Option<&'static str> {
    let kind = match stage {
        GameStage::GameStart => "tutorial",
        GameStage::CollectPride => "click_pride",
        GameStage::CollectEnvy => "click_envy",
        GameStage::DeliverEnvy => "deliver_envy",
        GameStage::CollectLonely => "click_lonely",
        GameStage::DeliverLonely => "deliver_lonely",
        GameStage::CollectSad => "click_sad",
        GameStage::DeliverSad => "deliver_sad",
        GameStage::RequestInput => "quest_end",
        GameStage::NpcSelection => "pick_npc",
        GameStage::GameComplete => "game_clear",
        GameStage::Intro | GameStage::DeliverPride => return None,
    };
    Some(kind)
}

/// [`DialogueProvider`] backed by the configured catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogDialogueProvider {
    entries: HashMap<String, Vec<DialogueLine>>,
}

impl CatalogDialogueProvider {
    /// Build the provider from the dialogue section of the configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let entries = config
            .dialogues()
            .iter()
            .map(|(kind, lines)| {
                let lines = lines
                    .iter()
                    .map(|entry| DialogueLine {
                        speaker: entry.speaker.clone(),
                        text: entry.text.clone(),
                    })
                    .collect();
                (kind.clone(), lines)
            })
            .collect();
        Self { entries }
    }
}

impl DialogueProvider for CatalogDialogueProvider {
    fn for_stage(&self, stage: GameStage, _player_id: Uuid) -> Result<Vec<DialogueLine>, ServiceError> {
        let kind = dialogue_type(stage)
            .ok_or_else(|| ServiceError::NotFound(format!("no dialogue for stage {stage:?}")))?;

        match self.entries.get(kind) {
            Some(lines) if !lines.is_empty() => Ok(lines.clone()),
            _ => Err(ServiceError::NotFound(format!(
                "no dialogue of type `{kind}`"
            ))),
        }
    }

    fn for_type(&self, kind: &str, _player_id: Uuid) -> Vec<DialogueLine> {
        self.entries.get(kind).cloned().unwrap_or_default()
    }
}
