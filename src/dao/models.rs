use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::stage::{GameStage, InteractiveObjectType, StarType};

/// Persisted stage of a player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEntity {
    /// Owner of the progress row.
    pub player_id: Uuid,
    /// Last stage written back from the cache.
    pub current_stage: GameStage,
    /// Last time the row was written.
    pub updated_at: SystemTime,
}

impl ProgressEntity {
    /// New progress row at `stage`.
    pub fn new(player_id: Uuid, stage: GameStage) -> Self {
        Self {
            player_id,
            current_stage: stage,
            updated_at: SystemTime::now(),
        }
    }

    /// Copy of the row moved to `stage`.
    pub fn with_stage(self, stage: GameStage) -> Self {
        Self {
            current_stage: stage,
            updated_at: SystemTime::now(),
            ..self
        }
    }
}

/// Per (player, star) collection status.
///
/// `delivered` implies `collected`; the mark helpers keep it that way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionEntity {
    /// Owner of the record.
    pub player_id: Uuid,
    /// Star the record tracks.
    pub star: StarType,
    /// Whether the star was picked up.
    pub collected: bool,
    /// Whether the star was handed over.
    pub delivered: bool,
    /// When the star was picked up.
    pub collected_at: Option<SystemTime>,
    /// When the star was handed over.
    pub delivered_at: Option<SystemTime>,
}

impl CollectionEntity {
    /// Record for a star the player has not touched yet.
    pub fn fresh(player_id: Uuid, star: StarType) -> Self {
        Self {
            player_id,
            star,
            collected: false,
            delivered: false,
            collected_at: None,
            delivered_at: None,
        }
    }

    /// Copy of the record marked as collected.
    pub fn mark_collected(self, at: SystemTime) -> Self {
        Self {
            collected: true,
            collected_at: Some(at),
            ..self
        }
    }

    /// Copy of the record marked as delivered (and collected).
    pub fn mark_delivered(self, at: SystemTime) -> Self {
        let collected_at = self.collected_at.or(Some(at));
        Self {
            collected: true,
            delivered: true,
            collected_at,
            delivered_at: Some(at),
            ..self
        }
    }

    /// Whether the star went through its whole cycle.
    pub fn is_complete(&self) -> bool {
        self.collected && self.delivered
    }
}

/// Interactive object known to the game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractiveObjectEntity {
    /// Stable identifier referenced by interaction rows.
    pub id: u32,
    /// Kind of object.
    pub object_type: InteractiveObjectType,
    /// Short description shown in tooling.
    pub description: String,
}

impl InteractiveObjectEntity {
    /// Objects every store is seeded with.
    pub fn catalog() -> Vec<Self> {
        vec![
            Self {
                id: 1,
                object_type: InteractiveObjectType::StarGuide,
                description: "Encyclopedia of the four stars".into(),
            },
            Self {
                id: 2,
                object_type: InteractiveObjectType::CharacterProfile,
                description: "Profiles of the characters".into(),
            },
            Self {
                id: 3,
                object_type: InteractiveObjectType::RequestForm,
                description: "Form used to write down the player's request".into(),
            },
        ]
    }
}

/// Per (player, object) interaction flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractionEntity {
    /// Owner of the flags.
    pub player_id: Uuid,
    /// Object the flags refer to.
    pub object_id: u32,
    /// Whether the player used the object at least once.
    pub has_interacted: bool,
    /// Whether the object can currently be used.
    pub is_active: bool,
    /// Last time the player used the object.
    pub interacted_at: Option<SystemTime>,
}

impl InteractionEntity {
    /// Flags for an object the player has not used yet.
    pub fn fresh(player_id: Uuid, object_id: u32, is_active: bool) -> Self {
        Self {
            player_id,
            object_id,
            has_interacted: false,
            is_active,
            interacted_at: None,
        }
    }

    /// Copy of the flags with the object enabled.
    pub fn activated(self) -> Self {
        Self {
            is_active: true,
            ..self
        }
    }

    /// Copy of the flags recording a use at `at`.
    pub fn interacted(self, at: SystemTime) -> Self {
        Self {
            has_interacted: true,
            interacted_at: Some(at),
            ..self
        }
    }
}

/// Letter submitted at the end of the quest, with the outcome of sending it.
///
/// One record per player; a later attempt replaces the earlier one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionEntity {
    /// Player who completed the quest.
    pub player_id: Uuid,
    /// Address the letter was sent to.
    pub email: String,
    /// Request written by the player.
    pub concern: Option<String>,
    /// Character chosen to answer.
    pub selected_npc: String,
    /// Subject line of the letter.
    pub subject: String,
    /// Whether the mail channel accepted the letter.
    pub delivered: bool,
    /// Reason the letter was refused, when it was.
    pub failure: Option<String>,
    /// When the attempt finished.
    pub recorded_at: SystemTime,
}

impl CompletionEntity {
    /// Record of a letter the channel accepted.
    pub fn sent(
        player_id: Uuid,
        email: String,
        concern: Option<String>,
        selected_npc: String,
        subject: String,
    ) -> Self {
        Self {
            player_id,
            email,
            concern,
            selected_npc,
            subject,
            delivered: true,
            failure: None,
            recorded_at: SystemTime::now(),
        }
    }

    /// Copy of the record marked as refused with `reason`.
    pub fn failed(self, reason: String) -> Self {
        Self {
            delivered: false,
            failure: Some(reason),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivering_implies_collecting() {
        let record = CollectionEntity::fresh(Uuid::new_v4(), StarType::Pride)
            .mark_delivered(SystemTime::now());
        assert!(record.collected);
        assert!(record.collected_at.is_some());
        assert!(record.is_complete());
    }

    #[test]
    fn delivery_keeps_original_collect_time() {
        let collected_at = SystemTime::UNIX_EPOCH;
        let record = CollectionEntity::fresh(Uuid::new_v4(), StarType::Envy)
            .mark_collected(collected_at)
            .mark_delivered(SystemTime::now());
        assert_eq!(record.collected_at, Some(collected_at));
    }

    #[test]
    fn catalog_has_one_entry_per_object_type() {
        let catalog = InteractiveObjectEntity::catalog();
        for object_type in InteractiveObjectType::ALL {
            assert_eq!(
                catalog
                    .iter()
                    .filter(|object| object.object_type == object_type)
                    .count(),
                1
            );
        }
    }
}
