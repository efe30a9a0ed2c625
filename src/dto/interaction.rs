//! Wire types of the interactive object routes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::format_system_time,
    services::{
        dialogue::DialogueLine,
        interaction_service::{
            CharacterProfile, CharacterProfiles, ObjectStatus, StarGuideItem, StarGuidePage,
        },
    },
    state::stage::{InteractiveObjectType, StarType},
};

/// Flags of one interactive object.
#[derive(Debug, Serialize, ToSchema)]
pub struct ObjectStatusResponse {
    pub object_id: u32,
    pub object_type: InteractiveObjectType,
    pub has_interacted: bool,
    pub is_active: bool,
    /// RFC 3339 timestamp of the last use.
    pub interacted_at: Option<String>,
}

impl From<ObjectStatus> for ObjectStatusResponse {
    fn from(status: ObjectStatus) -> Self {
        Self {
            object_id: status.object_id,
            object_type: status.object_type,
            has_interacted: status.has_interacted,
            is_active: status.is_active,
            interacted_at: status.interacted_at.map(format_system_time),
        }
    }
}

/// Every object of a player.
#[derive(Debug, Serialize, ToSchema)]
pub struct InteractionStatusResponse {
    pub player_id: Uuid,
    pub objects: Vec<ObjectStatusResponse>,
}

/// Query of `GET /api/v1/interactions/{player_id}/star-guide`.
#[derive(Debug, Deserialize)]
pub struct StarGuideQuery {
    /// Zero-based page, clamped into range.
    #[serde(default)]
    pub page: i64,
    /// Whether to attach the opening dialogue.
    #[serde(default = "default_include_dialogues")]
    pub include_dialogues: bool,
}

fn default_include_dialogues() -> bool {
    true
}

/// One star guide entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct StarGuideEntryResponse {
    pub entry_id: usize,
    pub star_name: String,
    /// Feeling the star was born from.
    pub star_source: String,
    pub description: String,
}

impl From<StarGuideItem> for StarGuideEntryResponse {
    fn from(item: StarGuideItem) -> Self {
        Self {
            entry_id: item.entry_id,
            star_name: item.name,
            star_source: item.source,
            description: item.description,
        }
    }
}

/// One page of the star guide.
#[derive(Debug, Serialize, ToSchema)]
pub struct StarGuideResponse {
    pub dialogues: Vec<DialogueLine>,
    pub star_entries: Vec<StarGuideEntryResponse>,
    pub total_pages: usize,
    pub current_page: usize,
}

impl From<StarGuidePage> for StarGuideResponse {
    fn from(page: StarGuidePage) -> Self {
        Self {
            dialogues: page.dialogues,
            star_entries: page.entries.into_iter().map(Into::into).collect(),
            total_pages: page.total_pages,
            current_page: page.current_page,
        }
    }
}

/// Profile of one character.
#[derive(Debug, Serialize, ToSchema)]
pub struct NpcProfileResponse {
    pub npc_id: usize,
    pub npc_name: String,
    pub star: StarType,
    pub description: String,
}

impl From<CharacterProfile> for NpcProfileResponse {
    fn from(profile: CharacterProfile) -> Self {
        Self {
            npc_id: profile.npc_id,
            npc_name: profile.name,
            star: profile.star,
            description: profile.description,
        }
    }
}

/// Character profile page.
#[derive(Debug, Serialize, ToSchema)]
pub struct CharacterProfileResponse {
    pub dialogues: Vec<DialogueLine>,
    pub profiles: Vec<NpcProfileResponse>,
}

impl From<CharacterProfiles> for CharacterProfileResponse {
    fn from(page: CharacterProfiles) -> Self {
        Self {
            dialogues: page.dialogues,
            profiles: page.profiles.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_guide_query_defaults_to_first_page_with_dialogue() {
        let query: StarGuideQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 0);
        assert!(query.include_dialogues);
    }
}
