//! Document shapes stored in MongoDB.
//!
//! Player ids are stored as their hyphenated string form; composite keys are built from the
//! player id and the star (or object) so every upsert targets exactly one document.

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::{
    dao::models::{
        CollectionEntity, CompletionEntity, InteractionEntity, InteractiveObjectEntity,
        ProgressEntity,
    },
    state::stage::{GameStage, InteractiveObjectType, StarType},
};

pub const PROGRESS_COLLECTION: &str = "game_progress";
pub const COLLECTED_STARS_COLLECTION: &str = "collected_stars";
pub const OBJECTS_COLLECTION: &str = "interactive_objects";
pub const INTERACTIONS_COLLECTION: &str = "user_interactions";
pub const COMPLETIONS_COLLECTION: &str = "completion_letters";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoProgressDocument {
    #[serde(rename = "_id")]
    player_id: String,
    current_stage: GameStage,
    updated_at: DateTime,
}

impl From<ProgressEntity> for MongoProgressDocument {
    fn from(value: ProgressEntity) -> Self {
        Self {
            player_id: value.player_id.to_string(),
            current_stage: value.current_stage,
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoProgressDocument> for ProgressEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoProgressDocument) -> MongoResult<Self> {
        Ok(Self {
            player_id: parse_player_id(PROGRESS_COLLECTION, &value.player_id)?,
            current_stage: value.current_stage,
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCollectionDocument {
    #[serde(rename = "_id")]
    id: String,
    player_id: String,
    star: StarType,
    collected: bool,
    delivered: bool,
    collected_at: Option<DateTime>,
    delivered_at: Option<DateTime>,
}

impl From<CollectionEntity> for MongoCollectionDocument {
    fn from(value: CollectionEntity) -> Self {
        Self {
            id: collection_key(value.player_id, value.star),
            player_id: value.player_id.to_string(),
            star: value.star,
            collected: value.collected,
            delivered: value.delivered,
            collected_at: value.collected_at.map(DateTime::from_system_time),
            delivered_at: value.delivered_at.map(DateTime::from_system_time),
        }
    }
}

impl TryFrom<MongoCollectionDocument> for CollectionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoCollectionDocument) -> MongoResult<Self> {
        Ok(Self {
            player_id: parse_player_id(COLLECTED_STARS_COLLECTION, &value.player_id)?,
            star: value.star,
            collected: value.collected,
            delivered: value.delivered,
            collected_at: value.collected_at.map(DateTime::to_system_time),
            delivered_at: value.delivered_at.map(DateTime::to_system_time),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoObjectDocument {
    #[serde(rename = "_id")]
    id: i64,
    object_type: InteractiveObjectType,
    description: String,
}

impl From<InteractiveObjectEntity> for MongoObjectDocument {
    fn from(value: InteractiveObjectEntity) -> Self {
        Self {
            id: i64::from(value.id),
            object_type: value.object_type,
            description: value.description,
        }
    }
}

impl From<MongoObjectDocument> for InteractiveObjectEntity {
    fn from(value: MongoObjectDocument) -> Self {
        Self {
            id: u32::try_from(value.id).unwrap_or_default(),
            object_type: value.object_type,
            description: value.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoInteractionDocument {
    #[serde(rename = "_id")]
    id: String,
    player_id: String,
    object_id: i64,
    has_interacted: bool,
    is_active: bool,
    interacted_at: Option<DateTime>,
}

impl From<InteractionEntity> for MongoInteractionDocument {
    fn from(value: InteractionEntity) -> Self {
        Self {
            id: interaction_key(value.player_id, value.object_id),
            player_id: value.player_id.to_string(),
            object_id: i64::from(value.object_id),
            has_interacted: value.has_interacted,
            is_active: value.is_active,
            interacted_at: value.interacted_at.map(DateTime::from_system_time),
        }
    }
}

impl TryFrom<MongoInteractionDocument> for InteractionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoInteractionDocument) -> MongoResult<Self> {
        Ok(Self {
            player_id: parse_player_id(INTERACTIONS_COLLECTION, &value.player_id)?,
            object_id: u32::try_from(value.object_id).unwrap_or_default(),
            has_interacted: value.has_interacted,
            is_active: value.is_active,
            interacted_at: value.interacted_at.map(DateTime::to_system_time),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCompletionDocument {
    #[serde(rename = "_id")]
    player_id: String,
    email: String,
    concern: Option<String>,
    selected_npc: String,
    subject: String,
    delivered: bool,
    failure: Option<String>,
    recorded_at: DateTime,
}

impl From<CompletionEntity> for MongoCompletionDocument {
    fn from(value: CompletionEntity) -> Self {
        Self {
            player_id: value.player_id.to_string(),
            email: value.email,
            concern: value.concern,
            selected_npc: value.selected_npc,
            subject: value.subject,
            delivered: value.delivered,
            failure: value.failure,
            recorded_at: DateTime::from_system_time(value.recorded_at),
        }
    }
}

impl TryFrom<MongoCompletionDocument> for CompletionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoCompletionDocument) -> MongoResult<Self> {
        Ok(Self {
            player_id: parse_player_id(COMPLETIONS_COLLECTION, &value.player_id)?,
            email: value.email,
            concern: value.concern,
            selected_npc: value.selected_npc,
            subject: value.subject,
            delivered: value.delivered,
            failure: value.failure,
            recorded_at: value.recorded_at.to_system_time(),
        })
    }
}

fn parse_player_id(collection: &'static str, value: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(value).map_err(|source| MongoDaoError::InvalidPlayerId {
        collection,
        value: value.to_owned(),
        source,
    })
}

fn collection_key(player_id: Uuid, star: StarType) -> String {
    format!("{player_id}:{star:?}")
}

fn interaction_key(player_id: Uuid, object_id: u32) -> String {
    format!("{player_id}:{object_id}")
}

/// Progress and completion documents are both keyed by the bare player id.
pub fn progress_id(player_id: Uuid) -> Document {
    doc! { "_id": player_id.to_string() }
}

pub fn collection_id(player_id: Uuid, star: StarType) -> Document {
    doc! { "_id": collection_key(player_id, star) }
}

pub fn interaction_id(player_id: Uuid, object_id: u32) -> Document {
    doc! { "_id": interaction_key(player_id, object_id) }
}

pub fn object_id(id: u32) -> Document {
    doc! { "_id": i64::from(id) }
}

pub fn by_player(player_id: Uuid) -> Document {
    doc! { "player_id": player_id.to_string() }
}
