//! Error types shared by the MongoDB storage implementation.

use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

use crate::state::stage::{InteractiveObjectType, StarType};

/// Convenient result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Failures that can occur while interacting with MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Connection string could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    /// Client could not be built from the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    /// Server never answered the initial ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    /// Periodic ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    /// Index creation was rejected.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    /// Interactive object catalog could not be written.
    #[error("failed to seed interactive object `{object_type:?}`")]
    SeedObject {
        object_type: InteractiveObjectType,
        #[source]
        source: MongoError,
    },
    #[error("failed to load progress of player `{player_id}`")]
    LoadProgress {
        player_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save progress of player `{player_id}`")]
    SaveProgress {
        player_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load {star:?} record of player `{player_id}`")]
    LoadCollection {
        player_id: Uuid,
        star: StarType,
        #[source]
        source: MongoError,
    },
    #[error("failed to list collection records of player `{player_id}`")]
    ListCollections {
        player_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save {star:?} record of player `{player_id}`")]
    SaveCollection {
        player_id: Uuid,
        star: StarType,
        #[source]
        source: MongoError,
    },
    #[error("failed to load interactive objects")]
    LoadObjects {
        #[source]
        source: MongoError,
    },
    #[error("failed to load interaction with object {object_id} of player `{player_id}`")]
    LoadInteraction {
        player_id: Uuid,
        object_id: u32,
        #[source]
        source: MongoError,
    },
    #[error("failed to save interaction with object {object_id} of player `{player_id}`")]
    SaveInteraction {
        player_id: Uuid,
        object_id: u32,
        #[source]
        source: MongoError,
    },
    #[error("failed to load completion record of player `{player_id}`")]
    LoadCompletion {
        player_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save completion record of player `{player_id}`")]
    SaveCompletion {
        player_id: Uuid,
        #[source]
        source: MongoError,
    },
    /// A stored document holds a player identifier that is not a UUID.
    #[error("document in `{collection}` holds invalid player id `{value}`")]
    InvalidPlayerId {
        collection: &'static str,
        value: String,
        #[source]
        source: uuid::Error,
    },
}
