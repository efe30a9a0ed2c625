mod config;
mod connection;
mod error;
mod models;
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoQuestStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::InvalidPlayerId {
                collection, value, ..
            } => StorageError::InvalidRecord {
                collection,
                message: format!("player id `{value}` is not a UUID"),
            },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
