/// Dialogue catalog lookup.
pub mod dialogue;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Interactive object flags.
pub mod interaction_service;
/// Outbound completion email.
pub mod mailer;
/// Player actions of the quest.
pub mod quest_service;
/// Storage connection supervisor with backoff.
pub mod storage_supervisor;
/// Cache-aside reads of player state.
pub mod sync_engine;
/// Background write-back to the durable store.
pub mod write_worker;
