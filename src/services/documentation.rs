use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification of the star quest backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::start_game,
        crate::routes::game::update_stage,
        crate::routes::game::collect_star,
        crate::routes::game::deliver_star,
        crate::routes::game::current_state,
        crate::routes::game::current_stage,
        crate::routes::game::complete_game,
        crate::routes::interaction::object_status,
        crate::routes::interaction::record_interaction,
        crate::routes::interaction::open_request_form,
        crate::routes::interaction::star_guide,
        crate::routes::interaction::character_profile,
        crate::routes::admin::cache_size,
        crate::routes::admin::cache_entry,
        crate::routes::admin::clear_cache_entry,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::StageUpdateRequest,
            crate::dto::game::StarActionRequest,
            crate::dto::game::CompletionRequestBody,
            crate::dto::game::GameStageResponse,
            crate::dto::game::CurrentStageResponse,
            crate::dto::interaction::ObjectStatusResponse,
            crate::dto::interaction::InteractionStatusResponse,
            crate::dto::interaction::StarGuideEntryResponse,
            crate::dto::interaction::StarGuideResponse,
            crate::dto::interaction::NpcProfileResponse,
            crate::dto::interaction::CharacterProfileResponse,
            crate::dto::admin::CacheSizeResponse,
            crate::dto::admin::CacheEntryResponse,
            crate::dto::admin::CacheClearResponse,
            crate::services::dialogue::DialogueLine,
            crate::state::stage::GameStage,
            crate::state::stage::StarType,
            crate::state::stage::InteractiveObjectType,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Quest progress of a player"),
        (name = "interactions", description = "Optional in-game objects"),
        (name = "admin", description = "State cache inspection"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/api/v1/game/progress/{player_id}",
            "/api/v1/game/progress/{player_id}/start-game",
            "/api/v1/game/{player_id}/complete",
            "/api/v1/interactions/{player_id}/{object_type}",
            "/api/v1/interactions/{player_id}/star-guide",
            "/api/v1/interactions/{player_id}/character-profile",
            "/admin/cache/{player_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
