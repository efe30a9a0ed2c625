use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::interaction::{
        CharacterProfileResponse, InteractionStatusResponse, ObjectStatusResponse,
        StarGuideQuery, StarGuideResponse,
    },
    error::{AppError, ErrorBody},
    state::{SharedState, stage::InteractiveObjectType},
};

/// Routes for the optional in-game objects.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/v1/interactions/{player_id}/status", get(object_status))
        .route(
            "/api/v1/interactions/{player_id}/star-guide",
            get(star_guide),
        )
        .route(
            "/api/v1/interactions/{player_id}/character-profile",
            get(character_profile),
        )
        .route(
            "/api/v1/interactions/{player_id}/request-form",
            get(open_request_form),
        )
        .route(
            "/api/v1/interactions/{player_id}/{object_type}",
            post(record_interaction),
        )
}

/// Flags of every interactive object for a player.
#[utoipa::path(
    get,
    path = "/api/v1/interactions/{player_id}/status",
    tag = "interactions",
    params(("player_id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Object flags", body = InteractionStatusResponse)
    )
)]
pub async fn object_status(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<InteractionStatusResponse>, AppError> {
    let statuses = state.interactions().await?.object_status(player_id).await?;
    Ok(Json(InteractionStatusResponse {
        player_id,
        objects: statuses.into_iter().map(Into::into).collect(),
    }))
}

/// Record the use of an object.
#[utoipa::path(
    post,
    path = "/api/v1/interactions/{player_id}/{object_type}",
    tag = "interactions",
    params(
        ("player_id" = Uuid, Path, description = "Player identifier"),
        ("object_type" = InteractiveObjectType, Path, description = "Object used")
    ),
    responses(
        (status = 200, description = "Use recorded", body = ObjectStatusResponse),
        (status = 409, description = "Object not active", body = ErrorBody)
    )
)]
pub async fn record_interaction(
    State(state): State<SharedState>,
    Path((player_id, object_type)): Path<(Uuid, InteractiveObjectType)>,
) -> Result<Json<ObjectStatusResponse>, AppError> {
    let status = state
        .interactions()
        .await?
        .record_interaction(player_id, object_type)
        .await?;
    Ok(Json(status.into()))
}

/// Open the request form once every star has been delivered.
#[utoipa::path(
    get,
    path = "/api/v1/interactions/{player_id}/request-form",
    tag = "interactions",
    params(("player_id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Request form opened", body = ObjectStatusResponse),
        (status = 409, description = "Request form not active yet", body = ErrorBody)
    )
)]
pub async fn open_request_form(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<ObjectStatusResponse>, AppError> {
    let status = state
        .interactions()
        .await?
        .open_request_form(player_id)
        .await?;
    Ok(Json(status.into()))
}

/// One page of the star guide.
#[utoipa::path(
    get,
    path = "/api/v1/interactions/{player_id}/star-guide",
    tag = "interactions",
    params(
        ("player_id" = Uuid, Path, description = "Player identifier"),
        ("page" = Option<i64>, Query, description = "Zero-based page, clamped into range"),
        ("include_dialogues" = Option<bool>, Query, description = "Attach the opening dialogue (default true)")
    ),
    responses(
        (status = 200, description = "Star guide page", body = StarGuideResponse)
    )
)]
pub async fn star_guide(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
    Query(query): Query<StarGuideQuery>,
) -> Result<Json<StarGuideResponse>, AppError> {
    let page = state
        .interactions()
        .await?
        .star_guide(player_id, query.page, query.include_dialogues);
    Ok(Json(page.into()))
}

/// Profiles of every character.
#[utoipa::path(
    get,
    path = "/api/v1/interactions/{player_id}/character-profile",
    tag = "interactions",
    params(("player_id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Character profiles", body = CharacterProfileResponse)
    )
)]
pub async fn character_profile(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<CharacterProfileResponse>, AppError> {
    let page = state.interactions().await?.character_profiles(player_id);
    Ok(Json(page.into()))
}
