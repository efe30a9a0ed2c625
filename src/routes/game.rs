use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::game::{
        CompletionRequestBody, CurrentStageResponse, GameStageResponse, StageUpdateRequest,
        StarActionRequest,
    },
    error::{AppError, ErrorBody},
    state::SharedState,
};

/// Routes driving a player through the quest.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/v1/game/progress/{player_id}",
            get(current_state).put(update_stage),
        )
        .route(
            "/api/v1/game/progress/{player_id}/start-game",
            post(start_game),
        )
        .route("/api/v1/game/progress/{player_id}/collect", post(collect_star))
        .route("/api/v1/game/progress/{player_id}/deliver", post(deliver_star))
        .route("/api/v1/game/progress/{player_id}/stage", get(current_stage))
        .route("/api/v1/game/{player_id}/complete", post(complete_game))
}

/// Start (or restart) the quest for a player.
#[utoipa::path(
    post,
    path = "/api/v1/game/progress/{player_id}/start-game",
    tag = "game",
    params(("player_id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Game started", body = GameStageResponse),
        (status = 409, description = "Game already completed", body = ErrorBody),
        (status = 503, description = "No store available", body = ErrorBody)
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<GameStageResponse>, AppError> {
    let view = state.quest().await?.start_game(player_id).await?;
    Ok(Json(view.into()))
}

/// Move a player to a stage no star action reaches.
#[utoipa::path(
    put,
    path = "/api/v1/game/progress/{player_id}",
    tag = "game",
    params(("player_id" = Uuid, Path, description = "Player identifier")),
    request_body = StageUpdateRequest,
    responses(
        (status = 200, description = "Stage updated", body = GameStageResponse),
        (status = 404, description = "Unknown player", body = ErrorBody),
        (status = 409, description = "Transition not allowed", body = ErrorBody)
    )
)]
pub async fn update_stage(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
    Json(payload): Json<StageUpdateRequest>,
) -> Result<Json<GameStageResponse>, AppError> {
    let view = state
        .quest()
        .await?
        .update_stage(player_id, payload.new_stage)
        .await?;
    Ok(Json(view.into()))
}

/// Pick up a star.
#[utoipa::path(
    post,
    path = "/api/v1/game/progress/{player_id}/collect",
    tag = "game",
    params(("player_id" = Uuid, Path, description = "Player identifier")),
    request_body = StarActionRequest,
    responses(
        (status = 200, description = "Star collected", body = GameStageResponse),
        (status = 404, description = "Unknown player", body = ErrorBody),
        (status = 409, description = "Star already collected", body = ErrorBody)
    )
)]
pub async fn collect_star(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
    Json(payload): Json<StarActionRequest>,
) -> Result<Json<GameStageResponse>, AppError> {
    let view = state
        .quest()
        .await?
        .collect_star(player_id, payload.star_type)
        .await?;
    Ok(Json(view.into()))
}

/// Hand a collected star over.
#[utoipa::path(
    post,
    path = "/api/v1/game/progress/{player_id}/deliver",
    tag = "game",
    params(("player_id" = Uuid, Path, description = "Player identifier")),
    request_body = StarActionRequest,
    responses(
        (status = 200, description = "Star delivered", body = GameStageResponse),
        (status = 404, description = "Unknown player", body = ErrorBody),
        (status = 409, description = "Star not collected or already delivered", body = ErrorBody)
    )
)]
pub async fn deliver_star(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
    Json(payload): Json<StarActionRequest>,
) -> Result<Json<GameStageResponse>, AppError> {
    let view = state
        .quest()
        .await?
        .deliver_star(player_id, payload.star_type)
        .await?;
    Ok(Json(view.into()))
}

/// Current stage of a player with its dialogue.
#[utoipa::path(
    get,
    path = "/api/v1/game/progress/{player_id}",
    tag = "game",
    params(("player_id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Current state", body = GameStageResponse),
        (status = 404, description = "Unknown player", body = ErrorBody)
    )
)]
pub async fn current_state(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<GameStageResponse>, AppError> {
    let view = state.quest().await?.current_state(player_id).await?;
    Ok(Json(view.into()))
}

/// Current stage of a player.
#[utoipa::path(
    get,
    path = "/api/v1/game/progress/{player_id}/stage",
    tag = "game",
    params(("player_id" = Uuid, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Current stage", body = CurrentStageResponse),
        (status = 404, description = "Unknown player", body = ErrorBody)
    )
)]
pub async fn current_stage(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<CurrentStageResponse>, AppError> {
    let current_stage = state.quest().await?.current_stage(player_id).await?;
    Ok(Json(CurrentStageResponse {
        player_id,
        current_stage,
    }))
}

/// Finish the quest and send the letter of the selected character.
#[utoipa::path(
    post,
    path = "/api/v1/game/{player_id}/complete",
    tag = "game",
    params(("player_id" = Uuid, Path, description = "Player identifier")),
    request_body = CompletionRequestBody,
    responses(
        (status = 200, description = "Game completed", body = GameStageResponse),
        (status = 400, description = "Malformed email or unknown character", body = ErrorBody),
        (status = 422, description = "Stars missing, or email/character not provided", body = ErrorBody)
    )
)]
pub async fn complete_game(
    State(state): State<SharedState>,
    Path(player_id): Path<Uuid>,
    Json(payload): Json<CompletionRequestBody>,
) -> Result<Json<GameStageResponse>, AppError> {
    payload.validate()?;
    let view = state
        .quest()
        .await?
        .complete_game(player_id, payload.into())
        .await?;
    Ok(Json(view.into()))
}
