use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::game::{
        CreateGameResponse, GameView, JoinRequest, JoinResponse, LegalMovesResponse, MoveRequest,
        MoveResponse,
    },
    error::AppError,
    services::{game_service, move_service},
    state::SharedState,
};

/// Routes handling game creation, seats, moves and reads.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game/create", post(create_game))
        .route("/game/move", post(make_move))
        .route("/game/join", post(join_game))
        .route("/game/{id}", get(get_game))
        .route("/game/{id}/moves", get(legal_moves))
}

/// Create a fresh game with every field at its default.
#[utoipa::path(
    post,
    path = "/game/create",
    tag = "game",
    responses(
        (status = 200, description = "Game created", body = CreateGameResponse),
        (status = 500, description = "Storage failure"),
        (status = 503, description = "Storage unavailable (degraded mode)")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
) -> Result<Json<CreateGameResponse>, AppError> {
    let created = game_service::create_game(&state).await?;
    Ok(Json(created))
}

/// Validate a move against the stored game and persist it.
#[utoipa::path(
    post,
    path = "/game/move",
    tag = "game",
    request_body = MoveRequest,
    responses(
        (status = 200, description = "Move accepted", body = MoveResponse),
        (status = 400, description = "Missing fields, malformed squares or illegal move"),
        (status = 403, description = "Requester does not hold the seat to move"),
        (status = 404, description = "Unknown game"),
        (status = 409, description = "Game over, or concurrent moves kept winning"),
        (status = 500, description = "Storage failure or corrupt stored notation"),
        (status = 503, description = "Storage unavailable (degraded mode)")
    )
)]
pub async fn make_move(
    State(state): State<SharedState>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<MoveResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;
    let response = move_service::make_move(&state, payload).await?;
    Ok(Json(response))
}

/// Take the first free seat, rejoin a held one, or watch.
#[utoipa::path(
    post,
    path = "/game/join",
    tag = "game",
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Seat decided", body = JoinResponse),
        (status = 400, description = "Invalid player id"),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn join_game(
    State(state): State<SharedState>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Json<JoinResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;
    let response = game_service::join_game(&state, payload).await?;
    Ok(Json(response))
}

/// Current state of a game.
#[utoipa::path(
    get,
    path = "/game/{id}",
    tag = "game",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Game found", body = GameView),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GameView>, AppError> {
    let view = game_service::get_game(&state, &id).await?;
    Ok(Json(view))
}

/// Legal moves of the current position in UCI form.
#[utoipa::path(
    get,
    path = "/game/{id}/moves",
    tag = "game",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Legal moves", body = LegalMovesResponse),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn legal_moves(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<LegalMovesResponse>, AppError> {
    let moves = game_service::legal_moves(&state, &id).await?;
    Ok(Json(moves))
}
