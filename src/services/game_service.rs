use std::time::SystemTime;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::models::GameEntity,
    dto::game::{CreateGameResponse, GameView, JoinRequest, JoinResponse, LegalMovesResponse},
    error::ServiceError,
    rules::ChessGame,
    services::feed_events,
    state::{
        SharedState,
        session::{SeatDecision, assign_seat},
    },
};

/// Insert a fresh game record and return its identifier.
pub async fn create_game(state: &SharedState) -> Result<CreateGameResponse, ServiceError> {
    let store = state.require_privileged().await?;
    let game = store.insert_game().await?;
    info!(game_id = %game.id, "game created");
    Ok(CreateGameResponse { game_id: game.id })
}

/// Read a game through the public handle.
pub async fn get_game(state: &SharedState, raw_id: &str) -> Result<GameView, ServiceError> {
    let game = find_public(state, raw_id).await?;
    Ok(GameView::try_from(game)?)
}

/// Legal moves of the current position; empty once the game is over.
pub async fn legal_moves(
    state: &SharedState,
    raw_id: &str,
) -> Result<LegalMovesResponse, ServiceError> {
    let game = find_public(state, raw_id).await?;
    let position = ChessGame::from_pgn(&game.pgn)?;
    Ok(LegalMovesResponse {
        moves: position.legal_moves(),
    })
}

/// Seat `player_id` first come first served, or hand back a spectator view.
///
/// Claims go through the store's conditional write; a lost race is re-decided
/// from a fresh read.
pub async fn join_game(
    state: &SharedState,
    request: JoinRequest,
) -> Result<JoinResponse, ServiceError> {
    let id = parse_game_id(&request.game_id)?;
    let store = state.require_privileged().await?;
    let limit = state.config().move_retry_limit;

    for attempt in 0..=limit {
        let game = store.find_game(id).await?.ok_or_else(|| not_found(id))?;
        let decision = assign_seat(
            game.player_white.as_deref(),
            game.player_black.as_deref(),
            &request.player_id,
        );

        let seat = match decision {
            SeatDecision::Rejoin(_) | SeatDecision::Spectate => {
                return Ok(JoinResponse {
                    seat: decision.seat().into(),
                    game: GameView::try_from(game)?,
                });
            }
            SeatDecision::Claim(seat) => seat,
        };

        match store
            .claim_seat(id, seat, request.player_id.clone(), SystemTime::now())
            .await?
        {
            Some(updated) => {
                info!(game_id = %id, ?seat, "seat claimed");
                let view = GameView::try_from(updated)?;
                feed_events::broadcast_game_updated(state, &view);
                return Ok(JoinResponse {
                    seat: Some(seat).into(),
                    game: view,
                });
            }
            None => debug!(game_id = %id, attempt, ?seat, "seat claim lost a race; re-reading"),
        }
    }

    Err(ServiceError::Conflict(format!(
        "could not claim a seat in game `{id}`"
    )))
}

/// Game ids are UUIDs; anything else cannot name an existing game.
pub(crate) fn parse_game_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ServiceError::NotFound(format!("game `{raw}` not found")))
}

pub(crate) fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("game `{id}` not found"))
}

async fn find_public(state: &SharedState, raw_id: &str) -> Result<GameEntity, ServiceError> {
    let id = parse_game_id(raw_id)?;
    let reader = state.require_public().await?;
    reader.find_game(id).await?.ok_or_else(|| not_found(id))
}
