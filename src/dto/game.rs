use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{GameEntity, GameResult, GameStatus, Seat},
    dto::{
        format_system_time,
        validation::{validate_player_id, validate_promotion, validate_square},
    },
    rules::{ChessGame, MoveInput, NotationError},
};

/// Returned once a game has been created.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    /// Identifier to share with the opponent.
    pub game_id: Uuid,
}

/// A move as reported by a board UI: source and target squares.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MoveRequest {
    /// Identifier of the game; an id that is not a UUID is answered with 404.
    pub game_id: String,
    /// Source square.
    #[schema(example = "e2")]
    pub from: String,
    /// Target square.
    #[schema(example = "e4")]
    pub to: String,
    /// Promotion piece letter; queen when omitted on a promoting move.
    pub promotion: Option<String>,
    /// Client identifier of the requester; must hold the seat to move.
    pub player_id: Option<String>,
}

impl Validate for MoveRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.game_id.trim().is_empty() {
            errors.add("gameId", required("gameId"));
        }
        for (field, square) in [("from", &self.from), ("to", &self.to)] {
            if square.is_empty() {
                errors.add(field, required(field));
            } else if let Err(e) = validate_square(square) {
                errors.add(field, e);
            }
        }
        if let Some(piece) = self.promotion_letter() {
            if let Err(e) = validate_promotion(piece) {
                errors.add("promotion", e);
            }
        }
        if let Some(ref id) = self.player_id {
            if let Err(e) = validate_player_id(id) {
                errors.add("playerId", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl MoveRequest {
    /// The move part of the request, in the shape the rules adapter expects.
    pub fn move_input(&self) -> MoveInput {
        MoveInput {
            from: self.from.to_ascii_lowercase(),
            to: self.to.to_ascii_lowercase(),
            promotion: self.promotion_letter().map(str::to_string),
        }
    }

    /// An empty letter counts as no letter.
    fn promotion_letter(&self) -> Option<&str> {
        self.promotion.as_deref().filter(|piece| !piece.is_empty())
    }
}

/// Acknowledgement of an accepted move.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MoveResponse {
    /// Always `true`; failures use the error body.
    pub success: bool,
    /// Notation of the game including the accepted move.
    pub pgn: String,
}

/// Request to take a seat in a game, or watch it when both seats are held.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinRequest {
    /// Identifier of the game to join.
    pub game_id: String,
    /// Client identifier of the joiner.
    pub player_id: String,
}

impl Validate for JoinRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.game_id.trim().is_empty() {
            errors.add("gameId", required("gameId"));
        }
        if let Err(e) = validate_player_id(&self.player_id) {
            errors.add("playerId", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Role granted to a joining client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SeatView {
    /// Holds the white seat.
    White,
    /// Holds the black seat.
    Black,
    /// Both seats taken by others; read-only.
    Spectator,
}

impl From<Option<Seat>> for SeatView {
    fn from(seat: Option<Seat>) -> Self {
        match seat {
            Some(Seat::White) => SeatView::White,
            Some(Seat::Black) => SeatView::Black,
            None => SeatView::Spectator,
        }
    }
}

/// Outcome of a join request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinResponse {
    /// Role granted to the joiner.
    pub seat: SeatView,
    /// Game after the join.
    pub game: GameView,
}

/// Client-facing projection of a game record, with the derived position.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    /// Game identifier.
    pub id: Uuid,
    /// Move history; empty before the first move.
    pub pgn: String,
    /// Current position in Forsyth-Edwards notation.
    pub fen: String,
    /// Side to move.
    pub turn: Seat,
    /// `waiting`, `active` or `complete`.
    pub status: GameStatus,
    /// Set once the game is complete.
    pub result: Option<GameResult>,
    /// Holder of the white seat.
    pub player_white: Option<String>,
    /// Holder of the black seat.
    pub player_black: Option<String>,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 time of the last change.
    pub updated_at: String,
}

impl GameView {
    /// Project `game` using an already decoded position.
    pub fn project(game: GameEntity, position: &ChessGame) -> Self {
        Self {
            id: game.id,
            pgn: game.pgn,
            fen: position.fen(),
            turn: Seat::from(position.side_to_move()),
            status: game.status,
            result: game.result,
            player_white: game.player_white,
            player_black: game.player_black,
            created_at: format_system_time(game.created_at),
            updated_at: format_system_time(game.updated_at),
        }
    }
}

impl TryFrom<GameEntity> for GameView {
    type Error = NotationError;

    fn try_from(game: GameEntity) -> Result<Self, Self::Error> {
        let position = ChessGame::from_pgn(&game.pgn)?;
        Ok(Self::project(game, &position))
    }
}

/// Legal moves of the current position in UCI form (`e2e4`, `e7e8q`).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LegalMovesResponse {
    /// Moves in UCI form, e.g. `e2e4` or `e7e8q`.
    pub moves: Vec<String>,
}

fn required(field: &str) -> ValidationError {
    let mut err = ValidationError::new("required");
    err.message = Some(format!("`{field}` is required").into());
    err
}
