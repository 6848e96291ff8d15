use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a game. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Created, no move accepted yet.
    Waiting,
    /// At least one move accepted, not finished.
    Active,
    /// Terminal position reached; no further moves.
    Complete,
}

/// Final result, present exactly when the game is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    /// White delivered mate.
    WhiteWins,
    /// Black delivered mate.
    BlackWins,
    /// Any draw classification.
    Draw,
}

/// One of the two player roles of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    /// Moves first.
    White,
    /// Moves second.
    Black,
}

impl Seat {
    /// The opposing seat.
    pub fn other(self) -> Self {
        match self {
            Seat::White => Seat::Black,
            Seat::Black => Seat::White,
        }
    }

    /// Result recorded when this seat delivers mate.
    pub fn wins(self) -> GameResult {
        match self {
            Seat::White => GameResult::WhiteWins,
            Seat::Black => GameResult::BlackWins,
        }
    }
}

impl From<chess::Color> for Seat {
    fn from(color: chess::Color) -> Self {
        match color {
            chess::Color::White => Seat::White,
            chess::Color::Black => Seat::Black,
        }
    }
}

/// Persisted game record, one per shared link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Full move history as PGN; empty until the first move.
    pub pgn: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Set exactly when `status` is complete.
    pub result: Option<GameResult>,
    /// Client identifier holding the white seat.
    pub player_white: Option<String>,
    /// Client identifier holding the black seat.
    pub player_black: Option<String>,
    /// Insertion time.
    pub created_at: SystemTime,
    /// Refreshed on every accepted move or seat claim.
    pub updated_at: SystemTime,
}

impl GameEntity {
    /// Fresh record with every field at its default.
    pub fn new() -> Self {
        let now = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            pgn: String::new(),
            status: GameStatus::Waiting,
            result: None,
            player_white: None,
            player_black: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Identifier occupying `seat`, if any.
    pub fn player(&self, seat: Seat) -> Option<&str> {
        match seat {
            Seat::White => self.player_white.as_deref(),
            Seat::Black => self.player_black.as_deref(),
        }
    }
}

impl Default for GameEntity {
    fn default() -> Self {
        Self::new()
    }
}

/// Fields replaced by an accepted move, written as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveWrite {
    /// Notation including the accepted move.
    pub pgn: String,
    /// Status after the move.
    pub status: GameStatus,
    /// Result after the move.
    pub result: Option<GameResult>,
    /// Time the move was accepted.
    pub updated_at: SystemTime,
}

impl GameEntity {
    /// Copy of this record with `write` applied.
    pub fn with_move(&self, write: &MoveWrite) -> Self {
        Self {
            pgn: write.pgn.clone(),
            status: write.status,
            result: write.result,
            updated_at: write.updated_at,
            ..self.clone()
        }
    }
}
