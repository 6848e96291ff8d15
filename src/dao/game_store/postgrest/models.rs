use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as, skip_serializing_none};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{GameEntity, GameResult, GameStatus, MoveWrite, Seat};

/// Row of the `games` table as returned by PostgREST.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct GameRow {
    pub id: Uuid,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub pgn: String,
    pub status: GameStatus,
    #[serde(default)]
    pub result: Option<GameResult>,
    #[serde(default)]
    pub player_white: Option<String>,
    #[serde(default)]
    pub player_black: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    // Older rows predate the column.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl GameRow {
    /// Convert into the backend-agnostic record.
    pub fn into_entity(self) -> GameEntity {
        let created_at = SystemTime::from(self.created_at);
        GameEntity {
            id: self.id,
            pgn: self.pgn,
            status: self.status,
            result: self.result,
            player_white: self.player_white,
            player_black: self.player_black,
            created_at,
            updated_at: self.updated_at.map(SystemTime::from).unwrap_or(created_at),
        }
    }
}

/// Body of the conditional move update. `result` is always sent so a null clears it.
#[derive(Debug, Serialize)]
pub struct MovePatch {
    pub pgn: String,
    pub status: GameStatus,
    pub result: Option<GameResult>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<MoveWrite> for MovePatch {
    fn from(write: MoveWrite) -> Self {
        Self {
            pgn: write.pgn,
            status: write.status,
            result: write.result,
            updated_at: OffsetDateTime::from(write.updated_at),
        }
    }
}

/// Body of the conditional seat claim; only the claimed column is sent.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct SeatPatch {
    pub player_white: Option<String>,
    pub player_black: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SeatPatch {
    /// Claim `seat` for `player_id` at `at`.
    pub fn new(seat: Seat, player_id: String, at: SystemTime) -> Self {
        let (player_white, player_black) = match seat {
            Seat::White => (Some(player_id), None),
            Seat::Black => (None, Some(player_id)),
        };
        Self {
            player_white,
            player_black,
            updated_at: OffsetDateTime::from(at),
        }
    }
}

/// Column holding the given seat.
pub fn seat_column(seat: Seat) -> &'static str {
    match seat {
        Seat::White => "player_white",
        Seat::Black => "player_black",
    }
}
