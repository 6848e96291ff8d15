//! Seat assignment, turn ownership and status/result transitions of a game session.

use chess::Color;
use thiserror::Error;

use crate::{
    dao::models::{GameResult, GameStatus, Seat},
    rules::Outcome,
};

/// What a joining client gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatDecision {
    /// The seat is free and must be written with a conditional claim.
    Claim(Seat),
    /// The client already holds this seat; nothing to write.
    Rejoin(Seat),
    /// Both seats are held by other clients.
    Spectate,
}

impl SeatDecision {
    /// Seat held after the decision; `None` for spectators.
    pub fn seat(self) -> Option<Seat> {
        match self {
            SeatDecision::Claim(seat) | SeatDecision::Rejoin(seat) => Some(seat),
            SeatDecision::Spectate => None,
        }
    }
}

/// Decide the seat of `player` given the current occupants, first come first served.
pub fn assign_seat(white: Option<&str>, black: Option<&str>, player: &str) -> SeatDecision {
    if white == Some(player) {
        return SeatDecision::Rejoin(Seat::White);
    }
    if black == Some(player) {
        return SeatDecision::Rejoin(Seat::Black);
    }
    match (white, black) {
        (None, _) => SeatDecision::Claim(Seat::White),
        (Some(_), None) => SeatDecision::Claim(Seat::Black),
        (Some(_), Some(_)) => SeatDecision::Spectate,
    }
}

/// Why a requester may not act on a game.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The game already reached a terminal position.
    #[error("game is already complete")]
    GameOver,
    /// No player id was sent.
    #[error("a player id is required to move")]
    Anonymous,
    /// The player id holds neither seat.
    #[error("player does not hold a seat in this game")]
    NotSeated,
    /// The player holds the seat that does not move next.
    #[error("it is {to_move:?}'s turn")]
    NotYourTurn { to_move: Seat },
}

/// Check that `player` may move now, returning the seat that moves.
pub fn authorize_move(
    white: Option<&str>,
    black: Option<&str>,
    player: Option<&str>,
    side_to_move: Color,
) -> Result<Seat, SessionError> {
    let player = player
        .filter(|id| !id.is_empty())
        .ok_or(SessionError::Anonymous)?;
    let to_move = Seat::from(side_to_move);
    let seat = match (white == Some(player), black == Some(player)) {
        (true, _) => Seat::White,
        (_, true) => Seat::Black,
        _ => return Err(SessionError::NotSeated),
    };

    if seat == to_move {
        Ok(seat)
    } else {
        Err(SessionError::NotYourTurn { to_move })
    }
}

/// Status and result to persist after an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Status to store.
    pub status: GameStatus,
    /// Result to store.
    pub result: Option<GameResult>,
}

/// Compute the record state after a move was applied on a game in `status`.
///
/// `outcome` is the classification of the position after the move.
pub fn advance(status: GameStatus, outcome: Option<Outcome>) -> Result<Transition, SessionError> {
    if status == GameStatus::Complete {
        return Err(SessionError::GameOver);
    }

    Ok(match outcome {
        Some(Outcome::Checkmate { winner }) => Transition {
            status: GameStatus::Complete,
            result: Some(Seat::from(winner).wins()),
        },
        Some(Outcome::Draw { .. }) => Transition {
            status: GameStatus::Complete,
            result: Some(GameResult::Draw),
        },
        None => Transition {
            status: GameStatus::Active,
            result: None,
        },
    })
}
