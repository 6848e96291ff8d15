//! Chess rules adapter built on top of the `chess` crate.
//!
//! The crate gives us board representation and legal move generation; this
//! module adds what a stored game needs on top: PGN decoding/encoding, SAN,
//! clocks, and terminal-state classification.

mod game;
mod outcome;
mod pgn;
mod san;

use thiserror::Error;

pub use self::game::{ChessGame, MoveInput};
pub use self::outcome::{DrawReason, Outcome};

/// Failures raised while decoding a stored PGN document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    /// The `FEN` tag could not be parsed into a position.
    #[error("invalid FEN `{fen}`")]
    InvalidFen { fen: String },
    /// A tag pair line is not of the form `[Key "Value"]`.
    #[error("malformed tag pair `{line}`")]
    MalformedTag { line: String },
    /// A SAN token does not match any legal move at that point of the game.
    #[error("move `{token}` at ply {ply} is not legal")]
    UnknownMove { ply: usize, token: String },
    /// A comment or variation was opened but never closed.
    #[error("unterminated {kind} in movetext")]
    Unterminated { kind: &'static str },
}

/// Failures raised while applying a move to a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    /// A square name is not in `a1`..`h8`.
    #[error("invalid square `{0}`")]
    InvalidSquare(String),
    /// A promotion piece letter is not one of `q`, `r`, `b`, `n`.
    #[error("invalid promotion piece `{0}`")]
    InvalidPromotion(String),
    /// The move is not legal in the current position.
    #[error("illegal move {from}{to}")]
    IllegalMove { from: String, to: String },
}
