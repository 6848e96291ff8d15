use std::str::FromStr;

use chess::{Board, ChessMove, Color, MoveGen, Piece, Square};
use indexmap::IndexMap;

use super::{
    NotationError, RulesError,
    outcome::{self, Outcome},
    pgn, san,
};

const FEN_TAG: &str = "FEN";

/// A move request expressed the way board UIs report drops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveInput {
    /// Source square, e.g. `e2`.
    pub from: String,
    /// Target square.
    pub to: String,
    /// Promotion piece letter (`q`, `r`, `b`, `n`), case-insensitive.
    pub promotion: Option<String>,
}

/// A full game replayed from its notation: start position, every ply, and
/// the bookkeeping the `chess` crate does not keep (clocks, repetition).
#[derive(Debug, Clone)]
pub struct ChessGame {
    tags: IndexMap<String, String>,
    start_fullmove: u32,
    start_side: Color,
    sans: Vec<String>,
    board: Board,
    halfmove_clock: u32,
    history: Vec<u64>,
    termination: Option<String>,
}

impl Default for ChessGame {
    fn default() -> Self {
        Self::from_board(Board::default(), 0, 1, IndexMap::new())
    }
}

impl ChessGame {
    /// Fresh game from the standard initial position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a stored PGN. An empty (or blank) string is the initial position.
    pub fn from_pgn(input: &str) -> Result<Self, NotationError> {
        if input.trim().is_empty() {
            return Ok(Self::new());
        }

        let document = pgn::parse(input)?;
        let mut game = match document.tags.get(FEN_TAG) {
            Some(fen) => {
                let (board, halfmove, fullmove) = parse_fen(fen)?;
                Self::from_board(board, halfmove, fullmove, document.tags.clone())
            }
            None => Self::from_board(Board::default(), 0, 1, document.tags.clone()),
        };

        for (index, token) in document.sans.iter().enumerate() {
            let mv = san::resolve(&game.board, token).ok_or_else(|| NotationError::UnknownMove {
                ply: index + 1,
                token: token.clone(),
            })?;
            game.push(mv);
        }
        game.termination = document.termination;

        Ok(game)
    }

    /// Encode the game back into PGN.
    pub fn to_pgn(&self) -> String {
        pgn::write(
            &self.tags,
            &self.sans,
            self.start_fullmove,
            self.start_side == Color::Black,
            self.termination.as_deref(),
        )
    }

    /// Apply a move given as squares.
    ///
    /// A promoting pawn move without a promotion piece promotes to a queen;
    /// a promotion piece on a non-promoting move is ignored.
    pub fn play(&mut self, input: &MoveInput) -> Result<(), RulesError> {
        let from = parse_square(&input.from)?;
        let to = parse_square(&input.to)?;
        let requested = input
            .promotion
            .as_deref()
            .filter(|letter| !letter.is_empty())
            .map(parse_promotion)
            .transpose()?;

        let promotion = if self.is_promotion(from, to) {
            Some(requested.unwrap_or(Piece::Queen))
        } else {
            None
        };

        let mv = ChessMove::new(from, to, promotion);
        if !self.board.legal(mv) {
            return Err(RulesError::IllegalMove {
                from: input.from.clone(),
                to: input.to.clone(),
            });
        }

        self.push(mv);
        Ok(())
    }

    /// Colour whose turn it is.
    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    /// Terminal classification of the current position.
    pub fn outcome(&self) -> Option<Outcome> {
        outcome::classify(&self.board, self.halfmove_clock, &self.history)
    }

    /// Legal moves in UCI form; empty once the game is over.
    pub fn legal_moves(&self) -> Vec<String> {
        if self.outcome().is_some() {
            return Vec::new();
        }
        MoveGen::new_legal(&self.board).map(san::to_uci).collect()
    }

    /// SAN of every ply played so far.
    pub fn san_moves(&self) -> &[String] {
        &self.sans
    }

    /// Forsyth-Edwards notation of the current position, clocks included.
    pub fn fen(&self) -> String {
        let placement = self.board.to_string();
        let fields: Vec<&str> = placement.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            fields.join(" "),
            self.halfmove_clock,
            self.fullmove_number()
        )
    }

    fn fullmove_number(&self) -> usize {
        let offset = usize::from(self.start_side == Color::Black);
        self.start_fullmove as usize + (self.sans.len() + offset) / 2
    }

    fn from_board(
        board: Board,
        halfmove_clock: u32,
        start_fullmove: u32,
        tags: IndexMap<String, String>,
    ) -> Self {
        Self {
            tags,
            start_fullmove,
            start_side: board.side_to_move(),
            sans: Vec::new(),
            halfmove_clock,
            history: vec![board.get_hash()],
            board,
            termination: None,
        }
    }

    fn is_promotion(&self, from: Square, to: Square) -> bool {
        let last_rank = match self.board.side_to_move() {
            Color::White => 7,
            Color::Black => 0,
        };
        self.board.piece_on(from) == Some(Piece::Pawn)
            && self.board.color_on(from) == Some(self.board.side_to_move())
            && to.get_rank().to_index() == last_rank
    }

    fn push(&mut self, mv: ChessMove) {
        let irreversible = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || san::is_capture(&self.board, mv);

        self.sans.push(san::to_san(&self.board, mv));
        self.board = self.board.make_move_new(mv);
        self.halfmove_clock = if irreversible {
            0
        } else {
            self.halfmove_clock + 1
        };
        self.history.push(self.board.get_hash());
        // Movetext after a termination marker would no longer be well formed.
        self.termination = None;
    }
}

fn parse_square(name: &str) -> Result<Square, RulesError> {
    let trimmed = name.trim();
    if trimmed.len() != 2 {
        return Err(RulesError::InvalidSquare(name.to_string()));
    }
    Square::from_str(&trimmed.to_ascii_lowercase())
        .map_err(|_| RulesError::InvalidSquare(name.to_string()))
}

fn parse_promotion(letter: &str) -> Result<Piece, RulesError> {
    let mut chars = letter.chars();
    match (chars.next().and_then(san::piece_from_letter), chars.next()) {
        (Some(piece @ (Piece::Queen | Piece::Rook | Piece::Bishop | Piece::Knight)), None) => {
            Ok(piece)
        }
        _ => Err(RulesError::InvalidPromotion(letter.to_string())),
    }
}

/// Parse a FEN, returning the board plus the halfmove clock and fullmove
/// number the `chess` crate does not track.
fn parse_fen(fen: &str) -> Result<(Board, u32, u32), NotationError> {
    let invalid = || NotationError::InvalidFen {
        fen: fen.to_string(),
    };
    let board = Board::from_str(fen).map_err(|_| invalid())?;
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let halfmove = match fields.get(4) {
        Some(raw) => raw.parse().map_err(|_| invalid())?,
        None => 0,
    };
    let fullmove = match fields.get(5) {
        Some(raw) => raw.parse::<u32>().map_err(|_| invalid())?.max(1),
        None => 1,
    };
    Ok((board, halfmove, fullmove))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::DrawReason;

    fn input(from: &str, to: &str) -> MoveInput {
        MoveInput {
            from: from.into(),
            to: to.into(),
            promotion: None,
        }
    }

    fn play_all(game: &mut ChessGame, moves: &[(&str, &str)]) {
        for (from, to) in moves {
            game.play(&input(from, to))
                .unwrap_or_else(|err| panic!("{from}{to} should be legal: {err}"));
        }
    }

    const FOOLS_MATE: [(&str, &str); 4] = [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")];

    #[test]
    fn e4_from_initial_position() {
        let mut game = ChessGame::from_pgn("").expect("empty notation is the initial position");
        game.play(&input("e2", "e4")).expect("e4 is legal");

        assert_eq!(game.to_pgn(), "1. e4");
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(
            game.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );

        let decoded = ChessGame::from_pgn(&game.to_pgn()).expect("round trip");
        assert_eq!(decoded.fen(), game.fen());
    }

    #[test]
    fn e5_from_initial_position_is_illegal() {
        let mut game = ChessGame::new();
        let err = game.play(&input("e2", "e5")).unwrap_err();
        assert_eq!(
            err,
            RulesError::IllegalMove {
                from: "e2".into(),
                to: "e5".into()
            }
        );
        assert_eq!(game.to_pgn(), "");
    }

    #[test]
    fn rejects_malformed_squares_and_promotions() {
        let mut game = ChessGame::new();
        assert_eq!(
            game.play(&input("e9", "e4")),
            Err(RulesError::InvalidSquare("e9".into()))
        );
        assert_eq!(
            game.play(&input("e2", "e44")),
            Err(RulesError::InvalidSquare("e44".into()))
        );
        let with_king = MoveInput {
            promotion: Some("k".into()),
            ..input("e2", "e4")
        };
        assert_eq!(
            game.play(&with_king),
            Err(RulesError::InvalidPromotion("k".into()))
        );
    }

    #[test]
    fn fools_mate_is_checkmate_for_black() {
        let mut game = ChessGame::new();
        play_all(&mut game, &FOOLS_MATE);

        assert_eq!(game.to_pgn(), "1. f3 e5 2. g4 Qh4#");
        assert_eq!(
            game.outcome(),
            Some(Outcome::Checkmate {
                winner: Color::Black
            })
        );
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let mut game =
            ChessGame::from_pgn("[FEN \"4k3/P7/8/8/8/8/8/4K3 w - - 0 40\"]").expect("valid fen");
        game.play(&input("a7", "a8")).expect("promotion is legal");
        assert_eq!(game.san_moves(), ["a8=Q+"]);

        let mut game =
            ChessGame::from_pgn("[FEN \"4k3/P7/8/8/8/8/8/4K3 w - - 0 40\"]").expect("valid fen");
        let underpromote = MoveInput {
            promotion: Some("N".into()),
            ..input("a7", "a8")
        };
        game.play(&underpromote).expect("knight promotion is legal");
        assert_eq!(game.san_moves(), ["a8=N"]);
        assert_eq!(
            game.to_pgn(),
            "[FEN \"4k3/P7/8/8/8/8/8/4K3 w - - 0 40\"]\n\n40. a8=N"
        );
    }

    #[test]
    fn promotion_letter_on_ordinary_move_is_ignored() {
        let mut game = ChessGame::new();
        let mv = MoveInput {
            promotion: Some("q".into()),
            ..input("g1", "f3")
        };
        game.play(&mv).expect("knight move is legal");
        assert_eq!(game.to_pgn(), "1. Nf3");
    }

    #[test]
    fn round_trip_is_identity_for_encoded_games() {
        let mut game = ChessGame::new();
        play_all(
            &mut game,
            &[
                ("e2", "e4"),
                ("e7", "e5"),
                ("g1", "f3"),
                ("b8", "c6"),
                ("f1", "c4"),
                ("g8", "f6"),
                ("e1", "g1"),
                ("f6", "e4"),
            ],
        );
        let encoded = game.to_pgn();
        assert_eq!(encoded, "1. e4 e5 2. Nf3 Nc6 3. Bc4 Nf6 4. O-O Nxe4");

        let decoded = ChessGame::from_pgn(&encoded).expect("decodes");
        assert_eq!(decoded.to_pgn(), encoded);
        assert_eq!(decoded.fen(), game.fen());
    }

    #[test]
    fn decodes_black_to_move_start_positions() {
        let pgn = "[FEN \"4k3/8/8/8/8/8/4R3/4K3 b - - 3 12\"]\n\n12. ... Kd8 13. Re3";
        let game = ChessGame::from_pgn(pgn).expect("valid pgn");
        assert_eq!(game.san_moves(), ["Kd8", "Re3"]);
        assert_eq!(game.to_pgn(), pgn);
        assert_eq!(game.fen(), "3k4/8/8/8/8/4R3/8/4K3 b - - 5 13");
    }

    #[test]
    fn rejects_notation_with_illegal_moves() {
        assert_eq!(
            ChessGame::from_pgn("1. e4 e5 2. Ke3").unwrap_err(),
            NotationError::UnknownMove {
                ply: 3,
                token: "Ke3".into()
            }
        );
        assert!(matches!(
            ChessGame::from_pgn("[FEN \"not a fen\"]"),
            Err(NotationError::InvalidFen { .. })
        ));
    }

    #[test]
    fn repeated_knight_dance_draws_by_repetition() {
        let mut game = ChessGame::new();
        let dance = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
        play_all(&mut game, &dance);
        assert_eq!(game.outcome(), None);
        play_all(&mut game, &dance);
        assert_eq!(
            game.outcome(),
            Some(Outcome::Draw {
                reason: DrawReason::ThreefoldRepetition
            })
        );
    }
}
