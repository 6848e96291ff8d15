use chess::{BitBoard, Board, BoardStatus, Color, Piece};

/// Terminal classification of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The side to move is mated; `winner` is the side that delivered it.
    Checkmate { winner: Color },
    /// The game is drawn.
    Draw { reason: DrawReason },
}

/// Why a position counts as a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    /// No legal move and not in check.
    Stalemate,
    /// Neither side can mate.
    InsufficientMaterial,
    /// Same position seen three times.
    ThreefoldRepetition,
    /// A hundred plies without capture or pawn move.
    FiftyMoveRule,
}

const FIFTY_MOVE_PLIES: u32 = 100;
const REPETITION_LIMIT: usize = 3;

/// Classify `board` given its halfmove clock and the hashes of every position
/// reached so far (current one included).
///
/// Mate is decided before any draw rule: a mated side has no legal move while
/// in check, a stalemated one has none while out of check, so at most one of
/// the two board statuses can hold.
pub(super) fn classify(board: &Board, halfmove_clock: u32, history: &[u64]) -> Option<Outcome> {
    match board.status() {
        BoardStatus::Checkmate => {
            return Some(Outcome::Checkmate {
                winner: !board.side_to_move(),
            });
        }
        BoardStatus::Stalemate => {
            return Some(Outcome::Draw {
                reason: DrawReason::Stalemate,
            });
        }
        BoardStatus::Ongoing => {}
    }

    let reason = if insufficient_material(board) {
        DrawReason::InsufficientMaterial
    } else if is_threefold(board.get_hash(), history) {
        DrawReason::ThreefoldRepetition
    } else if halfmove_clock >= FIFTY_MOVE_PLIES {
        DrawReason::FiftyMoveRule
    } else {
        return None;
    };

    Some(Outcome::Draw { reason })
}

fn is_threefold(current: u64, history: &[u64]) -> bool {
    history.iter().filter(|hash| **hash == current).count() >= REPETITION_LIMIT
}

fn insufficient_material(board: &Board) -> bool {
    let heavy =
        *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy.popcnt() > 0 {
        return false;
    }

    let knights = *board.pieces(Piece::Knight);
    let bishops = *board.pieces(Piece::Bishop);
    let minors = knights.popcnt() + bishops.popcnt();

    match minors {
        0 | 1 => true,
        _ if knights.popcnt() == 0 => bishops_share_colour(bishops),
        _ => false,
    }
}

fn bishops_share_colour(bishops: BitBoard) -> bool {
    let mut colours =
        bishops.map(|square| (square.get_file().to_index() + square.get_rank().to_index()) % 2);
    match colours.next() {
        Some(first) => colours.all(|colour| colour == first),
        None => true,
    }
}
