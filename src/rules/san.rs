//! Standard Algebraic Notation for single moves.

use chess::{Board, BoardStatus, ChessMove, MoveGen, Piece, Square};

/// Render `mv` (legal in `board`) as SAN, including the check/mate suffix.
pub(super) fn to_san(board: &Board, mv: ChessMove) -> String {
    let mut san = san_body(board, mv);
    let after = board.make_move_new(mv);
    if after.status() == BoardStatus::Checkmate {
        san.push('#');
    } else if after.checkers().popcnt() > 0 {
        san.push('+');
    }
    san
}

/// Find the legal move in `board` that `token` denotes.
///
/// Exact SAN is tried first; tokens that are over-disambiguated or written
/// without the `=` promotion marker fall back to a structural match, which
/// must be unambiguous.
pub(super) fn resolve(board: &Board, token: &str) -> Option<ChessMove> {
    let wanted = normalize(token);
    if wanted.is_empty() {
        return None;
    }

    let legal: Vec<ChessMove> = MoveGen::new_legal(board).collect();
    if let Some(mv) = legal
        .iter()
        .copied()
        .find(|mv| normalize(&san_body(board, *mv)) == wanted)
    {
        return Some(mv);
    }

    let pattern = SanPattern::parse(&wanted)?;
    let mut candidates = legal
        .into_iter()
        .filter(|mv| pattern.matches(board, *mv));
    let found = candidates.next()?;
    candidates.next().is_none().then_some(found)
}

pub(super) fn is_castle(board: &Board, mv: ChessMove) -> bool {
    board.piece_on(mv.get_source()) == Some(Piece::King)
        && mv
            .get_source()
            .get_file()
            .to_index()
            .abs_diff(mv.get_dest().get_file().to_index())
            == 2
}

pub(super) fn is_capture(board: &Board, mv: ChessMove) -> bool {
    board.piece_on(mv.get_dest()).is_some()
        || (board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            && mv.get_source().get_file() != mv.get_dest().get_file())
}

/// UCI long algebraic form (`e2e4`, `e7e8q`).
pub(super) fn to_uci(mv: ChessMove) -> String {
    let mut uci = format!("{}{}", mv.get_source(), mv.get_dest());
    if let Some(piece) = mv.get_promotion() {
        uci.push(piece_letter(piece).to_ascii_lowercase());
    }
    uci
}

pub(super) fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

pub(super) fn piece_from_letter(letter: char) -> Option<Piece> {
    match letter.to_ascii_uppercase() {
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        'K' => Some(Piece::King),
        _ => None,
    }
}

fn san_body(board: &Board, mv: ChessMove) -> String {
    let source = mv.get_source();
    let dest = mv.get_dest();
    let Some(piece) = board.piece_on(source) else {
        return to_uci(mv);
    };

    if is_castle(board, mv) {
        let kingside = dest.get_file().to_index() > source.get_file().to_index();
        return if kingside { "O-O" } else { "O-O-O" }.to_string();
    }

    let capture = is_capture(board, mv);
    let mut san = String::with_capacity(8);
    if piece == Piece::Pawn {
        if capture {
            san.push(file_char(source));
        }
    } else {
        san.push(piece_letter(piece));
        san.push_str(&disambiguation(board, mv, piece));
    }
    if capture {
        san.push('x');
    }
    san.push_str(&dest.to_string());
    if let Some(promotion) = mv.get_promotion() {
        san.push('=');
        san.push(piece_letter(promotion));
    }
    san
}

fn disambiguation(board: &Board, mv: ChessMove, piece: Piece) -> String {
    let source = mv.get_source();
    let rivals: Vec<Square> = MoveGen::new_legal(board)
        .filter(|other| {
            other.get_dest() == mv.get_dest()
                && other.get_source() != source
                && board.piece_on(other.get_source()) == Some(piece)
        })
        .map(|other| other.get_source())
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals.iter().any(|sq| sq.get_file() == source.get_file());
    let shares_rank = rivals.iter().any(|sq| sq.get_rank() == source.get_rank());
    match (shares_file, shares_rank) {
        (false, _) => file_char(source).to_string(),
        (true, false) => rank_char(source).to_string(),
        (true, true) => source.to_string(),
    }
}

fn normalize(token: &str) -> String {
    token
        .trim_end_matches(['+', '#', '!', '?'])
        .chars()
        .filter(|c| *c != '=')
        .map(|c| if c == '0' { 'O' } else { c })
        .collect()
}

fn file_char(square: Square) -> char {
    (b'a' + square.get_file().to_index() as u8) as char
}

fn rank_char(square: Square) -> char {
    (b'1' + square.get_rank().to_index() as u8) as char
}

/// Loose structural reading of a SAN token, used when the exact form differs.
struct SanPattern {
    piece: Piece,
    from_file: Option<usize>,
    from_rank: Option<usize>,
    dest: Square,
    promotion: Option<Piece>,
}

impl SanPattern {
    fn parse(token: &str) -> Option<Self> {
        let mut chars: Vec<char> = token.chars().filter(|c| *c != 'x' && *c != '-').collect();

        let promotion = match chars.last() {
            Some(c) if c.is_ascii_alphabetic() && !('a'..='h').contains(c) => {
                let piece = piece_from_letter(*c)?;
                chars.pop();
                Some(piece)
            }
            _ => None,
        };

        if chars.len() < 2 {
            return None;
        }
        let dest: String = chars.split_off(chars.len() - 2).into_iter().collect();
        let dest = dest.parse::<Square>().ok()?;

        let mut rest = chars.into_iter().peekable();
        let piece = match rest.peek() {
            Some(c) if c.is_ascii_uppercase() => {
                let piece = piece_from_letter(*c)?;
                rest.next();
                piece
            }
            _ => Piece::Pawn,
        };

        let mut from_file = None;
        let mut from_rank = None;
        for c in rest {
            match c {
                'a'..='h' => from_file = Some(c as usize - 'a' as usize),
                '1'..='8' => from_rank = Some(c as usize - '1' as usize),
                _ => return None,
            }
        }

        Some(Self {
            piece,
            from_file,
            from_rank,
            dest,
            promotion,
        })
    }

    fn matches(&self, board: &Board, mv: ChessMove) -> bool {
        board.piece_on(mv.get_source()) == Some(self.piece)
            && mv.get_dest() == self.dest
            && mv.get_promotion() == self.promotion
            && self
                .from_file
                .is_none_or(|file| mv.get_source().get_file().to_index() == file)
            && self
                .from_rank
                .is_none_or(|rank| mv.get_source().get_rank().to_index() == rank)
    }
}
