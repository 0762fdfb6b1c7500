//! The immutable record of a single move.
//!
//! A [`Move`] snapshots every pre-move board field that [`crate::Board::undo`]
//! needs to restore exactly, and carries slots that external analysis
//! tooling fills in after the fact. Records hold no reference back to the
//! board; the board owns its history by value.

use crate::board::Board;
use crate::catalog::Piece;
use crate::core::{CastlingRights, Coord, Score, Side};
use crate::hash::PositionKey;

/// What a move did to the game, beyond moving a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum MoveKind {
    /// An ordinary move (possibly a check; checks carry a `+` suffix in the
    /// SAN name instead of a kind of their own).
    #[strum(serialize = "")]
    Normal,
    /// The move delivers mate; the SAN name ends in `#`.
    #[strum(serialize = "checkmate")]
    Checkmate,
    /// The opponent is left without a legal reply but not in check.
    #[strum(serialize = "stalemate")]
    Stalemate,
    /// The capture leaves material with which neither side can mate.
    #[strum(serialize = "insufficient material")]
    InsufficientMaterial,
    /// The move completes fifty full moves without a pawn move or capture.
    #[strum(serialize = "fifty-move rule")]
    FiftyMove,
    /// The move repeats the position for the third time.
    #[strum(serialize = "threefold repetition")]
    Repetition,
}

/// A move together with the pre-move state needed to reverse it.
#[derive(Clone, Debug)]
pub struct Move {
    /// The move in Standard Algebraic Notation. Castling is stored with
    /// digits (`0-0`, `0-0-0`) and rendered with letters in PGN.
    pub name: String,
    /// Starting square.
    pub from: Coord,
    /// Ending square.
    pub to: Coord,
    /// The captured piece, if the move is a capture (including en passant,
    /// where the captured pawn does not stand on [`Move::to`]).
    pub capture: Option<Piece>,
    /// For castling, the rook's starting square; for en passant, the square
    /// of the captured pawn.
    pub info: Option<Coord>,
    /// Side to move before the move.
    pub side: Side,
    /// Castling availability before the move.
    pub castling: CastlingRights,
    /// En-passant target before the move.
    pub en_passant: Option<Coord>,
    /// Halfmove clock before the move.
    pub halfmove_clock: u32,
    /// Fullmove number before the move.
    pub fullmove_number: u32,
    /// Engine evaluation before the move, if one was set.
    pub evaluation: Option<Score>,
    /// Repetition fingerprint of the position before the move.
    pub key: PositionKey,
    /// Termination classification assigned by the generator.
    pub kind: MoveKind,
    /// Euclidean length of the moving piece's step.
    pub distance: f64,
    /// Letter of the pawn a promotion replaced; `None` otherwise.
    pub(crate) promoted_from: Option<char>,
    /// Evaluation swing caused by the move, set by analysis tooling.
    pub eval_change: Option<f64>,
    /// Win-probability swing caused by the move, set by analysis tooling.
    pub win_change: Option<f64>,
    /// Analysis classification such as "best" or "blunder".
    pub classification: Option<String>,
    /// Free-form annotation attached by analysis tooling.
    pub comment: Option<String>,
}

impl Move {
    /// Creates a record, snapshotting the pre-move fields from `board`.
    pub(crate) fn record(
        name: String,
        from: Coord,
        to: Coord,
        board: &Board,
        capture: Option<Piece>,
        info: Option<Coord>,
        key: PositionKey,
    ) -> Self {
        Self {
            name,
            from,
            to,
            capture,
            info,
            side: board.side_to_move(),
            castling: board.castling(),
            en_passant: board.en_passant(),
            halfmove_clock: board.halfmove_clock(),
            fullmove_number: board.fullmove_number(),
            evaluation: board.evaluation(),
            key,
            kind: MoveKind::Normal,
            distance: from.distance_to(to),
            promoted_from: None,
            eval_change: None,
            win_change: None,
            classification: None,
            comment: None,
        }
    }

    /// Whether the move starts on `from`.
    #[must_use]
    pub fn matches_from(&self, from: Coord) -> bool {
        self.from == from
    }

    /// Whether the move goes from `from` to `to`.
    #[must_use]
    pub fn matches(&self, from: Coord, to: Coord) -> bool {
        self.from == from && self.to == to
    }

    /// Whether `san` names this move. Castling written with the letter `O`
    /// is normalized to the stored digit form first; everything else is
    /// compared verbatim.
    #[must_use]
    pub fn matches_san(&self, san: &str) -> bool {
        if san.starts_with("O-") || san.starts_with("0-") {
            self.name == san.replace('O', "0")
        } else {
            self.name == san
        }
    }

    /// Whether the move is castling.
    #[must_use]
    pub fn is_castling(&self) -> bool {
        self.name.contains('-')
    }

    /// Whether the move is queenside castling.
    #[must_use]
    pub fn is_queenside_castling(&self) -> bool {
        self.name.matches('0').count() == 3
    }

    /// Whether the move captures a piece.
    #[must_use]
    pub fn is_capture(&self) -> bool {
        self.capture.is_some()
    }

    /// Whether the move promotes a pawn.
    #[must_use]
    pub fn is_promotion(&self) -> bool {
        self.name.contains('=')
    }

    /// Whether the move was made by a pawn-family piece. Pawn SAN names
    /// start with a file letter; piece names start with an uppercase
    /// letter and castling with a digit.
    #[must_use]
    pub fn is_pawn_move(&self) -> bool {
        self.name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase())
    }

    /// Whether the move resets the halfmove clock and therefore ends the
    /// stretch of positions a repetition can reach back through.
    #[must_use]
    pub fn is_irreversible(&self) -> bool {
        self.is_capture() || self.is_pawn_move()
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
