//! The board state machine: grid, game metadata, move history and the
//! make/undo/redo cycle.
//!
//! A [`Board`] is strictly sequential: every mutation happens in place and
//! the undo stack restores each field exactly, which the legality filter in
//! [`crate::movegen`] depends on. Clones are fully independent, history and
//! counters included, so callers that want parallelism own one board per
//! worker.

use std::fmt::{self, Write as _};

use chrono::Local;
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Piece;
use crate::core::{CastlingRights, CastlingSide, Coord, Score, Side};
use crate::movegen::GenLevel;
use crate::moves::{Move, MoveKind};
use crate::Error;

/// Variant names understood by [`Board::new`] in addition to `Standard`,
/// `Empty`, `8x<N>`, `Duckboard<X>x<Y>`, `[<backrank>]` and raw FEN.
const CHESS960_ALIASES: [&str; 5] = ["Chess960", "960", "Fisherandom", "Fisher random", "Chess9LX"];

/// A complete game state: piece grid, whose turn it is, castling rights,
/// en-passant target, clocks, PGN tag pairs, played and undone moves, and
/// the cached legal/illegal move lists of the current position.
#[derive(Clone)]
pub struct Board {
    pub(crate) variant: String,
    pub(crate) size: (u8, u8),
    pub(crate) grid: Vec<Vec<Option<Piece>>>,
    pub(crate) side_to_move: Side,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Coord>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) tag_pairs: IndexMap<String, String>,
    pub(crate) history: Vec<Move>,
    pub(crate) undone: Vec<Move>,
    pub(crate) promotion: String,
    pub(crate) legal_moves: Vec<Move>,
    pub(crate) illegal_moves: Vec<Move>,
    pub(crate) evaluation: Option<Score>,
}

impl Default for Board {
    /// The standard starting position.
    fn default() -> Self {
        Self::new("Standard")
    }
}

impl Board {
    /// Sets up a board for the named variant. A FEN string may be passed in
    /// place of a variant name and is detected by its `/` rank separators.
    /// Unrecognized names produce an empty 8×8 board carrying the given
    /// name.
    #[must_use]
    pub fn new(variant: &str) -> Self {
        let mut board = Self::bare(variant, (8, 8));

        if variant == "Standard" {
            board.fill_armies(&['R', 'N', 'B', 'Q', 'K', 'B', 'N', 'R']);
        } else if CHESS960_ALIASES.contains(&variant) {
            board.variant = "Chess960".to_string();
            let backrank = chess960_backrank(&mut rand::thread_rng());
            board.fill_armies(&backrank);
            board.stamp_setup_tags();
        } else if let Some(height) = variant
            .strip_prefix("8x")
            .and_then(|h| h.parse::<u8>().ok())
            .filter(|h| *h >= 2)
        {
            board.resize((8, height));
            board.fill_armies(&['R', 'N', 'B', 'Q', 'K', 'B', 'N', 'R']);
            board.stamp_setup_tags();
        } else if let Some(size) = variant.strip_prefix("Duckboard").and_then(parse_size) {
            board.resize(size);
            for row in &mut board.grid {
                for square in row.iter_mut() {
                    *square = Some(Piece::from_letter('\u{0398}'));
                }
            }
            board.stamp_setup_tags();
        } else if let Some(backrank) = variant
            .strip_prefix('[')
            .and_then(|v| v.strip_suffix(']'))
            .filter(|v| !v.is_empty())
        {
            let letters: Vec<char> = backrank.chars().collect();
            board.resize((letters.len() as u8, 8));
            board.fill_armies(&letters);
            board.stamp_setup_tags();
        } else if variant.contains('/') {
            // A FEN in place of a variant name: classification and tags
            // happen inside the loader.
            let _ = board.load_fen(variant);
            return board;
        } else if variant == "Empty" {
            board.stamp_setup_tags();
        }

        board.refresh_legal();
        board
    }

    /// An unpopulated board of the given size with default tag pairs.
    fn bare(variant: &str, size: (u8, u8)) -> Self {
        let now = Local::now();
        let mut tag_pairs = IndexMap::new();
        for (tag, value) in [
            ("Event", "?".to_string()),
            ("Site", "Gryphon".to_string()),
            ("Date", now.format("%Y.%m.%d").to_string()),
            ("Round", "?".to_string()),
            ("White", "?".to_string()),
            ("Black", "?".to_string()),
            ("Result", "*".to_string()),
            ("Time", now.format("%H:%M:%S").to_string()),
        ] {
            let _ = tag_pairs.insert(tag.to_string(), value);
        }
        Self {
            variant: variant.to_string(),
            size,
            grid: empty_grid(size),
            side_to_move: Side::White,
            castling: CastlingRights::all(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            tag_pairs,
            history: Vec::new(),
            undone: Vec::new(),
            promotion: "QNRB".to_string(),
            legal_moves: Vec::new(),
            illegal_moves: Vec::new(),
            evaluation: None,
        }
    }

    fn resize(&mut self, size: (u8, u8)) {
        self.size = size;
        self.grid = empty_grid(size);
    }

    /// Mirrored armies: lowercase back rank and pawns on top, uppercase at
    /// the bottom. Pawn rows are placed only when the board is tall enough
    /// to keep them distinct from the back ranks.
    fn fill_armies(&mut self, backrank: &[char]) {
        let (width, height) = self.size;
        debug_assert_eq!(backrank.len(), usize::from(width));
        let h = usize::from(height);
        for (x, letter) in backrank.iter().enumerate() {
            self.grid[0][x] = Some(Piece::from_letter(
                letter.to_lowercase().next().unwrap_or(*letter),
            ));
            self.grid[h - 1][x] = Some(Piece::from_letter(*letter));
        }
        if height >= 4 {
            for x in 0..usize::from(width) {
                self.grid[1][x] = Some(Piece::from_letter('p'));
                self.grid[h - 2][x] = Some(Piece::from_letter('P'));
            }
        }
    }

    /// Marks a non-standard initial setup: `Variant`, `SetUp` and the
    /// normalized starting `FEN`.
    fn stamp_setup_tags(&mut self) {
        let _ = self
            .tag_pairs
            .insert("Variant".to_string(), self.variant.clone());
        let _ = self.tag_pairs.insert("SetUp".to_string(), "1".to_string());
        let _ = self.tag_pairs.insert("FEN".to_string(), self.fen());
    }

    /// Returns the board to an empty 8×8 state, keeping the tag pairs but
    /// clearing any previous game result. FEN loading starts from here and
    /// parse failures leave this state behind.
    pub(crate) fn reset(&mut self) {
        self.resize((8, 8));
        self.variant = "Empty".to_string();
        self.side_to_move = Side::White;
        self.castling = CastlingRights::empty();
        self.en_passant = None;
        self.halfmove_clock = 0;
        self.fullmove_number = 1;
        self.history.clear();
        self.undone.clear();
        self.legal_moves.clear();
        self.illegal_moves.clear();
        self.evaluation = None;
        self.reopen_game();
    }

    /// Board size as `(files, ranks)`.
    #[must_use]
    pub fn size(&self) -> (u8, u8) {
        self.size
    }

    /// Number of files.
    #[must_use]
    pub fn width(&self) -> u8 {
        self.size.0
    }

    /// Number of ranks.
    #[must_use]
    pub fn height(&self) -> u8 {
        self.size.1
    }

    /// The piece on a square, if any.
    #[must_use]
    pub fn at(&self, square: Coord) -> Option<&Piece> {
        self.grid[usize::from(square.y)][usize::from(square.x)].as_ref()
    }

    pub(crate) fn square_mut(&mut self, square: Coord) -> &mut Option<Piece> {
        &mut self.grid[usize::from(square.y)][usize::from(square.x)]
    }

    /// Places (or removes, with `None`) a piece, as a board editor would.
    /// Editing reopens a decided game and recomputes the legal moves.
    pub fn place(&mut self, square: Coord, piece: Option<Piece>) {
        *self.square_mut(square) = piece;
        self.reopen_game();
        self.refresh_legal();
    }

    /// Clears the game-over tags so move generation runs again.
    fn reopen_game(&mut self) {
        let _ = self.tag_pairs.insert("Result".to_string(), "*".to_string());
        let _ = self.tag_pairs.shift_remove("Termination");
        let _ = self.tag_pairs.shift_remove("EndTime");
    }

    /// The player to move.
    #[must_use]
    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    /// Current castling availability.
    #[must_use]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    /// En-passant target square, if a pawn just advanced two squares.
    #[must_use]
    pub fn en_passant(&self) -> Option<Coord> {
        self.en_passant
    }

    /// Halfmoves since the last pawn move or capture.
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// 1-based move number, incremented after each Black move.
    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// The variant label: a constructor name, or the classification of a
    /// loaded FEN (`Standard`, `Fairy` or `Bad number of kings`).
    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// The letters a pawn may promote to.
    #[must_use]
    pub fn promotion(&self) -> &str {
        &self.promotion
    }

    /// Replaces the promotion letter set and recomputes legal moves.
    pub fn set_promotion(&mut self, letters: &str) {
        self.promotion = letters.to_string();
        self.refresh_legal();
    }

    /// PGN tag pairs in insertion order.
    #[must_use]
    pub fn tag_pairs(&self) -> &IndexMap<String, String> {
        &self.tag_pairs
    }

    /// A single tag value.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tag_pairs.get(name).map(String::as_str)
    }

    /// Sets a tag pair, preserving insertion order for existing tags.
    pub fn set_tag(&mut self, name: &str, value: &str) {
        let _ = self
            .tag_pairs
            .insert(name.to_string(), value.to_string());
    }

    /// The game result tag: `1-0`, `0-1`, `1/2-1/2` or `*`.
    #[must_use]
    pub fn result(&self) -> &str {
        self.tag("Result").unwrap_or("*")
    }

    /// Moves played so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Moves available for [`Board::redo`], oldest first.
    #[must_use]
    pub fn undone(&self) -> &[Move] {
        &self.undone
    }

    /// Legal moves of the current position, produced by the last full
    /// generation pass.
    #[must_use]
    pub fn legal_moves(&self) -> &[Move] {
        &self.legal_moves
    }

    /// Pseudo-legal moves rejected because they would leave the king in
    /// check.
    #[must_use]
    pub fn illegal_moves(&self) -> &[Move] {
        &self.illegal_moves
    }

    /// The externally supplied engine evaluation, if any.
    #[must_use]
    pub fn evaluation(&self) -> Option<Score> {
        self.evaluation
    }

    /// Stores an engine evaluation.
    pub fn set_evaluation(&mut self, score: Option<Score>) {
        self.evaluation = score;
    }

    /// Plays a move that must come from [`Board::legal_moves`].
    ///
    /// # Errors
    ///
    /// [`Error::IllegalMove`] when the move is not currently legal.
    pub fn play(&mut self, mv: &Move) -> Result<(), Error> {
        let Some(found) = self
            .legal_moves
            .iter()
            .find(|candidate| candidate.name == mv.name)
            .cloned()
        else {
            return Err(Error::IllegalMove(mv.name.clone()));
        };
        self.apply(found, true);
        Ok(())
    }

    /// Plays a move given in Standard Algebraic Notation. Castling may be
    /// written with letters (`O-O`) or digits (`0-0`).
    ///
    /// # Errors
    ///
    /// [`Error::IllegalMove`] when the string is malformed or does not name
    /// a legal move.
    pub fn play_san(&mut self, san: &str) -> Result<(), Error> {
        if san.chars().count() < 2 {
            return Err(Error::IllegalMove(san.to_string()));
        }
        let Some(found) = self
            .legal_moves
            .iter()
            .find(|candidate| candidate.matches_san(san))
            .cloned()
        else {
            return Err(Error::IllegalMove(san.to_string()));
        };
        self.apply(found, true);
        Ok(())
    }

    /// Takes back the last move, restoring every field from its record.
    /// Returns the undone move, which stays available for [`Board::redo`].
    pub fn undo(&mut self) -> Option<Move> {
        self.revert(true)
    }

    /// Replays the most recently undone move.
    pub fn redo(&mut self) -> Option<Move> {
        let mv = self.undone.last()?.clone();
        self.apply(mv.clone(), true);
        Some(mv)
    }

    /// Applies a move. With `update_legal` the redo stack, result tags and
    /// cached legal moves are maintained; the legality filter and perft use
    /// the raw variant.
    pub(crate) fn apply(&mut self, mut mv: Move, update_legal: bool) {
        let (from, to) = (mv.from, mv.to);
        let (x, y) = (usize::from(from.x), usize::from(from.y));
        let (nx, ny) = (usize::from(to.x), usize::from(to.y));
        let width = usize::from(self.size.0);

        let mover = self.grid[y][x]
            .as_mut()
            .expect("move origin must hold a piece");
        let mover_letter = mover.letter();
        let is_pawn = mover.is_pawn_class();
        let is_king = mover.is_king();
        let is_rook = mover_letter == 'R';
        mover.moves_played += 1;
        mover.distance_travelled += mv.distance;

        if mv.is_castling() {
            let rook_from = usize::from(mv.info.expect("castling stores the rook origin").x);
            let king = self.grid[y][x].take();
            let mut rook = self.grid[y][rook_from].take();
            self.grid[y][nx] = king;
            // Kingside rook lands one file inside the king, queenside one
            // file outside; in Chess960 the rook may not move at all.
            let new_rook_file = if mv.is_queenside_castling() { nx + 1 } else { nx - 1 };
            if let Some(rook) = rook.as_mut() {
                rook.distance_travelled += new_rook_file.abs_diff(rook_from) as f64;
            }
            self.grid[y][new_rook_file] = rook;
        } else {
            self.grid[ny][nx] = self.grid[y][x].take();
        }

        if is_pawn {
            if let Some(eq) = mv.name.find('=') {
                let promote = mv.name[eq + 1..]
                    .chars()
                    .next()
                    .expect("promotion names carry the piece letter");
                if let Some(pawn) = self.grid[ny][nx].take() {
                    self.grid[ny][nx] = Some(pawn.promoted_to(promote));
                }
                mv.promoted_from = Some(mover_letter);
            }
            if from.y.abs_diff(to.y) == 2 {
                // The passed-over square, midway along the (possibly
                // diagonal) double step.
                self.en_passant = Some(Coord::new(
                    ((u16::from(from.x) + u16::from(to.x)) / 2) as u8,
                    ((u16::from(from.y) + u16::from(to.y)) / 2) as u8,
                ));
            } else {
                if let Some(taken) = mv.info {
                    *self.square_mut(taken) = None;
                }
                self.en_passant = None;
            }
        } else {
            self.en_passant = None;
        }

        if !self.castling.is_empty() {
            let mut revoke = CastlingRights::empty();
            if is_king {
                revoke |= CastlingRights::of(mv.side);
            }
            if is_rook
                && self.grid[ny][nx]
                    .as_ref()
                    .is_some_and(|rook| rook.moves_played == 1)
            {
                // The rook's first move loses the right on its side of the
                // king.
                for kx in 0..width {
                    if is_unmoved_letter(&self.grid[y][kx], 'K', mv.side, false) {
                        revoke |= if x > kx {
                            CastlingRights::single(mv.side, CastlingSide::Kingside)
                        } else {
                            CastlingRights::single(mv.side, CastlingSide::Queenside)
                        };
                    }
                }
            }
            if let Some(captured) = mv.capture.as_ref().filter(|c| c.moves_played == 0) {
                if let Some(victim) = captured.side() {
                    if captured.is_king() {
                        revoke |= CastlingRights::of(victim);
                    } else if captured.letter() == 'R' {
                        // Chess960-safe: the lost right is the captured
                        // rook's side of the victim's king, unless another
                        // eligible rook still sits between the king and the
                        // board edge there.
                        for kx in 0..width {
                            if !is_unmoved_letter(&self.grid[ny][kx], 'K', victim, true) {
                                continue;
                            }
                            if kx > nx {
                                if (0..kx)
                                    .all(|rx| !is_unmoved_letter(&self.grid[ny][rx], 'R', victim, true))
                                {
                                    revoke |=
                                        CastlingRights::single(victim, CastlingSide::Queenside);
                                }
                            } else if ((kx + 1)..width)
                                .all(|rx| !is_unmoved_letter(&self.grid[ny][rx], 'R', victim, true))
                            {
                                revoke |= CastlingRights::single(victim, CastlingSide::Kingside);
                            }
                            break;
                        }
                    }
                }
            }
            self.castling -= revoke;
        }

        if is_pawn || mv.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if mv.side == Side::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = mv.side.opponent();
        let kind = mv.kind;
        let mover_side = mv.side;
        let name = mv.name.clone();
        self.history.push(mv);

        if update_legal {
            if self.undone.last().is_some_and(|u| u.name == name) {
                let _ = self.undone.pop();
            } else {
                self.undone.clear();
            }
            match kind {
                MoveKind::Checkmate => {
                    let result = if mover_side == Side::White { "1-0" } else { "0-1" };
                    self.finish_game(result, &kind.to_string());
                }
                MoveKind::Stalemate
                | MoveKind::InsufficientMaterial
                | MoveKind::FiftyMove
                | MoveKind::Repetition => {
                    self.finish_game("1/2-1/2", &kind.to_string());
                }
                MoveKind::Normal => {}
            }
            self.refresh_legal();
        }
    }

    /// Reverses the last move exactly. The inverse of [`Board::apply`].
    pub(crate) fn revert(&mut self, update_legal: bool) -> Option<Move> {
        let mv = self.history.pop()?;
        let (x, y) = (usize::from(mv.from.x), usize::from(mv.from.y));
        let (nx, ny) = (usize::from(mv.to.x), usize::from(mv.to.y));

        if mv.is_castling() {
            let rook_from = usize::from(mv.info.expect("castling stores the rook origin").x);
            let new_rook_file = if mv.is_queenside_castling() { nx + 1 } else { nx - 1 };
            let mut king = self.grid[y][nx].take();
            let mut rook = self.grid[y][new_rook_file].take();
            if let Some(king) = king.as_mut() {
                king.moves_played -= 1;
                king.distance_travelled -= mv.distance;
            }
            if let Some(rook) = rook.as_mut() {
                rook.distance_travelled -= new_rook_file.abs_diff(rook_from) as f64;
            }
            self.grid[y][x] = king;
            self.grid[y][rook_from] = rook;
        } else {
            let mut piece = self.grid[ny][nx].take();
            if let Some(piece) = piece.as_mut() {
                piece.moves_played -= 1;
                piece.distance_travelled -= mv.distance;
            }
            if mv.is_promotion() {
                piece = piece.map(|p| p.promoted_to(mv.promoted_from.unwrap_or('P')));
            }
            self.grid[y][x] = piece;
            if let Some(captured) = mv.capture.clone() {
                match mv.info {
                    // En passant: the captured pawn returns beside the
                    // mover, not on the destination square.
                    Some(taken) => *self.square_mut(taken) = Some(captured),
                    None => self.grid[ny][nx] = Some(captured),
                }
            }
        }

        self.side_to_move = mv.side;
        self.castling = mv.castling;
        self.en_passant = mv.en_passant;
        self.halfmove_clock = mv.halfmove_clock;
        self.fullmove_number = mv.fullmove_number;
        self.evaluation = mv.evaluation;

        if update_legal {
            self.reopen_game();
            self.undone.push(mv.clone());
            self.refresh_legal();
        }
        Some(mv)
    }

    pub(crate) fn finish_game(&mut self, result: &str, termination: &str) {
        let _ = self
            .tag_pairs
            .insert("Result".to_string(), result.to_string());
        let _ = self
            .tag_pairs
            .insert("Termination".to_string(), termination.to_string());
        let _ = self.tag_pairs.insert(
            "EndTime".to_string(),
            Local::now().format("%H:%M:%S").to_string(),
        );
    }

    pub(crate) fn refresh_legal(&mut self) {
        let moves = self.generate(GenLevel::Full);
        self.legal_moves = moves;
    }

    /// Counts the leaf nodes of the move tree `depth` plies deep. The
    /// standard benchmark for generator correctness.
    #[must_use]
    pub fn perft(&mut self, depth: u8) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = self.generate(GenLevel::Annotated);
        if depth == 1 {
            return moves.len() as u64;
        }
        let mut nodes = 0;
        for mv in moves {
            self.apply(mv, false);
            nodes += self.perft(depth - 1);
            let _ = self.revert(false);
        }
        nodes
    }
}

fn empty_grid(size: (u8, u8)) -> Vec<Vec<Option<Piece>>> {
    vec![vec![None; usize::from(size.0)]; usize::from(size.1)]
}

fn parse_size(dimensions: &str) -> Option<(u8, u8)> {
    let (width, height) = dimensions.split_once('x')?;
    Some((width.parse().ok()?, height.parse().ok()?))
}

/// Whether the square holds an unmoved piece with the given letter and
/// owner. With `exact_moves_zero` the piece must never have moved;
/// otherwise any move count qualifies.
fn is_unmoved_letter(
    square: &Option<Piece>,
    letter: char,
    side: Side,
    exact_moves_zero: bool,
) -> bool {
    square.as_ref().is_some_and(|piece| {
        piece.letter() == letter
            && piece.side() == Some(side)
            && (!exact_moves_zero || piece.moves_played == 0)
    })
}

/// Draws a Chess960 back rank: opposite-coloured bishops, queen and
/// knights on random remaining squares, king between the rooks.
fn chess960_backrank(rng: &mut impl Rng) -> [char; 8] {
    let mut rank = [' '; 8];
    rank[rng.gen_range(0..4) * 2] = 'B';
    rank[rng.gen_range(0..4) * 2 + 1] = 'B';
    let mut empty: Vec<usize> = (0..8).filter(|&i| rank[i] == ' ').collect();
    empty.shuffle(rng);
    for (square, piece) in empty.iter().take(3).zip(['Q', 'N', 'N']) {
        rank[*square] = piece;
    }
    let mut rest: Vec<usize> = (0..8).filter(|&i| rank[i] == ' ').collect();
    rest.sort_unstable();
    for (square, piece) in rest.iter().zip(['R', 'K', 'R']) {
        rank[*square] = piece;
    }
    rank
}

impl fmt::Display for Board {
    /// The position in Forsyth-Edwards Notation.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.fen())
    }
}

impl fmt::Debug for Board {
    /// Human-readable dump: `.` per empty square, FEN letters for pieces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.grid {
            for square in row {
                match square {
                    Some(piece) => write!(f, "{}", piece.fen_letter()),
                    None => f.write_char('.'),
                }?;
                f.write_char(' ')?;
            }
            f.write_char('\n')?;
        }
        writeln!(f, "side to move: {}", self.side_to_move)?;
        writeln!(f, "castling: {}", self.castling)?;
        writeln!(f, "FEN: {self}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn standard_setup() {
        let board = Board::default();
        assert_eq!(board.size(), (8, 8));
        assert_eq!(board.variant(), "Standard");
        assert_eq!(
            board.to_string(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        assert_eq!(board.legal_moves().len(), 20);
        assert!(board.tag("Variant").is_none());
        assert_eq!(board.result(), "*");
    }

    #[test]
    fn chess960_setup_is_constrained() {
        for _ in 0..20 {
            let board = Board::new("Chess960");
            assert_eq!(board.tag("Variant"), Some("Chess960"));
            assert_eq!(board.tag("SetUp"), Some("1"));
            let backrank: Vec<char> = (0..8)
                .map(|x| board.at(Coord::new(x, 7)).unwrap().letter())
                .collect();
            let bishops: Vec<usize> = (0..8).filter(|&i| backrank[i] == 'B').collect();
            assert_eq!(bishops.len(), 2);
            assert_ne!(bishops[0] % 2, bishops[1] % 2, "{backrank:?}");
            let rooks: Vec<usize> = (0..8).filter(|&i| backrank[i] == 'R').collect();
            let king = backrank.iter().position(|&c| c == 'K').unwrap();
            assert!(rooks[0] < king && king < rooks[1], "{backrank:?}");
            // Both armies mirror each other.
            for x in 0..8u8 {
                assert_eq!(
                    board.at(Coord::new(x, 0)).unwrap().letter(),
                    board.at(Coord::new(x, 7)).unwrap().letter()
                );
            }
        }
    }

    #[test]
    fn rectangular_and_duck_boards() {
        let tall = Board::new("8x12");
        assert_eq!(tall.size(), (8, 12));
        assert!(tall.at(Coord::new(0, 0)).is_some());
        assert!(tall.at(Coord::new(0, 1)).is_some());
        assert!(tall.at(Coord::new(0, 5)).is_none());

        let ducks = Board::new("Duckboard4x6");
        assert_eq!(ducks.size(), (4, 6));
        for y in 0..6 {
            for x in 0..4 {
                let duck = ducks.at(Coord::new(x, y)).unwrap();
                assert_eq!(duck.data().name, "duck");
                assert_eq!(duck.side(), None);
            }
        }
        // Nothing can move on a board full of obstacles.
        assert!(ducks.legal_moves().is_empty());
    }

    #[test]
    fn custom_backrank() {
        let board = Board::new("[AEHM]");
        assert_eq!(board.size(), (4, 8));
        assert_eq!(board.at(Coord::new(0, 7)).unwrap().data().name, "amazon");
        assert_eq!(board.at(Coord::new(3, 0)).unwrap().data().name, "general");
        assert_eq!(board.at(Coord::new(1, 1)).unwrap().letter(), 'P');
        assert_eq!(board.tag("SetUp"), Some("1"));
    }

    #[test]
    fn empty_and_unknown_variants() {
        let empty = Board::new("Empty");
        assert!(empty.legal_moves().is_empty());
        assert_eq!(empty.size(), (8, 8));
        let unknown = Board::new("Atomic");
        assert_eq!(unknown.variant(), "Atomic");
        assert!(unknown.legal_moves().is_empty());
    }

    #[test]
    fn fen_in_place_of_variant() {
        let board = Board::new("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(board.variant(), "Standard");
        assert_eq!(board.legal_moves().len(), 20);
    }

    #[test]
    fn make_then_undo_restores_everything() {
        let mut board = Board::default();
        let fen_before = board.to_string();
        let key_before = board.position_key();

        board.play_san("e4").unwrap();
        assert_eq!(board.en_passant(), Coord::parse("e3", 8).ok());
        assert_eq!(board.side_to_move(), Side::Black);
        assert_eq!(board.history().len(), 1);

        let undone = board.undo().unwrap();
        assert_eq!(undone.name, "e4");
        assert_eq!(board.to_string(), fen_before);
        assert_eq!(board.position_key(), key_before);
        assert_eq!(board.at(Coord::parse("e2", 8).unwrap()).unwrap().moves_played, 0);
        assert_eq!(board.undone().len(), 1);
    }

    #[test]
    fn redo_replays_and_consumes_the_stack() {
        let mut board = Board::default();
        board.play_san("e4").unwrap();
        board.play_san("e5").unwrap();
        let after_two = board.to_string();

        board.undo().unwrap();
        board.undo().unwrap();
        assert_eq!(board.undone().len(), 2);

        board.redo().unwrap();
        board.redo().unwrap();
        assert_eq!(board.to_string(), after_two);
        assert!(board.undone().is_empty());
    }

    #[test]
    fn diverging_move_invalidates_redo() {
        let mut board = Board::default();
        board.play_san("e4").unwrap();
        board.undo().unwrap();
        board.play_san("d4").unwrap();
        assert!(board.undone().is_empty());
    }

    #[test]
    fn castling_both_sides() {
        let mut board = Board::default();
        board
            .load_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1")
            .unwrap();

        board.play_san("O-O").unwrap();
        assert_eq!(board.at(Coord::parse("g1", 8).unwrap()).unwrap().letter(), 'K');
        assert_eq!(board.at(Coord::parse("f1", 8).unwrap()).unwrap().letter(), 'R');
        assert!(board.at(Coord::parse("e1", 8).unwrap()).is_none());
        assert!(board.at(Coord::parse("h1", 8).unwrap()).is_none());
        assert_eq!(
            board.castling(),
            CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE
        );

        board.play_san("O-O-O").unwrap();
        assert_eq!(board.at(Coord::parse("c8", 8).unwrap()).unwrap().letter(), 'K');
        assert_eq!(board.at(Coord::parse("d8", 8).unwrap()).unwrap().letter(), 'R');
        assert_eq!(board.castling(), CastlingRights::empty());

        // Undo restores the rights letter by letter.
        board.undo().unwrap();
        assert_eq!(
            board.castling(),
            CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE
        );
        board.undo().unwrap();
        assert_eq!(board.castling(), CastlingRights::all());
        assert_eq!(
            board.to_string(),
            "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1"
        );
    }

    #[test]
    fn rook_capture_loses_the_right() {
        let mut board = Board::default();
        board
            .load_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1")
            .unwrap();
        board.play_san("Rxa8+").unwrap();
        assert!(!board.castling().contains(CastlingRights::BLACK_QUEENSIDE));
        assert!(board.castling().contains(CastlingRights::BLACK_KINGSIDE));
        // White's own queenside rook moved away as well.
        assert!(!board.castling().contains(CastlingRights::WHITE_QUEENSIDE));
        assert!(board.castling().contains(CastlingRights::WHITE_KINGSIDE));
    }

    #[test]
    fn illegal_requests_are_rejected() {
        let mut board = Board::default();
        assert!(matches!(board.play_san("e5"), Err(Error::IllegalMove(_))));
        assert!(matches!(board.play_san("x"), Err(Error::IllegalMove(_))));
        assert!(matches!(board.play_san("Ke2"), Err(Error::IllegalMove(_))));
        // The board is untouched.
        assert_eq!(board.history().len(), 0);
        assert_eq!(
            board.to_string(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn clones_are_independent() {
        let mut board = Board::default();
        board.play_san("e4").unwrap();
        let mut copy = board.clone();
        copy.play_san("e5").unwrap();
        assert_eq!(board.history().len(), 1);
        assert_eq!(copy.history().len(), 2);
    }

    #[test]
    fn promotion_round_trip_keeps_counters() {
        let mut board = Board::default();
        board.load_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let pawn_square = Coord::parse("a7", 8).unwrap();
        let moves_before = board.at(pawn_square).unwrap().moves_played;

        board.play_san("a8=Q").unwrap();
        let queen = board.at(Coord::parse("a8", 8).unwrap()).unwrap();
        assert_eq!(queen.letter(), 'Q');
        assert_eq!(queen.moves_played, moves_before + 1);

        board.undo().unwrap();
        let pawn = board.at(pawn_square).unwrap();
        assert_eq!(pawn.letter(), 'P');
        assert_eq!(pawn.moves_played, moves_before);
    }
}
