//! Position fingerprinting for threefold-repetition detection.
//!
//! The fingerprint is an exact field tuple rather than a folded integer
//! hash: two positions compare equal if and only if the repetition-relevant
//! state is equal, so the detector can never report a false repetition.

use crate::board::Board;
use crate::catalog::Reach;
use crate::core::{CastlingRights, Coord, Side};

/// Everything that distinguishes two positions for repetition purposes:
/// side to move, piece placement, castling rights and the en-passant
/// target — the latter only when some enemy pawn could actually use it,
/// so an unreachable en-passant square does not spuriously break a
/// repetition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PositionKey {
    side_to_move: Side,
    placement: String,
    castling: CastlingRights,
    en_passant: Option<Coord>,
}

impl Board {
    /// Fingerprints the current position.
    #[must_use]
    pub fn position_key(&self) -> PositionKey {
        PositionKey {
            side_to_move: self.side_to_move(),
            placement: self.placement_letters(),
            castling: self.castling(),
            en_passant: self.relevant_en_passant(),
        }
    }

    /// Concatenation of piece letters row-major, with a space per empty
    /// square.
    fn placement_letters(&self) -> String {
        let (width, height) = self.size();
        let mut letters = String::with_capacity(usize::from(width) * usize::from(height));
        for y in 0..height {
            for x in 0..width {
                letters.push(
                    self.at(Coord::new(x, y))
                        .map_or(' ', crate::catalog::Piece::fen_letter),
                );
            }
        }
        letters
    }

    /// The en-passant target, suppressed unless a pawn of the side to move
    /// stands where one of its capture directions reaches the target.
    fn relevant_en_passant(&self) -> Option<Coord> {
        let target = self.en_passant()?;
        let (width, height) = self.size();
        let forward = self.side_to_move().forward();
        for y in 0..height {
            for x in 0..width {
                let square = Coord::new(x, y);
                let Some(piece) = self.at(square) else {
                    continue;
                };
                if piece.side() != Some(self.side_to_move()) || !piece.is_pawn_class() {
                    continue;
                }
                for vector in piece.data().movement {
                    if !matches!(vector.reach, Reach::PawnCapture | Reach::PawnDual) {
                        continue;
                    }
                    let files: &[i16] = if vector.a == 0 { &[0] } else { &[-1, 1] };
                    for &dx in files {
                        if square.offset(dx, forward, width, height) == Some(target) {
                            return Some(target);
                        }
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::board::Board;

    #[test]
    fn keys_equal_for_transposed_positions() {
        let mut direct = Board::default();
        direct.play_san("Nf3").unwrap();
        direct.play_san("Nf6").unwrap();

        let mut detour = Board::default();
        detour.play_san("Nf3").unwrap();
        detour.play_san("Nf6").unwrap();
        detour.play_san("Ng1").unwrap();
        detour.play_san("Ng8").unwrap();
        detour.play_san("Nf3").unwrap();
        detour.play_san("Nf6").unwrap();

        assert_eq!(direct.position_key(), detour.position_key());
    }

    #[test]
    fn side_to_move_distinguishes() {
        let mut board = Board::default();
        let before = board.position_key();
        board.play_san("Nf3").unwrap();
        assert_ne!(before, board.position_key());
    }

    #[test]
    fn unreachable_en_passant_is_ignored() {
        // After 1. e4, Black has no pawn next to e3: the en-passant target
        // must not enter the fingerprint.
        let mut board = Board::default();
        board.play_san("e4").unwrap();
        let key_with_ep = board.position_key();

        let mut board = Board::default();
        board.load_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
            .unwrap();
        assert_eq!(key_with_ep, board.position_key());
    }

    #[test]
    fn reachable_en_passant_matters() {
        // A black pawn on d4 can take e3 en passant: the target counts.
        let mut with_ep = Board::default();
        with_ep
            .load_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
            .unwrap();
        let mut without_ep = Board::default();
        without_ep
            .load_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
            .unwrap();
        assert_ne!(with_ep.position_key(), without_ep.position_key());
    }
}
