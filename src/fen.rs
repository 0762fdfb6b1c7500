//! Forsyth-Edwards Notation: emitting and loading positions, including
//! rectangular boards and the fairy catalogue.
//!
//! The parser is deliberately forgiving, the way the original position
//! loader was: short rows are padded, missing or malformed trailing fields
//! fall back to `w`, `-`, `-`, `0`, `1`, and unknown piece letters load as
//! inert `unknown` pieces. Only a missing piece placement is an error, and
//! it leaves the board in the freshly reset state.

use anyhow::{anyhow, bail};
use itertools::Itertools;
use log::debug;

use crate::board::Board;
use crate::catalog::Piece;
use crate::core::{CastlingRights, Coord, Side};
use crate::Error;

impl Board {
    /// The position in Forsyth-Edwards Notation: placement, side to move,
    /// castling, en passant, halfmove clock, fullmove number. Empty squares
    /// are run-length encoded greedily from the board width down.
    #[must_use]
    pub fn fen(&self) -> String {
        let mut placement = self
            .grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|square| square.as_ref().map_or(' ', Piece::fen_letter))
                    .collect::<String>()
            })
            .join("/");
        for run in (1..=usize::from(self.width())).rev() {
            placement = placement.replace(&" ".repeat(run), &run.to_string());
        }
        format!(
            "{placement} {} {} {} {} {}",
            self.side_to_move,
            self.castling,
            self.en_passant
                .map_or_else(|| "-".to_string(), |sq| sq.algebraic(self.height())),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Loads a position from FEN, replacing the whole game state. The
    /// variant is classified from the piece letters (`Standard`, `Fairy`
    /// or `Bad number of kings`), `SetUp`/`FEN` tag pairs are stamped, and
    /// a position with no legal moves gets its result recorded right away.
    ///
    /// # Errors
    ///
    /// [`Error::Parse`] when the placement field is missing or oversized;
    /// the board is left in the reset (empty) state.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), Error> {
        self.reset();
        if let Err(error) = self.parse_fen(fen) {
            debug!("FEN rejected: {error:#}");
            self.refresh_legal();
            return Err(Error::Parse(error));
        }

        self.classify_variant();
        if self.variant == "Standard" {
            let _ = self.tag_pairs.shift_remove("Variant");
        } else {
            let _ = self
                .tag_pairs
                .insert("Variant".to_string(), self.variant.clone());
        }
        let _ = self.tag_pairs.insert("SetUp".to_string(), "1".to_string());
        let _ = self.tag_pairs.insert("FEN".to_string(), self.fen());

        self.refresh_legal();
        if self.legal_moves.is_empty() {
            let defender = self.side_to_move;
            if self.gives_check(defender.opponent()) {
                let result = if defender == Side::Black { "1-0" } else { "0-1" };
                self.finish_game(result, "checkmate");
            } else {
                self.finish_game("1/2-1/2", "stalemate");
            }
        }
        Ok(())
    }

    fn parse_fen(&mut self, fen: &str) -> anyhow::Result<()> {
        let mut fields = fen.split_whitespace();
        let placement = fields
            .next()
            .ok_or_else(|| anyhow!("missing piece placement"))?;

        let mut rows: Vec<Vec<Option<Piece>>> = vec![Vec::new()];
        let mut run = String::new();
        for symbol in placement.chars() {
            if symbol.is_ascii_digit() {
                run.push(symbol);
                continue;
            }
            if !run.is_empty() {
                let empties: usize = run.parse()?;
                let row = rows.last_mut().expect("rows never empty");
                row.extend(std::iter::repeat_with(|| None).take(empties));
                run.clear();
            }
            if symbol == '/' {
                rows.push(Vec::new());
            } else {
                rows.last_mut()
                    .expect("rows never empty")
                    .push(Some(Piece::from_letter(symbol)));
            }
        }
        if !run.is_empty() {
            let empties: usize = run.parse()?;
            let row = rows.last_mut().expect("rows never empty");
            row.extend(std::iter::repeat_with(|| None).take(empties));
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let height = rows.len();
        if width == 0 {
            bail!("empty piece placement: {placement}");
        }
        if width > usize::from(u8::MAX) || height > usize::from(u8::MAX) {
            bail!("board too large: {width}x{height}");
        }
        for row in &mut rows {
            row.resize_with(width, || None);
        }
        self.size = (width as u8, height as u8);
        self.grid = rows;

        // Everything after the placement is defaulted rather than rejected.
        self.side_to_move = match fields.next() {
            Some("b") => Side::Black,
            _ => Side::White,
        };
        self.castling = fields
            .next()
            .and_then(|castling| CastlingRights::try_from(castling).ok())
            .unwrap_or_else(CastlingRights::empty);
        self.en_passant = fields
            .next()
            .filter(|square| *square != "-")
            .and_then(|square| Coord::parse(square, self.size.1).ok());
        self.halfmove_clock = fields.next().and_then(|n| n.parse().ok()).unwrap_or(0);
        self.fullmove_number = fields.next().and_then(|n| n.parse().ok()).unwrap_or(1);
        Ok(())
    }

    /// `Standard` needs exactly the six standard piece kinds and one king a
    /// side; a wrong king count trumps everything else.
    fn classify_variant(&mut self) {
        let mut white_kings = 0u32;
        let mut black_kings = 0u32;
        let mut standard_letters = true;
        for row in &self.grid {
            for piece in row.iter().flatten() {
                if !"KQRBNP".contains(piece.letter()) {
                    standard_letters = false;
                }
                if piece.is_king() {
                    match piece.side() {
                        Some(Side::White) => white_kings += 1,
                        Some(Side::Black) => black_kings += 1,
                        None => {}
                    }
                }
            }
        }
        self.variant = if white_kings != 1 || black_kings != 1 {
            "Bad number of kings".to_string()
        } else if standard_letters {
            "Standard".to_string()
        } else {
            "Fairy".to_string()
        };
    }
}
