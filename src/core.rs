//! Board-geometry primitives shared by the rest of the crate.
//!
//! Unlike fixed 8×8 engines, every type here is parameterized by the board
//! size: a [`Coord`] is a plain (file, row) pair and converting it to
//! algebraic notation needs the board height, because rank numbers count
//! from the bottom while rows are stored from the top.

use std::fmt;

use anyhow::bail;
use bitflags::bitflags;

use crate::Side::{Black, White};

/// One of the two players. Neutral obstacle pieces belong to neither side
/// and are represented with `Option<Side>::None` where it matters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    #[allow(missing_docs)]
    White,
    #[allow(missing_docs)]
    Black,
}

impl Side {
    /// The other player.
    #[must_use]
    pub fn opponent(self) -> Self {
        match self {
            White => Black,
            Black => White,
        }
    }

    /// Row delta of this side's forward pawn direction. Rows are stored
    /// top-down, so White moves toward smaller indices.
    #[must_use]
    pub fn forward(self) -> i16 {
        match self {
            White => -1,
            Black => 1,
        }
    }
}

impl TryFrom<&str> for Side {
    type Error = anyhow::Error;

    fn try_from(side: &str) -> anyhow::Result<Self> {
        match side {
            "w" => Ok(White),
            "b" => Ok(Black),
            _ => bail!("unknown side: expected 'w' or 'b', got '{side}'"),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                White => 'w',
                Black => 'b',
            }
        )
    }
}

/// A square on a (possibly rectangular) board.
///
/// `x` is the file index counted from the queenside, `y` the row index
/// counted from the top, so the standard Black back rank is row 0. The
/// algebraic form depends on the board height:
///
/// ```
/// use gryphon::Coord;
///
/// let e4 = Coord::new(4, 4);
/// assert_eq!(e4.algebraic(8), "e4");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Coord {
    #[allow(missing_docs)]
    pub x: u8,
    #[allow(missing_docs)]
    pub y: u8,
}

impl Coord {
    /// Connects a file and a row index to form a square.
    #[must_use]
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Renders the square in algebraic notation on a board `height` rows
    /// tall.
    #[must_use]
    pub fn algebraic(self, height: u8) -> String {
        format!("{}{}", file_letter(self.x), u16::from(height) - u16::from(self.y))
    }

    /// Parses an algebraic square such as `e4` on a board `height` rows
    /// tall.
    ///
    /// # Errors
    ///
    /// Fails on anything that is not a file letter followed by a rank
    /// number within the board.
    pub fn parse(square: &str, height: u8) -> anyhow::Result<Self> {
        let mut chars = square.chars();
        let file = match chars.next() {
            Some(c @ 'a'..='z') => c as u8 - b'a',
            _ => bail!("unknown square: expected file letter, got '{square}'"),
        };
        let rank: u16 = chars.as_str().parse()?;
        if rank == 0 || rank > u16::from(height) {
            bail!("unknown square: rank out of range in '{square}'");
        }
        Ok(Self::new(file, (u16::from(height) - rank) as u8))
    }

    /// Steps by `(dx, dy)`, returning `None` when the result leaves a
    /// `width` × `height` board.
    #[must_use]
    pub fn offset(self, dx: i16, dy: i16, width: u8, height: u8) -> Option<Self> {
        let x = i16::from(self.x) + dx;
        let y = i16::from(self.y) + dy;
        if (0..i16::from(width)).contains(&x) && (0..i16::from(height)).contains(&y) {
            Some(Self::new(x as u8, y as u8))
        } else {
            None
        }
    }

    /// Euclidean distance to `other`, used for the per-piece distance
    /// odometer.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

/// Lowercase letter of a file index.
#[must_use]
pub fn file_letter(x: u8) -> char {
    (b'a' + x) as char
}

bitflags! {
    /// Which castling moves are still available, one flag per side and
    /// wing. The FEN form is `KQkq` (any subset) or `-`.
    ///
    /// Rights only ever shrink across [`crate::Board::undo`]-free play; the
    /// piece move counters, not these flags, are the source of truth for
    /// rook/king eligibility after a custom setup.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CastlingRights: u8 {
        #[allow(missing_docs)]
        const WHITE_KINGSIDE = 0b0001;
        #[allow(missing_docs)]
        const WHITE_QUEENSIDE = 0b0010;
        #[allow(missing_docs)]
        const BLACK_KINGSIDE = 0b0100;
        #[allow(missing_docs)]
        const BLACK_QUEENSIDE = 0b1000;
    }
}

impl CastlingRights {
    /// Both flags belonging to one side.
    #[must_use]
    pub fn of(side: Side) -> Self {
        match side {
            White => Self::WHITE_KINGSIDE | Self::WHITE_QUEENSIDE,
            Black => Self::BLACK_KINGSIDE | Self::BLACK_QUEENSIDE,
        }
    }

    /// The flag for one side and wing.
    #[must_use]
    pub fn single(side: Side, wing: CastlingSide) -> Self {
        match (side, wing) {
            (White, CastlingSide::Kingside) => Self::WHITE_KINGSIDE,
            (White, CastlingSide::Queenside) => Self::WHITE_QUEENSIDE,
            (Black, CastlingSide::Kingside) => Self::BLACK_KINGSIDE,
            (Black, CastlingSide::Queenside) => Self::BLACK_QUEENSIDE,
        }
    }
}

impl TryFrom<&str> for CastlingRights {
    type Error = anyhow::Error;

    /// Parses the FEN castling field. `-` and the empty string mean no
    /// rights.
    fn try_from(fen: &str) -> anyhow::Result<Self> {
        if fen == "-" || fen.is_empty() {
            return Ok(Self::empty());
        }
        let mut rights = Self::empty();
        for symbol in fen.chars() {
            rights |= match symbol {
                'K' => Self::WHITE_KINGSIDE,
                'Q' => Self::WHITE_QUEENSIDE,
                'k' => Self::BLACK_KINGSIDE,
                'q' => Self::BLACK_QUEENSIDE,
                _ => bail!("unknown castling rights: {fen}"),
            };
        }
        Ok(rights)
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        for (flag, symbol) in [
            (Self::WHITE_KINGSIDE, 'K'),
            (Self::WHITE_QUEENSIDE, 'Q'),
            (Self::BLACK_KINGSIDE, 'k'),
            (Self::BLACK_QUEENSIDE, 'q'),
        ] {
            if self.contains(flag) {
                write!(f, "{symbol}")?;
            }
        }
        Ok(())
    }
}

/// The two castling wings. Kingside is `0-0`, queenside `0-0-0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastlingSide {
    #[allow(missing_docs)]
    Kingside,
    #[allow(missing_docs)]
    Queenside,
}

/// Position evaluation as reported by an external engine, always from
/// White's perspective.
///
/// `MateIn(n)` with positive `n` means White forces mate in `n`; negative
/// means Black does. A decided game is `Won`, which maps to ±∞ in the
/// float form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Score {
    /// Centipawn evaluation.
    Centipawns(i32),
    /// Forced mate in the given number of moves.
    MateIn(i16),
    /// The game is over and the given side has won.
    Won(Side),
}

impl Score {
    /// Collapses the score to a single float: pawns for centipawn scores,
    /// the (signed, whole) move count for forced mates, ±∞ for decided
    /// games.
    #[must_use]
    pub fn pawns(&self) -> f64 {
        match self {
            Self::Centipawns(cp) => f64::from(*cp) / 100.0,
            Self::MateIn(moves) => f64::from(*moves),
            Self::Won(White) => f64::INFINITY,
            Self::Won(Black) => f64::NEG_INFINITY,
        }
    }
}
