//! Rules-complete, variant-aware chess core: a board state machine that
//! generates legal moves, applies and reverses them, detects every
//! termination condition and serializes positions (FEN) and games (PGN).
//!
//! The same machinery drives the standard 8×8 game, Chess960, rectangular
//! boards, duck-filled boards, custom back-rank setups and a catalogue of
//! fairy pieces with parameterized movement (leapers, riders, limited
//! rangers, hoppers and several pawn families).
//!
//! The crate deliberately contains no search or evaluation of its own;
//! [`engine`] speaks the UCI text protocol to an external process and maps
//! its answers back onto [`Board`] state.

#![warn(missing_docs, variant_size_differences)]
// Rustc lints.
#![warn(
    absolute_paths_not_starting_with_crate,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications
)]
// Rustdoc lints.
#![warn(
    rustdoc::private_doc_tests,
    rustdoc::broken_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_html_tags,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::bare_urls
)]
// Clippy lints.
#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::pedantic
)]

pub mod board;
pub mod catalog;
pub mod core;
pub mod engine;
pub mod fen;
pub mod hash;
pub mod movegen;
pub mod moves;
pub mod pgn;

pub use crate::board::Board;
pub use crate::core::{CastlingRights, CastlingSide, Coord, Score, Side};
pub use crate::moves::{Move, MoveKind};

/// The ways a request to this crate can fail. Internal invariants are
/// enforced by construction; these cover user-facing failures only.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested move is not in the current set of legal moves, or the
    /// move string is malformed.
    #[error("illegal move: {0}")]
    IllegalMove(String),
    /// Malformed FEN or PGN input. The board is left in the documented
    /// recovery state (reset for FEN, applied prefix for PGN).
    #[error("parse error: {0}")]
    Parse(anyhow::Error),
    /// The external engine process could not be launched or spoken to. The
    /// caller receives no move and decides whether to fall back.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(anyhow::Error),
}
