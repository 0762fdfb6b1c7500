//! Portable Game Notation: emitting the current game and replaying a
//! recorded one.
//!
//! The reader accepts the common extras — `{…}` comments with `\{`/`\\`
//! escapes, parenthesized variations, `$N` annotation glyphs, `!?`-style
//! suffixes — and applies the remaining SAN tokens through the legal-move
//! list. A token that resolves to no legal move aborts the parse, leaving
//! the successfully applied prefix on the board; callers that need
//! atomicity snapshot the board themselves.

use anyhow::anyhow;
use log::debug;

use crate::board::Board;
use crate::core::Side;
use crate::Error;

/// Result tokens that end a PGN movetext section.
const RESULT_TOKENS: [&str; 3] = ["1-0", "0-1", "1/2-1/2"];

impl Board {
    /// The game in Portable Game Notation: every tag pair in insertion
    /// order, a blank line, then the numbered movetext with a trailing
    /// result token. Castling is rendered with the letter `O`; a game
    /// starting from a setup position (Black to move, or a later move
    /// number) gets a `..` placeholder and numbering derived from the
    /// starting FEN.
    #[must_use]
    pub fn pgn(&self) -> String {
        let mut out = String::new();
        for (tag, value) in &self.tag_pairs {
            out.push_str(&format!("[{tag} \"{value}\"]\n"));
        }
        out.push('\n');

        let mut text = String::new();
        let mut moves = self.history.iter();
        let mut number = self
            .history
            .first()
            .map_or(self.fullmove_number, |first| first.fullmove_number);
        let black_first = self
            .history
            .first()
            .is_some_and(|first| first.side == Side::Black);
        if black_first {
            if let Some(reply) = moves.next() {
                text.push_str(&format!("{number}. .. {} ", reply.name));
                number += 1;
            }
        }
        while let Some(white) = moves.next() {
            match moves.next() {
                Some(black) => {
                    text.push_str(&format!("{number}. {} {} ", white.name, black.name));
                }
                None => text.push_str(&format!("{number}. {} ", white.name)),
            }
            number += 1;
        }
        let text = text.replace("0-0-0", "O-O-O").replace("0-0", "O-O");

        out.push_str(&text);
        out.push_str(self.result());
        out
    }

    /// Replays a game from PGN. The board is rebuilt from the `FEN` tag if
    /// present (standard start otherwise), the tag pairs are adopted, and
    /// the movetext is applied move by move. A recognized final result
    /// token sets `Result` and freezes the legal-move output.
    ///
    /// # Errors
    ///
    /// [`Error::Parse`] when the starting FEN is malformed or a move token
    /// cannot be resolved against the legal moves; already applied moves
    /// remain on the board.
    pub fn load_pgn(&mut self, pgn: &str) -> Result<(), Error> {
        let mut tags: Vec<(String, String)> = Vec::new();
        let mut movetext = String::new();
        for line in pgn.lines() {
            let trimmed = line.trim();
            if movetext.is_empty() && trimmed.starts_with('[') && trimmed.ends_with(']') {
                if let Some((name, value)) = parse_tag_pair(trimmed) {
                    tags.push((name, value));
                    continue;
                }
            }
            if !trimmed.is_empty() {
                movetext.push_str(line);
                movetext.push(' ');
            }
        }

        let start_fen = tags
            .iter()
            .find(|(name, _)| name == "FEN")
            .map(|(_, value)| value.clone());
        match start_fen {
            Some(fen) => self.load_fen(&fen)?,
            None => *self = Self::new("Standard"),
        }
        // Adopt the recorded tags, but hold the result back: setting it
        // early would freeze move generation mid-replay.
        let mut recorded_result = None;
        for (name, value) in tags {
            if name == "Result" {
                recorded_result = Some(value);
            } else {
                self.set_tag(&name, &value);
            }
        }

        let cleaned = strip_variations(&strip_comments(&movetext));
        let mut final_result = None;
        for token in cleaned.split_whitespace() {
            if RESULT_TOKENS.contains(&token) {
                final_result = Some(token.to_string());
                break;
            }
            if token == "*" {
                break;
            }
            if token.starts_with('$') {
                continue;
            }
            let numberless = token.trim_end_matches('.');
            if numberless.is_empty() || numberless.parse::<u32>().is_ok() {
                continue;
            }
            let san = token.trim_end_matches(['!', '?']);
            if san.is_empty() {
                continue;
            }
            if let Err(error) = self.play_san(san) {
                debug!("PGN aborted at token {token:?}: {error}");
                return Err(Error::Parse(anyhow!("unresolvable move token: {token}")));
            }
        }

        if let Some(result) = final_result.or(recorded_result) {
            if RESULT_TOKENS.contains(&result.as_str()) {
                self.set_tag("Result", &result);
                self.refresh_legal();
            }
        }
        Ok(())
    }
}

/// Parses one `[Name "value"]` line.
fn parse_tag_pair(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let (name, rest) = inner.split_once(char::is_whitespace)?;
    let value = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((name.to_string(), value.to_string()))
}

/// Removes `{…}` comments. A backslash escapes the next character both
/// inside a comment (so `\}` does not close it) and outside (so `\{` does
/// not open one).
fn strip_comments(text: &str) -> String {
    let mut out = String::new();
    let mut chars = text.chars();
    let mut in_comment = false;
    while let Some(symbol) = chars.next() {
        if in_comment {
            match symbol {
                '\\' => {
                    let _ = chars.next();
                }
                '}' => {
                    in_comment = false;
                    out.push(' ');
                }
                _ => {}
            }
        } else {
            match symbol {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '{' => in_comment = true,
                _ => out.push(symbol),
            }
        }
    }
    out
}

/// Removes balanced parenthesized variations, however deeply nested.
fn strip_variations(text: &str) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for symbol in text.chars() {
        match symbol {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    out.push(' ');
                }
            }
            _ if depth == 0 => out.push(symbol),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn emits_tags_blank_line_and_moves() {
        let mut board = Board::default();
        for san in ["e4", "e5", "Nf3"] {
            board.play_san(san).unwrap();
        }
        let pgn = board.pgn();
        assert!(pgn.contains("[Event \"?\"]\n"));
        assert!(pgn.contains("[Result \"*\"]\n"));
        assert!(pgn.contains("\n\n"));
        assert!(pgn.ends_with("1. e4 e5 2. Nf3 *"), "{pgn}");
    }

    #[test]
    fn castling_is_rendered_with_letters() {
        let mut board = Board::default();
        board
            .load_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1")
            .unwrap();
        board.play_san("O-O").unwrap();
        board.play_san("O-O-O").unwrap();
        let pgn = board.pgn();
        assert!(pgn.contains("1. O-O O-O-O"), "{pgn}");
        assert!(!pgn.contains("0-0"), "{pgn}");
    }

    #[test]
    fn round_trip_preserves_history() {
        let mut board = Board::default();
        for san in ["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6"] {
            board.play_san(san).unwrap();
        }
        let pgn = board.pgn();

        let mut replayed = Board::default();
        replayed.load_pgn(&pgn).unwrap();
        assert_eq!(
            replayed
                .history()
                .iter()
                .map(|m| m.name.clone())
                .collect::<Vec<_>>(),
            board
                .history()
                .iter()
                .map(|m| m.name.clone())
                .collect::<Vec<_>>()
        );
        assert_eq!(replayed.fen(), board.fen());
    }

    #[test]
    fn comments_variations_and_glyphs_are_skipped() {
        let pgn = "[Event \"casual\"]\n\n1. e4 {king's pawn \\} still a comment} e5 \
                   (1... c5 2. Nf3 {sicilian}) 2. Nf3! $14 Nc6?! *";
        let mut board = Board::default();
        board.load_pgn(pgn).unwrap();
        let names: Vec<String> = board.history().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["e4", "e5", "Nf3", "Nc6"]);
        assert_eq!(board.tag("Event"), Some("casual"));
        assert_eq!(board.result(), "*");
    }

    #[test]
    fn result_token_sets_tag_and_freezes_moves() {
        let pgn = "1. f3 e5 2. g4 Qh4# 0-1";
        let mut board = Board::default();
        board.load_pgn(pgn).unwrap();
        assert_eq!(board.result(), "0-1");
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    fn setup_games_number_from_the_fen() {
        let mut board = Board::default();
        board
            .load_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 3")
            .unwrap();
        board.play_san("e5").unwrap();
        board.play_san("Nf3").unwrap();
        let pgn = board.pgn();
        assert!(pgn.contains("3. .. e5 4. Nf3"), "{pgn}");

        let mut replayed = Board::default();
        replayed.load_pgn(&pgn).unwrap();
        assert_eq!(replayed.fen(), board.fen());
        assert_eq!(replayed.history().len(), 2);
    }

    #[test]
    fn bad_move_token_aborts_leaving_prefix() {
        let pgn = "1. e4 e5 2. Ke7 d6";
        let mut board = Board::default();
        assert!(matches!(board.load_pgn(pgn), Err(Error::Parse(_))));
        let names: Vec<String> = board.history().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["e4", "e5"]);
    }

    #[test]
    fn comment_stripper_honours_escapes() {
        assert_eq!(strip_comments("a {x} b"), "a   b");
        assert_eq!(strip_comments("a {x \\} y} b"), "a   b");
        assert_eq!(strip_comments("a \\{ b"), "a { b");
        assert_eq!(strip_comments("a {x \\\\} b"), "a   b");
    }

    #[test]
    fn variation_stripper_balances_parens() {
        assert_eq!(strip_variations("a (b (c) d) e"), "a   e");
        assert_eq!(strip_variations("a (b c"), "a ");
    }
}
