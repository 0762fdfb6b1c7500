//! Text-protocol client for an external UCI engine.
//!
//! The adapter owns a long-lived subprocess, lazily spawned on first use,
//! and enforces strict request/response pairing: one `go movetime` per
//! query, consumed up to the `bestmove` line. Scores are normalized to
//! White's perspective and written back into [`Board::evaluation`]; the
//! engine's long-algebraic move string is resolved against the board's
//! legal moves. Every failure surfaces as [`Error::EngineUnavailable`] and
//! the caller decides whether to fall back.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use log::{debug, warn};
use rand::Rng;

use crate::board::Board;
use crate::core::{file_letter, Score, Side};
use crate::moves::Move;
use crate::Error;

/// Per-query engine settings.
#[derive(Clone, Debug)]
pub struct SearchOptions {
    /// Thinking time per query, in milliseconds.
    pub movetime_ms: u64,
    /// Strength cap. `None` or anything above 2850 plays uncapped;
    /// otherwise strength limiting is enabled with the Elo clamped to at
    /// least 1350, the lowest the engine accepts.
    pub elo: Option<u32>,
    /// How many principal variations to request.
    pub multipv: u8,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            movetime_ms: 50,
            elo: None,
            multipv: 1,
        }
    }
}

/// One principal variation reported by the engine: the slot index, the
/// last score seen for it and the first move of the line.
#[derive(Clone, Debug, PartialEq, Eq)]
struct PvLine {
    multipv: u8,
    score: RawScore,
    first: String,
}

/// A score as the engine reports it, from the side to move's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RawScore {
    Cp(i32),
    Mate(i32),
}

impl RawScore {
    /// Total order with mates above and below every centipawn value, for
    /// picking best and worst lines.
    fn rank(self) -> i64 {
        match self {
            Self::Cp(value) => i64::from(value),
            Self::Mate(moves) if moves >= 0 => i64::MAX - i64::from(moves),
            Self::Mate(moves) => i64::MIN - i64::from(moves),
        }
    }
}

/// A UCI engine subprocess, spawned on first query.
pub struct Engine {
    path: PathBuf,
    process: Option<EngineProcess>,
}

struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Engine {
    /// Prepares an adapter for the engine binary at `path`. Nothing is
    /// launched until the first query.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            process: None,
        }
    }

    /// Asks the engine for the best move and records its evaluation on the
    /// board. Outside the `Standard` variant, or when no legal move
    /// exists, the engine is not consulted: the evaluation is derived from
    /// the game result instead and no move is returned.
    ///
    /// # Errors
    ///
    /// [`Error::EngineUnavailable`] when the process cannot be spawned or
    /// spoken to.
    pub fn best_move(
        &mut self,
        board: &mut Board,
        options: &SearchOptions,
    ) -> Result<Option<Move>, Error> {
        if let Some(settled) = settle_without_engine(board) {
            return Ok(settled);
        }
        let report = self.search(board, options)?;
        if let Some(main) = report
            .lines
            .iter()
            .find(|line| line.multipv == 1)
            .or_else(|| report.lines.first())
        {
            board.set_evaluation(Some(normalize(main.score, board.side_to_move())));
        }
        Ok(resolve_uci(board, &report.bestmove))
    }

    /// The worst engine line that still keeps the mover at least three
    /// pawns up; falls back to the best line when none qualifies.
    ///
    /// # Errors
    ///
    /// [`Error::EngineUnavailable`] on subprocess failure.
    pub fn taunter(
        &mut self,
        board: &mut Board,
        options: &SearchOptions,
    ) -> Result<Option<Move>, Error> {
        self.pick_line(board, options, |score| score.rank() >= 300)
    }

    /// The worst engine line that is not losing; falls back to the best
    /// line when everything loses.
    ///
    /// # Errors
    ///
    /// [`Error::EngineUnavailable`] on subprocess failure.
    pub fn drawfish(
        &mut self,
        board: &mut Board,
        options: &SearchOptions,
    ) -> Result<Option<Move>, Error> {
        self.pick_line(board, options, |score| score.rank() >= 0)
    }

    /// The absolute worst line the engine can find.
    ///
    /// # Errors
    ///
    /// [`Error::EngineUnavailable`] on subprocess failure.
    pub fn badfish(
        &mut self,
        board: &mut Board,
        options: &SearchOptions,
    ) -> Result<Option<Move>, Error> {
        self.pick_line(board, options, |_| true)
    }

    /// Randomly delegates to the strong or the weak settings with the
    /// given probability, and pads the total latency to at least 50 ms so
    /// instant replies do not look robotic.
    ///
    /// # Errors
    ///
    /// [`Error::EngineUnavailable`] on subprocess failure.
    pub fn percent_bot(
        &mut self,
        board: &mut Board,
        chance: f64,
        strong: &SearchOptions,
        weak: &SearchOptions,
    ) -> Result<Option<Move>, Error> {
        let started = Instant::now();
        let options = if rand::thread_rng().gen_bool(chance.clamp(0.0, 1.0)) {
            strong
        } else {
            weak
        };
        let answer = self.best_move(board, options);
        if let Some(remaining) = Duration::from_millis(50).checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
        answer
    }

    fn pick_line(
        &mut self,
        board: &mut Board,
        options: &SearchOptions,
        qualifies: impl Fn(RawScore) -> bool,
    ) -> Result<Option<Move>, Error> {
        if let Some(settled) = settle_without_engine(board) {
            return Ok(settled);
        }
        let report = self.search(board, options)?;
        let Some(chosen) = select_line(&report.lines, qualifies) else {
            return Ok(resolve_uci(board, &report.bestmove));
        };
        board.set_evaluation(Some(normalize(chosen.score, board.side_to_move())));
        Ok(resolve_uci(board, &chosen.first))
    }

    /// One full query: strength and MultiPV options, position, `go`, then
    /// reading until `bestmove` while tracking the latest score per PV
    /// slot. A broken pipe discards the subprocess so the next query
    /// relaunches it.
    fn search(&mut self, board: &Board, options: &SearchOptions) -> Result<SearchReport, Error> {
        let fen = board.fen();
        self.ensure_open()?;
        let process = self.process.as_mut().expect("just opened");
        let report = run_search(process, &fen, options);
        if report.is_err() {
            self.process = None;
        }
        report
    }

    /// Spawns the subprocess if needed and consumes its greeting line.
    fn ensure_open(&mut self) -> Result<(), Error> {
        if self.process.is_some() {
            return Ok(());
        }
        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|error| {
                warn!("failed to launch engine {}: {error}", self.path.display());
                Error::EngineUnavailable(
                    anyhow!(error).context(format!("spawning {}", self.path.display())),
                )
            })?;
        let stdin = child
            .stdin
            .take()
            .context("engine stdin unavailable")
            .map_err(Error::EngineUnavailable)?;
        let stdout = child
            .stdout
            .take()
            .context("engine stdout unavailable")
            .map_err(Error::EngineUnavailable)?;
        let mut stdout = BufReader::new(stdout);
        let mut greeting = String::new();
        let _ = stdout
            .read_line(&mut greeting)
            .map_err(|e| Error::EngineUnavailable(anyhow!(e).context("engine greeting")))?;
        debug!("engine -> {}", greeting.trim_end());
        self.process = Some(EngineProcess {
            child,
            stdin,
            stdout,
        });
        Ok(())
    }
}

fn run_search(
    process: &mut EngineProcess,
    fen: &str,
    options: &SearchOptions,
) -> Result<SearchReport, Error> {
    let io_error = |error: anyhow::Error| Error::EngineUnavailable(error);

    let mut commands = String::new();
    match options.elo {
        Some(elo) if elo <= 2850 => {
            commands.push_str("setoption name UCI_LimitStrength value true\n");
            commands.push_str(&format!("setoption name UCI_Elo value {}\n", elo.max(1350)));
        }
        _ => commands.push_str("setoption name UCI_LimitStrength value false\n"),
    }
    commands.push_str(&format!(
        "setoption name MultiPV value {}\n",
        options.multipv.max(1)
    ));
    commands.push_str(&format!("position fen {fen}\n"));
    commands.push_str(&format!("go movetime {}\n", options.movetime_ms));
    debug!("engine <- {commands}");
    process
        .stdin
        .write_all(commands.as_bytes())
        .and_then(|()| process.stdin.flush())
        .map_err(|e| io_error(anyhow!(e).context("writing to engine")))?;

    let mut lines: Vec<PvLine> = Vec::new();
    loop {
        let mut line = String::new();
        let read = process
            .stdout
            .read_line(&mut line)
            .map_err(|e| io_error(anyhow!(e).context("reading from engine")))?;
        if read == 0 {
            return Err(io_error(anyhow!("engine closed its output mid-search")));
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.first() {
            Some(&"bestmove") => {
                let bestmove = tokens
                    .get(1)
                    .ok_or_else(|| io_error(anyhow!("bestmove line without a move")))?;
                debug!("engine -> bestmove {bestmove}");
                return Ok(SearchReport {
                    lines,
                    bestmove: (*bestmove).to_string(),
                });
            }
            Some(&"info") => {
                if let Some(parsed) = parse_info(&tokens) {
                    match lines.iter_mut().find(|l| l.multipv == parsed.multipv) {
                        Some(slot) => *slot = parsed,
                        None => lines.push(parsed),
                    }
                }
            }
            _ => {}
        }
    }
}

struct SearchReport {
    lines: Vec<PvLine>,
    bestmove: String,
}

/// The first legal move, if any. The simplest possible opponent.
#[must_use]
pub fn first_move(board: &Board) -> Option<Move> {
    board.legal_moves().first().cloned()
}

/// A uniformly random legal move, if any.
#[must_use]
pub fn random_move(board: &Board) -> Option<Move> {
    use rand::seq::SliceRandom;
    board.legal_moves().choose(&mut rand::thread_rng()).cloned()
}

/// Decides queries that never reach the engine: non-standard variants and
/// finished games get their evaluation from the result tag and no move.
fn settle_without_engine(board: &mut Board) -> Option<Option<Move>> {
    if board.variant() == "Standard" && !board.legal_moves().is_empty() {
        return None;
    }
    let derived = match board.result() {
        "1-0" => Some(Score::Won(Side::White)),
        "0-1" => Some(Score::Won(Side::Black)),
        "1/2-1/2" => Some(Score::Centipawns(0)),
        _ => None,
    };
    if derived.is_some() {
        board.set_evaluation(derived);
    }
    Some(None)
}

/// Extracts the PV slot, score and first move from one `info` line.
fn parse_info(tokens: &[&str]) -> Option<PvLine> {
    let value_after = |name: &str| {
        tokens
            .iter()
            .position(|t| *t == name)
            .and_then(|i| tokens.get(i + 1))
    };
    let multipv = value_after("multipv").map_or(1, |v| v.parse().unwrap_or(1));
    let score = if let Some(cp) = value_after("cp") {
        RawScore::Cp(cp.parse().ok()?)
    } else if let Some(mate) = value_after("mate") {
        RawScore::Mate(mate.parse().ok()?)
    } else {
        return None;
    };
    let first = (*value_after("pv")?).to_string();
    Some(PvLine {
        multipv,
        score,
        first,
    })
}

/// Converts an engine-reported score to White's perspective. `mate 0`
/// means the side to move is already mated, so the opponent has won.
fn normalize(raw: RawScore, to_move: Side) -> Score {
    let sign = match to_move {
        Side::White => 1,
        Side::Black => -1,
    };
    match raw {
        RawScore::Cp(value) => Score::Centipawns(value * sign),
        RawScore::Mate(0) => Score::Won(to_move.opponent()),
        RawScore::Mate(moves) => Score::MateIn((moves * sign) as i16),
    }
}

/// The worst qualifying line, preferring lower scores; `None` when no line
/// qualifies.
fn select_line(lines: &[PvLine], qualifies: impl Fn(RawScore) -> bool) -> Option<&PvLine> {
    lines
        .iter()
        .filter(|line| qualifies(line.score))
        .min_by_key(|line| line.score.rank())
}

/// The long-algebraic form the UCI protocol uses, with ranks counted from
/// the bottom of the board.
fn uci_string(mv: &Move, height: u8) -> String {
    let promotion = mv.name.find('=').map_or_else(String::new, |i| {
        mv.name[i + 1..]
            .chars()
            .next()
            .map_or_else(String::new, |c| c.to_lowercase().to_string())
    });
    format!(
        "{}{}{}{}{}",
        file_letter(mv.from.x),
        u16::from(height) - u16::from(mv.from.y),
        file_letter(mv.to.x),
        u16::from(height) - u16::from(mv.to.y),
        promotion
    )
}

/// Finds the legal move matching a UCI long-algebraic string.
fn resolve_uci(board: &Board, uci: &str) -> Option<Move> {
    let height = board.height();
    board
        .legal_moves()
        .iter()
        .find(|mv| uci_string(mv, height) == uci)
        .cloned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn uci_strings() {
        let board = Board::default();
        let e4 = board
            .legal_moves()
            .iter()
            .find(|m| m.name == "e4")
            .unwrap();
        assert_eq!(uci_string(e4, 8), "e2e4");

        let mut promo = Board::default();
        promo.load_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let queen = promo
            .legal_moves()
            .iter()
            .find(|m| m.name.contains("=Q"))
            .unwrap();
        assert_eq!(uci_string(queen, 8), "a7a8q");
    }

    #[test]
    fn resolving_engine_moves() {
        let board = Board::default();
        assert_eq!(resolve_uci(&board, "g1f3").unwrap().name, "Nf3");
        assert_eq!(resolve_uci(&board, "e2e4").unwrap().name, "e4");
        assert!(resolve_uci(&board, "e2e5").is_none());
    }

    #[test]
    fn info_line_parsing() {
        let line: Vec<&str> =
            "info depth 20 seldepth 28 multipv 2 score cp -31 nodes 1000 pv e7e5 g1f3"
                .split_whitespace()
                .collect();
        assert_eq!(
            parse_info(&line),
            Some(PvLine {
                multipv: 2,
                score: RawScore::Cp(-31),
                first: "e7e5".to_string(),
            })
        );
        let mate: Vec<&str> = "info depth 10 score mate 3 pv h5f7".split_whitespace().collect();
        assert_eq!(
            parse_info(&mate),
            Some(PvLine {
                multipv: 1,
                score: RawScore::Mate(3),
                first: "h5f7".to_string(),
            })
        );
        let noise: Vec<&str> = "info depth 5 currmove e2e4".split_whitespace().collect();
        assert_eq!(parse_info(&noise), None);
    }

    #[test]
    fn score_normalization() {
        assert_eq!(normalize(RawScore::Cp(120), Side::White), Score::Centipawns(120));
        assert_eq!(normalize(RawScore::Cp(120), Side::Black), Score::Centipawns(-120));
        assert_eq!(normalize(RawScore::Mate(2), Side::Black), Score::MateIn(-2));
        // Mate 0: the mover has already lost.
        assert_eq!(normalize(RawScore::Mate(0), Side::Black), Score::Won(Side::White));
        assert_eq!(normalize(RawScore::Mate(0), Side::White), Score::Won(Side::Black));
    }

    #[test]
    fn line_selection_for_the_bots() {
        let lines = vec![
            PvLine { multipv: 1, score: RawScore::Mate(2), first: "a".to_string() },
            PvLine { multipv: 2, score: RawScore::Cp(450), first: "b".to_string() },
            PvLine { multipv: 3, score: RawScore::Cp(20), first: "c".to_string() },
            PvLine { multipv: 4, score: RawScore::Cp(-700), first: "d".to_string() },
        ];
        // Taunter: worst line still three pawns up.
        assert_eq!(select_line(&lines, |s| s.rank() >= 300).unwrap().first, "b");
        // Drawfish: worst non-losing line.
        assert_eq!(select_line(&lines, |s| s.rank() >= 0).unwrap().first, "c");
        // Badfish: the absolute worst.
        assert_eq!(select_line(&lines, |_| true).unwrap().first, "d");
        // Nothing qualifies: the caller falls back to bestmove.
        assert!(select_line(&lines, |s| s.rank() >= i64::MAX - 1).is_none());
    }

    #[test]
    fn trivial_computers() {
        let board = Board::default();
        assert_eq!(
            first_move(&board).unwrap().name,
            board.legal_moves()[0].name
        );
        let pick = random_move(&board).unwrap();
        assert!(board.legal_moves().iter().any(|m| m.name == pick.name));

        let empty = Board::new("Empty");
        assert!(first_move(&empty).is_none());
        assert!(random_move(&empty).is_none());
    }

    #[test]
    fn finished_or_fairy_games_skip_the_engine() {
        let mut fairy = Board::new("rnbqkbnr/pppppppp/8/8/8/8/GGGGGGGG/RNBQKBNR w KQkq - 0 1");
        assert_eq!(fairy.variant(), "Fairy");
        assert!(matches!(settle_without_engine(&mut fairy), Some(None)));

        let mut mated = Board::default();
        mated
            .load_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .unwrap();
        assert!(matches!(settle_without_engine(&mut mated), Some(None)));
        assert_eq!(mated.evaluation(), Some(Score::Won(Side::Black)));

        let mut live = Board::default();
        assert!(settle_without_engine(&mut live).is_none());
    }
}
