//! Move generation at five precision levels, from raw pseudo-legal moves up
//! to full termination classification.
//!
//! Legality is decided by playing each candidate and asking whether the
//! mover's king can be captured in reply, rather than by precomputed pin
//! rays: the constant-factor cost keeps the generator uniform across board
//! sizes and the whole fairy catalogue. Attack maps are never cached across
//! mutations.

use arrayvec::ArrayVec;
use indexmap::IndexMap;

use crate::board::Board;
use crate::catalog::{Piece, Reach};
use crate::core::{file_letter, CastlingRights, CastlingSide, Coord, Side};
use crate::hash::PositionKey;
use crate::moves::{Move, MoveKind};

/// How much work [`Board::generate`] performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum GenLevel {
    /// Piece-movement rules only; ignores checks. The level used to answer
    /// attack queries.
    PseudoLegal,
    /// Stops at the first legal move found: a cheap "any move exists?"
    /// probe.
    FirstLegal,
    /// All legal moves; rejected candidates land in
    /// [`Board::illegal_moves`].
    Legal,
    /// Legal moves annotated with `+`/`#` and classified as checkmate or
    /// stalemate.
    Annotated,
    /// As [`GenLevel::Annotated`], plus insufficient-material, fifty-move
    /// and threefold-repetition detection.
    Full,
}

impl Board {
    /// Generates the move list of the current position at the requested
    /// level. See [`GenLevel`] for what each level produces.
    pub fn generate(&mut self, level: GenLevel) -> Vec<Move> {
        // A decided game has no moves, unless the caller is replaying
        // through the redo stack.
        if level >= GenLevel::Annotated && self.result() != "*" && self.undone.is_empty() {
            return Vec::new();
        }

        let (width, height) = self.size;
        let key = self.position_key();
        let mut groups: IndexMap<String, Vec<Move>> = IndexMap::new();

        for y in 0..height {
            for x in 0..width {
                let square = Coord::new(x, y);
                let Some(piece) = self.at(square) else {
                    continue;
                };
                if piece.side() != Some(self.side_to_move) {
                    continue;
                }
                let piece = piece.clone();
                if piece.is_pawn_class() {
                    self.pawn_moves(&piece, square, &key, &mut groups);
                    continue;
                }
                if piece.is_king() {
                    self.castle_moves(&piece, square, &key, &mut groups);
                }
                self.descriptor_moves(&piece, square, &key, &mut groups);
            }
        }

        // Weed out moves that leave the mover's king en prise.
        if level >= GenLevel::FirstLegal {
            if level >= GenLevel::Legal {
                self.illegal_moves = Vec::new();
            }
            for list in groups.values_mut() {
                let mut i = 0;
                while i < list.len() {
                    let mv = list[i].clone();
                    if self.is_legal(&mv) {
                        if level == GenLevel::FirstLegal {
                            return vec![mv];
                        }
                        i += 1;
                    } else {
                        let rejected = list.remove(i);
                        if level >= GenLevel::Legal {
                            self.illegal_moves.push(rejected);
                        }
                    }
                }
            }
            if level == GenLevel::FirstLegal {
                return Vec::new();
            }
        }

        // Disambiguate same-named survivors: file if unique, else rank,
        // else both, inserted after the piece letter.
        for list in groups.values_mut() {
            if list.len() <= 1 {
                continue;
            }
            let files: Vec<u8> = list.iter().map(|m| m.from.x).collect();
            let rows: Vec<u8> = list.iter().map(|m| m.from.y).collect();
            for mv in list.iter_mut() {
                let middle = if files.iter().filter(|&&x| x == mv.from.x).count() == 1 {
                    file_letter(mv.from.x).to_string()
                } else if rows.iter().filter(|&&y| y == mv.from.y).count() == 1 {
                    (u16::from(height) - u16::from(mv.from.y)).to_string()
                } else {
                    format!(
                        "{}{}",
                        file_letter(mv.from.x),
                        u16::from(height) - u16::from(mv.from.y)
                    )
                };
                let mut chars = mv.name.chars();
                if let Some(head) = chars.next() {
                    mv.name = format!("{head}{middle}{}", chars.as_str());
                }
            }
        }

        let mut moves: Vec<Move> = groups.into_values().flatten().collect();

        // Classify what each move does to the game.
        if level >= GenLevel::Annotated {
            let mover = self.side_to_move;
            for mv in &mut moves {
                self.apply(mv.clone(), false);
                let opponent_can_reply = !self.generate(GenLevel::FirstLegal).is_empty();
                if opponent_can_reply {
                    if self.gives_check(mover) {
                        mv.name.push('+');
                    }
                    if level >= GenLevel::Full {
                        if mv.is_capture() && self.material_insufficient() {
                            mv.kind = MoveKind::InsufficientMaterial;
                        } else if self.halfmove_clock >= 100 {
                            mv.kind = MoveKind::FiftyMove;
                        } else if self.repetition_reached() {
                            mv.kind = MoveKind::Repetition;
                        }
                    }
                } else if self.gives_check(mover) {
                    mv.name.push('#');
                    mv.kind = MoveKind::Checkmate;
                } else {
                    mv.kind = MoveKind::Stalemate;
                }
                let _ = self.revert(false);
            }
        }

        moves
    }

    /// Whether any pseudo-legal move of the side to move lands on `target`.
    pub fn is_square_attacked(&mut self, target: Coord) -> bool {
        self.generate(GenLevel::PseudoLegal)
            .iter()
            .any(|mv| mv.to == target)
    }

    /// Whether `side`'s king stands on a square the side to move attacks.
    /// Callers arrange `side_to_move` to be the attacker; a board without
    /// a royal for `side` is never in check.
    pub fn in_check(&mut self, side: Side) -> bool {
        match self.king_square(side) {
            Some(king) => self.is_square_attacked(king),
            None => false,
        }
    }

    /// Whether `by` attacks the enemy king, regardless of whose turn it is.
    pub(crate) fn gives_check(&mut self, by: Side) -> bool {
        let Some(king) = self.king_square(by.opponent()) else {
            return false;
        };
        let saved = self.side_to_move;
        self.side_to_move = by;
        let attacked = self.is_square_attacked(king);
        self.side_to_move = saved;
        attacked
    }

    /// The square of `side`'s king, if one exists.
    #[must_use]
    pub fn king_square(&self, side: Side) -> Option<Coord> {
        let (width, height) = self.size;
        for y in 0..height {
            for x in 0..width {
                let square = Coord::new(x, y);
                if self
                    .at(square)
                    .is_some_and(|p| p.is_king() && p.side() == Some(side))
                {
                    return Some(square);
                }
            }
        }
        None
    }

    /// Plays the candidate and checks that the mover's king survives. For
    /// castling, every square of the king's walk (origin and destination
    /// included) must additionally be safe in the pre-move position.
    fn is_legal(&mut self, mv: &Move) -> bool {
        if mv.is_castling() {
            let step: i16 = if mv.to.x >= mv.from.x { 1 } else { -1 };
            let mover = self.side_to_move;
            self.side_to_move = mover.opponent();
            let mut file = i16::from(mv.from.x);
            let mut walk_attacked = false;
            loop {
                if self.is_square_attacked(Coord::new(file as u8, mv.from.y)) {
                    walk_attacked = true;
                    break;
                }
                if file == i16::from(mv.to.x) {
                    break;
                }
                file += step;
            }
            self.side_to_move = mover;
            if walk_attacked {
                return false;
            }
        }
        self.apply(mv.clone(), false);
        let exposed = self.gives_check(mv.side.opponent());
        let _ = self.revert(false);
        !exposed
    }

    /// Pawn-family moves: quiet steps (with the double advance from the
    /// side's first two ranks), captures, en passant and promotion fan-out.
    fn pawn_moves(
        &self,
        piece: &Piece,
        from: Coord,
        key: &PositionKey,
        groups: &mut IndexMap<String, Vec<Move>>,
    ) {
        let (width, height) = self.size;
        let Some(side) = piece.side() else {
            return;
        };
        let forward = side.forward();
        // The double advance is allowed from the side's first two ranks,
        // which keeps it meaningful on rectangular boards.
        let may_double = match side {
            Side::White => u16::from(from.y) + 2 >= u16::from(height),
            Side::Black => from.y <= 1,
        };

        for vector in piece.data().movement {
            let (quiet, captures) = match vector.reach {
                Reach::PawnQuiet => (true, false),
                Reach::PawnCapture => (false, true),
                Reach::PawnDual => (true, true),
                _ => continue,
            };
            let files: &[i16] = if vector.a == 0 { &[0] } else { &[-1, 1] };
            for &dx in files {
                let Some(one) = from.offset(dx, forward, width, height) else {
                    continue;
                };
                if quiet && self.at(one).is_none() {
                    let name = one.algebraic(height);
                    self.push_pawn(groups, &name, from, one, None, None, key);
                    if may_double {
                        if let Some(two) = one.offset(dx, forward, width, height) {
                            if self.at(two).is_none() {
                                let name = two.algebraic(height);
                                self.push_pawn(groups, &name, from, two, None, None, key);
                            }
                        }
                    }
                }
                if captures {
                    let name = format!("{}x{}", file_letter(from.x), one.algebraic(height));
                    match self.at(one) {
                        Some(target) if target.side() == Some(side.opponent()) => {
                            self.push_pawn(groups, &name, from, one, Some(target.clone()), None, key);
                        }
                        None if self.en_passant == Some(one) => {
                            // The captured pawn stands beside the mover, on
                            // the destination file.
                            let taken_square = Coord::new(one.x, from.y);
                            if let Some(taken) = self
                                .at(taken_square)
                                .filter(|p| p.side() == Some(side.opponent()))
                            {
                                self.push_pawn(
                                    groups,
                                    &name,
                                    from,
                                    one,
                                    Some(taken.clone()),
                                    Some(taken_square),
                                    key,
                                );
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Emits a pawn move, fanned out over the promotion set when it reaches
    /// the far rank.
    #[allow(clippy::too_many_arguments)]
    fn push_pawn(
        &self,
        groups: &mut IndexMap<String, Vec<Move>>,
        name: &str,
        from: Coord,
        to: Coord,
        capture: Option<Piece>,
        info: Option<Coord>,
        key: &PositionKey,
    ) {
        let side = self.side_to_move;
        let far_row = match side {
            Side::White => 0,
            Side::Black => self.size.1 - 1,
        };
        if to.y == far_row {
            for letter in self.promotion.chars() {
                let promoted = format!("{name}={letter}");
                let mv = Move::record(
                    promoted.clone(),
                    from,
                    to,
                    self,
                    capture.clone(),
                    info,
                    key.clone(),
                );
                groups.entry(promoted).or_default().push(mv);
            }
        } else {
            let mv = Move::record(
                name.to_string(),
                from,
                to,
                self,
                capture,
                info,
                key.clone(),
            );
            groups.entry(name.to_string()).or_default().push(mv);
        }
    }

    /// Castling candidates: for each wing still in the rights, find the
    /// closest never-moved rook, require the span covering king, rook and
    /// both destinations to hold exactly that king and that rook, and
    /// nothing else.
    fn castle_moves(
        &self,
        king: &Piece,
        from: Coord,
        key: &PositionKey,
        groups: &mut IndexMap<String, Vec<Move>>,
    ) {
        let (width, _) = self.size;
        if width < 4 {
            return;
        }
        let Some(side) = king.side() else {
            return;
        };
        let y = from.y;

        for wing in [CastlingSide::Kingside, CastlingSide::Queenside] {
            if !self.castling.contains(CastlingRights::single(side, wing)) {
                continue;
            }
            let own_rook = |x: u8| {
                self.at(Coord::new(x, y)).is_some_and(|p| {
                    p.letter() == 'R' && p.side() == Some(side) && p.moves_played == 0
                })
            };
            let (rook_x, start, end, king_to) = match wing {
                CastlingSide::Kingside => {
                    let Some(rx) = (from.x + 1..width).find(|&x| own_rook(x)) else {
                        continue;
                    };
                    (rx, from.x.min(width - 3), rx.max(width - 2), width - 2)
                }
                CastlingSide::Queenside => {
                    let Some(rx) = (0..from.x).rev().find(|&x| own_rook(x)) else {
                        continue;
                    };
                    (rx, rx.min(2), from.x.max(3), 2)
                }
            };

            let mut kings = 0;
            let mut rooks = 0;
            let mut blocked = false;
            for x in start..=end {
                match self.at(Coord::new(x, y)) {
                    Some(p)
                        if p.is_king() && p.side() == Some(side) && p.moves_played == 0 =>
                    {
                        kings += 1;
                    }
                    Some(p)
                        if p.letter() == 'R'
                            && p.side() == Some(side)
                            && p.moves_played == 0 =>
                    {
                        rooks += 1;
                    }
                    Some(_) => {
                        blocked = true;
                        break;
                    }
                    None => {}
                }
            }
            if blocked || kings != 1 || rooks != 1 {
                continue;
            }

            let name = match wing {
                CastlingSide::Kingside => "0-0",
                CastlingSide::Queenside => "0-0-0",
            };
            let mv = Move::record(
                name.to_string(),
                from,
                Coord::new(king_to, y),
                self,
                None,
                Some(Coord::new(rook_x, y)),
                key.clone(),
            );
            let _ = groups.insert(name.to_string(), vec![mv]);
        }
    }

    /// Moves of symmetrically moving pieces, driven by their descriptor
    /// set: each base vector expands to up to eight directions, walked to
    /// the reach limit or the first blocker. Neutral obstacles block and
    /// cannot be captured.
    fn descriptor_moves(
        &self,
        piece: &Piece,
        from: Coord,
        key: &PositionKey,
        groups: &mut IndexMap<String, Vec<Move>>,
    ) {
        let (width, height) = self.size;
        let Some(side) = piece.side() else {
            return;
        };
        let letter = piece.letter();

        for vector in piece.data().movement {
            let max_steps = match vector.reach {
                Reach::Leaper => 1u16,
                Reach::Ranger(limit) => u16::from(limit),
                Reach::Rider => u16::from(width.max(height)),
                Reach::Hopper => 0,
                Reach::PawnCapture | Reach::PawnQuiet | Reach::PawnDual => continue,
            };
            for (dx, dy) in directions(vector.a, vector.b) {
                if vector.reach == Reach::Hopper {
                    self.hopper_move(piece, from, (dx, dy), key, groups);
                    continue;
                }
                let mut current = from;
                for _ in 0..max_steps {
                    let Some(next) = current.offset(dx, dy, width, height) else {
                        break;
                    };
                    current = next;
                    match self.at(next) {
                        Some(target) => {
                            if target.side() == Some(side.opponent()) {
                                let name =
                                    format!("{letter}x{}", next.algebraic(height));
                                let mv = Move::record(
                                    name.clone(),
                                    from,
                                    next,
                                    self,
                                    Some(target.clone()),
                                    None,
                                    key.clone(),
                                );
                                groups.entry(name).or_default().push(mv);
                            }
                            break;
                        }
                        None => {
                            let name = format!("{letter}{}", next.algebraic(height));
                            let mv = Move::record(
                                name.clone(),
                                from,
                                next,
                                self,
                                None,
                                None,
                                key.clone(),
                            );
                            groups.entry(name).or_default().push(mv);
                        }
                    }
                }
            }
        }
    }

    /// A hopper slides until it meets a hurdle of any colour and must land
    /// on the square immediately behind it.
    fn hopper_move(
        &self,
        piece: &Piece,
        from: Coord,
        (dx, dy): (i16, i16),
        key: &PositionKey,
        groups: &mut IndexMap<String, Vec<Move>>,
    ) {
        let (width, height) = self.size;
        let side = piece.side().expect("hoppers have an owner");
        let mut current = from;
        loop {
            let Some(next) = current.offset(dx, dy, width, height) else {
                return;
            };
            current = next;
            if self.at(next).is_some() {
                break;
            }
        }
        let Some(landing) = current.offset(dx, dy, width, height) else {
            return;
        };
        let letter = piece.letter();
        match self.at(landing) {
            None => {
                let name = format!("{letter}{}", landing.algebraic(height));
                let mv =
                    Move::record(name.clone(), from, landing, self, None, None, key.clone());
                groups.entry(name).or_default().push(mv);
            }
            Some(target) if target.side() == Some(side.opponent()) => {
                let name = format!("{letter}x{}", landing.algebraic(height));
                let mv = Move::record(
                    name.clone(),
                    from,
                    landing,
                    self,
                    Some(target.clone()),
                    None,
                    key.clone(),
                );
                groups.entry(name).or_default().push(mv);
            }
            Some(_) => {}
        }
    }

    /// Whether the remaining material cannot force mate: bare kings, a
    /// lone minor piece, or bishops all standing on one colour complex.
    fn material_insufficient(&self) -> bool {
        let (width, height) = self.size;
        let mut remaining: Vec<(char, u8)> = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let Some(piece) = self.at(Coord::new(x, y)) else {
                    continue;
                };
                if piece.side().is_none() || piece.is_king() {
                    continue;
                }
                remaining.push((piece.letter(), (x + y) % 2));
            }
        }
        match remaining.as_slice() {
            [] => true,
            [(letter, _)] => matches!(letter, 'N' | 'B'),
            bishops => {
                bishops.iter().all(|(letter, _)| *letter == 'B')
                    && bishops.iter().all(|(_, shade)| *shade == bishops[0].1)
            }
        }
    }

    /// Whether the current position has now occurred three times. Walks the
    /// history backwards comparing fingerprints, stopping at the first
    /// irreversible move or change of castling rights, past which no
    /// earlier position can recur.
    fn repetition_reached(&self) -> bool {
        let current = self.position_key();
        let mut occurrences = 1;
        for mv in self.history.iter().rev() {
            if mv.castling != self.castling || mv.is_irreversible() {
                break;
            }
            if mv.key == current {
                occurrences += 1;
                if occurrences >= 3 {
                    return true;
                }
            }
        }
        false
    }
}

/// Expands a base vector into its rotations and reflections, suppressing
/// duplicates when the components coincide or vanish.
fn directions(a: u8, b: u8) -> ArrayVec<(i16, i16), 8> {
    let mut out = ArrayVec::new();
    for variant in 0..8u8 {
        let (mut dx, mut dy) = (i16::from(a), i16::from(b));
        if variant % 2 == 1 {
            if a == b {
                continue;
            }
            std::mem::swap(&mut dx, &mut dy);
        }
        if (variant / 2) % 2 == 1 {
            if dy == 0 {
                continue;
            }
            dy = -dy;
        }
        if (variant / 4) % 2 == 1 {
            if dx == 0 {
                continue;
            }
            dx = -dx;
        }
        out.push((dx, dy));
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn names(board: &Board) -> Vec<String> {
        let mut names: Vec<String> = board.legal_moves().iter().map(|m| m.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn direction_expansion() {
        assert_eq!(directions(0, 1).len(), 4); // wazir
        assert_eq!(directions(1, 1).len(), 4); // ferz
        assert_eq!(directions(1, 2).len(), 8); // knight
        assert_eq!(directions(0, 2).len(), 4); // dabbaba
        assert_eq!(directions(2, 2).len(), 4); // alfil
    }

    #[test]
    fn starting_position_has_twenty_moves() {
        let board = Board::default();
        assert_eq!(
            names(&board),
            vec![
                "Na3", "Nc3", "Nf3", "Nh3", "a3", "a4", "b3", "b4", "c3", "c4", "d3", "d4",
                "e3", "e4", "f3", "f4", "g3", "g4", "h3", "h4",
            ]
        );
    }

    #[test]
    fn pinned_piece_may_not_move() {
        let mut board = Board::default();
        // The knight on d2 shields the white king from the rook on d8.
        board.load_fen("3r3k/8/8/8/8/8/3N4/3K4 w - - 0 1").unwrap();
        assert!(!names(&board).iter().any(|n| n.starts_with('N')));
        assert!(board
            .illegal_moves()
            .iter()
            .any(|m| m.name.starts_with('N')));
    }

    #[test]
    fn first_legal_probe_returns_one_move() {
        let mut board = Board::default();
        board.load_fen("7k/8/8/8/8/8/r7/K7 w - - 0 1").unwrap();
        // The probe stops at the first legal move it finds; generation
        // scans top-down, so the sideways king step comes first.
        let probe = board.generate(GenLevel::FirstLegal);
        assert_eq!(probe.len(), 1);
        assert_eq!(probe[0].name, "Kb1");
        // The full pass still knows both escapes.
        assert_eq!(board.legal_moves().len(), 2);
    }

    #[test]
    fn disambiguation_file_rank_both() {
        let mut board = Board::default();
        // Two rooks share a rank, two share a file.
        board.load_fen("6k1/8/8/8/R6R/8/8/R3K3 w - - 0 1").unwrap();
        let all = names(&board);
        // Rooks a4 and h4 disambiguate to d4 by file; a1 and a4 to a2 by
        // rank.
        assert!(all.contains(&"Rad4".to_string()), "{all:?}");
        assert!(all.contains(&"Rhd4".to_string()), "{all:?}");
        assert!(all.contains(&"R4a2".to_string()), "{all:?}");
        assert!(all.contains(&"R1a2".to_string()), "{all:?}");
        // Names stay pairwise distinct.
        let mut deduped = all.clone();
        deduped.dedup();
        assert_eq!(all, deduped);
    }

    #[test]
    fn grasshopper_hops_over_exactly_one_piece() {
        let mut board = Board::default();
        // White grasshopper on a1, hurdles on a4 and d1, black king h8.
        board.load_fen("7k/8/8/8/p7/8/8/G2p3K w - - 0 1").unwrap();
        let all = names(&board);
        // Over the pawn on a4 to a5; over the pawn on d1 to e1.
        assert!(all.contains(&"Ga5".to_string()), "{all:?}");
        assert!(all.contains(&"Ge1".to_string()), "{all:?}");
        // No hop without a hurdle, no slide short of one.
        assert!(!all.iter().any(|n| n == "Ga2" || n == "Ga3" || n == "Gb1"));
    }

    #[test]
    fn grasshopper_captures_on_landing_square() {
        let mut board = Board::default();
        board.load_fen("7k/8/8/8/8/p7/p7/G6K w - - 0 1").unwrap();
        let all = names(&board);
        assert!(all.contains(&"Gxa3".to_string()), "{all:?}");
    }

    #[test]
    fn bricks_block_and_survive() {
        let mut board = Board::default();
        board.load_fen("7k/8/8/8/R1X4p/8/8/7K w - - 0 1").unwrap();
        let all = names(&board);
        // The rook may approach the brick but neither capture nor pass it.
        assert!(all.contains(&"Rb4".to_string()), "{all:?}");
        assert!(!all.iter().any(|n| n.contains("c4")), "{all:?}");
        assert!(!all.iter().any(|n| n.contains('x') && n.contains("c4")));
    }

    #[test]
    fn riders_repeat_their_step() {
        // The camel-rider iterates its (1,3) leap: from a1 it reaches both
        // one and two camel-steps along the same line.
        let mut board = Board::default();
        board.load_fen("7k/8/8/8/8/8/8/L6K w - - 0 1").unwrap();
        let all = names(&board);
        assert!(all.contains(&"Lb4".to_string()), "{all:?}");
        assert!(all.contains(&"Lc7".to_string()), "{all:?}");
        assert!(all.contains(&"Ld2".to_string()), "{all:?}");
        assert!(all.contains(&"Lg3".to_string()), "{all:?}");
    }

    #[test]
    fn neutral_pieces_never_move() {
        let mut board = Board::default();
        board
            .load_fen("k7/8/8/8/3\u{0398}4/8/8/K7 w - - 0 1")
            .unwrap();
        assert!(names(&board).iter().all(|n| n.starts_with('K')));
    }

    #[test]
    fn check_annotation_and_illegal_evasions() {
        let mut board = Board::default();
        board.load_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1").unwrap();
        // The king must deal with the rook; stepping onto the e-file stays
        // illegal.
        let all = names(&board);
        assert_eq!(all, vec!["Kd1", "Kf1", "Kxe2"]);
    }

    #[test]
    fn attack_queries() {
        let mut board = Board::default();
        board.load_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1").unwrap();
        // Black is the attacker only when it is Black's turn; in_check asks
        // from the defender's perspective.
        assert!(!board.in_check(Side::Black));
        let mut flipped = board.clone();
        flipped.load_fen("4k3/8/8/8/8/8/4r3/4K3 b - - 0 1").unwrap();
        assert!(flipped.in_check(Side::White));
        assert!(flipped.is_square_attacked(Coord::parse("e1", 8).unwrap()));
        assert!(flipped.is_square_attacked(Coord::parse("a2", 8).unwrap()));
        assert!(!flipped.is_square_attacked(Coord::parse("b1", 8).unwrap()));
    }
}
