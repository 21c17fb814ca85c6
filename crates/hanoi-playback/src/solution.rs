//! Solved puzzles and the store that holds the live one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::tower::{Disc, TowerId, Towers};

/// One step of a solution, with the configuration it leaves behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// 1-based position in the sequence.
    pub move_number: usize,
    pub disc: Disc,
    pub from: TowerId,
    pub to: TowerId,
    /// Tower configuration after this move.
    pub towers: Towers,
}

impl Move {
    /// Human-readable label for this move.
    pub fn description(&self) -> String {
        format!(
            "Move {}: Move disc {} from Tower {} to Tower {}",
            self.move_number, self.disc, self.from, self.to
        )
    }
}

/// How far into a solution playback has got.
///
/// Serialized as the classic index: `-1` before any move, otherwise the
/// 0-based index of the last applied move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(into = "i64")]
pub enum Position {
    /// No move applied yet.
    #[default]
    Initial,
    /// `moves[i]` is the last applied move.
    At(usize),
}

impl Position {
    /// Index of the last applied move.
    pub fn index(self) -> Option<usize> {
        match self {
            Position::Initial => None,
            Position::At(i) => Some(i),
        }
    }

    /// Number of moves applied so far.
    pub fn moves_applied(self) -> usize {
        match self {
            Position::Initial => 0,
            Position::At(i) => i + 1,
        }
    }

    /// The position one move further on.
    pub fn next(self) -> Position {
        Position::At(self.moves_applied())
    }

    /// The position one move back, or `None` at the initial position.
    pub fn previous(self) -> Option<Position> {
        match self {
            Position::Initial => None,
            Position::At(0) => Some(Position::Initial),
            Position::At(i) => Some(Position::At(i - 1)),
        }
    }
}

impl From<Position> for i64 {
    fn from(position: Position) -> Self {
        match position {
            Position::Initial => -1,
            Position::At(i) => i as i64,
        }
    }
}

/// Optimal move count for `discs` discs: 2^n - 1.
pub fn minimum_moves_for(discs: usize) -> usize {
    if discs >= usize::BITS as usize {
        usize::MAX
    } else {
        (1usize << discs) - 1
    }
}

/// A complete, immutable solved puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    initial_state: Towers,
    moves: Vec<Move>,
    minimum_moves: usize,
}

impl Solution {
    /// Build a solution from its parts.
    ///
    /// Only the numbering of the moves is checked; move legality is trusted.
    pub fn new(initial_state: Towers, moves: Vec<Move>, minimum_moves: usize) -> Result<Self> {
        if let Some((i, mv)) = moves
            .iter()
            .enumerate()
            .find(|(i, mv)| mv.move_number != i + 1)
        {
            return Err(Error::SolverFailure(format!(
                "move {} is numbered {}",
                i + 1,
                mv.move_number
            )));
        }
        Ok(Self {
            initial_state,
            moves,
            minimum_moves,
        })
    }

    pub fn initial_state(&self) -> &Towers {
        &self.initial_state
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn total_moves(&self) -> usize {
        self.moves.len()
    }

    pub fn minimum_moves(&self) -> usize {
        self.minimum_moves
    }

    /// Number of discs in play.
    pub fn disc_count(&self) -> usize {
        self.initial_state.disc_count()
    }

    /// The position reached once every move is applied.
    pub fn last_position(&self) -> Position {
        match self.moves.len() {
            0 => Position::Initial,
            n => Position::At(n - 1),
        }
    }

    /// Tower configuration at a position.
    pub fn towers_at(&self, position: Position) -> &Towers {
        position
            .index()
            .and_then(|i| self.moves.get(i))
            .map_or(&self.initial_state, |mv| &mv.towers)
    }

    /// Label shown before any move is applied.
    pub fn ready_description(&self) -> String {
        format!(
            "Ready to solve with {} discs. Click \"Play\" or \"Next\" to start!",
            self.disc_count()
        )
    }

    /// Label shown at a position.
    pub fn describe(&self, position: Position) -> String {
        position
            .index()
            .and_then(|i| self.moves.get(i))
            .map_or_else(|| self.ready_description(), Move::description)
    }

    /// Check the solution against the optimal bound and the goal state.
    pub fn verify(&self) -> Verification {
        let discs = self.disc_count();
        let expected_moves = minimum_moves_for(discs);
        let actual_moves = self.moves.len();
        let goal: Vec<Disc> = (1..=discs as Disc).rev().collect();
        let correct_final_state = self.towers_at(self.last_position()).c == goal;
        let optimal = actual_moves == expected_moves;

        Verification {
            optimal,
            correct_final_state,
            expected_moves,
            actual_moves,
            valid: optimal && correct_final_state,
        }
    }
}

/// Outcome of [`Solution::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub optimal: bool,
    pub correct_final_state: bool,
    pub expected_moves: usize,
    pub actual_moves: usize,
    pub valid: bool,
}

/// Solver payload, in either its success or its failure shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<Towers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moves: Option<Vec<Move>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_moves: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_moves: Option<usize>,
}

impl SolveResponse {
    /// A failure payload carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Turn the payload into a solution, or the error it reports.
    pub fn into_solution(self) -> Result<Solution> {
        if !self.success {
            return Err(Error::SolverFailure(
                self.error.unwrap_or_else(|| "Failed to solve puzzle".to_string()),
            ));
        }

        let initial_state = self.initial_state.ok_or_else(|| missing("initial_state"))?;
        let moves = self.moves.ok_or_else(|| missing("moves"))?;
        let total_moves = self.total_moves.ok_or_else(|| missing("total_moves"))?;
        let minimum_moves = self.minimum_moves.ok_or_else(|| missing("minimum_moves"))?;

        if total_moves != moves.len() {
            return Err(Error::SolverFailure(format!(
                "solver reported {} moves but sent {}",
                total_moves,
                moves.len()
            )));
        }

        Solution::new(initial_state, moves, minimum_moves)
    }
}

fn missing(field: &str) -> Error {
    Error::SolverFailure(format!("solver response is missing `{field}`"))
}

impl From<&Solution> for SolveResponse {
    fn from(solution: &Solution) -> Self {
        Self {
            success: true,
            error: None,
            initial_state: Some(solution.initial_state.clone()),
            moves: Some(solution.moves.clone()),
            total_moves: Some(solution.total_moves()),
            minimum_moves: Some(solution.minimum_moves),
        }
    }
}

/// Holds the one live solution.
#[derive(Debug, Default)]
pub struct SequenceStore {
    current: Option<Arc<Solution>>,
}

impl SequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the solution carried by `response`, replacing the current one.
    ///
    /// On any error the current solution is left untouched.
    pub fn accept(&mut self, response: SolveResponse) -> Result<Arc<Solution>> {
        let solution = match response.into_solution() {
            Ok(solution) => Arc::new(solution),
            Err(e) => {
                warn!("Rejected solver response: {}", e);
                return Err(e);
            }
        };

        info!(
            discs = solution.disc_count(),
            total_moves = solution.total_moves(),
            minimum_moves = solution.minimum_moves(),
            "Solution installed"
        );
        self.current = Some(Arc::clone(&solution));
        Ok(solution)
    }

    /// The live solution, if one has been installed.
    pub fn current(&self) -> Option<&Arc<Solution>> {
        self.current.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Optimal solution for `discs` discs, moving everything from A to C.
    pub(crate) fn solved(discs: Disc) -> Solution {
        let mut towers = Towers::initial(discs);
        let mut moves = Vec::new();
        solve(discs, TowerId::A, TowerId::C, TowerId::B, &mut towers, &mut moves);
        Solution::new(
            Towers::initial(discs),
            moves,
            minimum_moves_for(discs as usize),
        )
        .unwrap()
    }

    fn solve(
        n: Disc,
        from: TowerId,
        to: TowerId,
        via: TowerId,
        towers: &mut Towers,
        moves: &mut Vec<Move>,
    ) {
        if n == 0 {
            return;
        }
        solve(n - 1, from, via, to, towers, moves);
        let disc = towers.apply(from, to).unwrap();
        moves.push(Move {
            move_number: moves.len() + 1,
            disc,
            from,
            to,
            towers: towers.clone(),
        });
        solve(n - 1, via, to, from, towers, moves);
    }

    /// A solution with no moves at all.
    pub(crate) fn empty() -> Solution {
        Solution::new(Towers::default(), Vec::new(), 0).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::solved;
    use super::*;

    #[test]
    fn position_arithmetic() {
        assert_eq!(Position::Initial.next(), Position::At(0));
        assert_eq!(Position::At(0).previous(), Some(Position::Initial));
        assert_eq!(Position::Initial.previous(), None);
        assert_eq!(Position::At(4).moves_applied(), 5);
        assert_eq!(i64::from(Position::Initial), -1);
        assert_eq!(serde_json::to_string(&Position::At(2)).unwrap(), "2");
    }

    #[test]
    fn minimum_moves() {
        assert_eq!(minimum_moves_for(0), 0);
        assert_eq!(minimum_moves_for(3), 7);
        assert_eq!(minimum_moves_for(10), 1023);
        assert_eq!(minimum_moves_for(200), usize::MAX);
    }

    #[test]
    fn descriptions() {
        let solution = solved(3);
        assert_eq!(
            solution.describe(Position::Initial),
            "Ready to solve with 3 discs. Click \"Play\" or \"Next\" to start!"
        );
        assert_eq!(
            solution.describe(Position::At(0)),
            "Move 1: Move disc 1 from Tower A to Tower C"
        );
        assert_eq!(solution.towers_at(Position::Initial), &Towers::initial(3));
    }

    #[test]
    fn verify_optimal_solutions() {
        for discs in 1..=10 {
            let verification = solved(discs).verify();
            assert!(verification.valid, "{discs} discs: {verification:?}");
            assert_eq!(verification.actual_moves, minimum_moves_for(discs as usize));
        }
    }

    #[test]
    fn verify_flags_incomplete_solution() {
        let full = solved(3);
        let truncated = Solution::new(
            full.initial_state().clone(),
            full.moves()[..6].to_vec(),
            full.minimum_moves(),
        )
        .unwrap();

        let verification = truncated.verify();
        assert!(!verification.optimal);
        assert!(!verification.correct_final_state);
        assert!(!verification.valid);
    }

    #[test]
    fn every_snapshot_is_well_ordered() {
        let solution = solved(5);
        assert!(solution.moves().iter().all(|mv| mv.towers.is_well_ordered()));
    }

    #[test]
    fn parses_solver_payload() {
        let json = serde_json::json!({
            "success": true,
            "moves": [{
                "move_number": 1,
                "from": "A",
                "to": "C",
                "disc": 1,
                "towers": {"A": [], "B": [], "C": [1]}
            }],
            "total_moves": 1,
            "minimum_moves": 1,
            "initial_state": {"A": [1], "B": [], "C": []}
        });

        let response: SolveResponse = serde_json::from_value(json).unwrap();
        let solution = response.into_solution().unwrap();
        assert_eq!(solution.total_moves(), 1);
        assert_eq!(solution.moves()[0].to, TowerId::C);
    }

    #[test]
    fn failure_without_success_flag() {
        let response: SolveResponse =
            serde_json::from_str(r#"{"error": "Number of discs must be between 1 and 10"}"#)
                .unwrap();

        match response.into_solution() {
            Err(Error::SolverFailure(msg)) => {
                assert_eq!(msg, "Number of discs must be between 1 and 10")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn failure_without_message_uses_fallback() {
        let response = SolveResponse {
            success: false,
            ..Default::default()
        };
        let err = response.into_solution().unwrap_err();
        assert_eq!(err.to_string(), "Failed to solve puzzle");
    }

    #[test]
    fn rejects_mismatched_total() {
        let mut response = SolveResponse::from(&solved(2));
        response.total_moves = Some(4);
        assert!(matches!(
            response.into_solution(),
            Err(Error::SolverFailure(_))
        ));
    }

    #[test]
    fn rejects_misnumbered_moves() {
        let mut response = SolveResponse::from(&solved(2));
        if let Some(moves) = response.moves.as_mut() {
            moves[1].move_number = 7;
        }
        assert!(response.into_solution().is_err());
    }

    #[test]
    fn store_keeps_previous_solution_on_failure() {
        let mut store = SequenceStore::new();
        assert!(store.current().is_none());

        let installed = store.accept(SolveResponse::from(&solved(3))).unwrap();
        assert_eq!(installed.total_moves(), 7);

        assert!(store.accept(SolveResponse::failure("boom")).is_err());
        let mut broken = SolveResponse::from(&solved(4));
        broken.initial_state = None;
        assert!(store.accept(broken).is_err());

        let current = store.current().unwrap();
        assert!(Arc::ptr_eq(current, &installed));
    }

    #[test]
    fn store_replaces_wholesale() {
        let mut store = SequenceStore::new();
        store.accept(SolveResponse::from(&solved(2))).unwrap();
        store.accept(SolveResponse::from(&solved(4))).unwrap();
        assert_eq!(store.current().unwrap().total_moves(), 15);
    }
}
