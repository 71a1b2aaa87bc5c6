/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Result};
use rand::{seq::SliceRandom, Rng};
use tracing::debug;

use crate::{Evaluator, Position, Score};

/// How hard the computer opponent tries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Difficulty {
    /// Plays a uniformly random legal move.
    Easy,

    /// Plays the move that maximizes material after one ply.
    #[default]
    Medium,

    /// Like [`Difficulty::Medium`], but also adds half the score of every opponent reply.
    Hard,
}

impl Difficulty {
    /// All difficulties, from easiest to hardest.
    pub const fn all() -> [Self; 3] {
        [Self::Easy, Self::Medium, Self::Hard]
    }

    /// Fetches a human-readable name for this [`Difficulty`].
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Numeric level used by the UCI `Difficulty` option.
    pub const fn level(&self) -> i32 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;
    /// Parses a difficulty from its name (case-insensitive) or its numeric level.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "0" => Ok(Self::Easy),
            "medium" | "1" => Ok(Self::Medium),
            "hard" | "2" => Ok(Self::Hard),
            _ => bail!("invalid difficulty {s:?}; expected easy, medium, or hard"),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

/// The result of a move selection, containing the chosen move, its score, and total positions evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionResult<M> {
    /// Number of positions evaluated.
    pub nodes: u64,

    /// Move chosen by the selector, if any legal move existed.
    pub bestmove: Option<M>,

    /// Score of `bestmove` from the mover's perspective.
    ///
    /// Always [`Score::EVEN`] for [`Difficulty::Easy`], which never evaluates anything.
    pub score: Score,
}

impl<M> Default for SelectionResult<M> {
    /// A default result should initialize to a *very bad* value,
    /// since there isn't a move to play.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            bestmove: None,
            score: -Score::INF,
        }
    }
}

/// Chooses a move on the provided position according to a [`Difficulty`].
pub struct Selector<'a, P> {
    /// The position to choose a move on.
    ///
    /// This position is copied when moves are applied to it.
    position: &'a P,

    /// Strategy to use.
    difficulty: Difficulty,

    /// Number of positions evaluated so far.
    nodes: u64,
}

impl<'a, P: Position> Selector<'a, P> {
    /// Construct a new [`Selector`] to run on the provided position.
    #[inline(always)]
    pub fn new(position: &'a P, difficulty: Difficulty) -> Self {
        Self {
            position,
            difficulty,
            nodes: 0,
        }
    }

    /// Run the selection, drawing any randomness from `rng`.
    ///
    /// If the position has no legal moves, the result's `bestmove` is `None`.
    pub fn start<R: Rng + ?Sized>(mut self, rng: &mut R) -> SelectionResult<P::Move> {
        let moves = self.position.legal_moves();

        // Every strategy begins from a random legal move
        let Some(&seed) = moves.choose(rng) else {
            debug!(difficulty = %self.difficulty, "no legal moves; nothing to select");
            return SelectionResult::default();
        };

        let res = match self.difficulty {
            Difficulty::Easy => SelectionResult {
                nodes: 0,
                bestmove: Some(seed),
                score: Score::EVEN,
            },

            Difficulty::Medium | Difficulty::Hard => self.best_of(&moves, seed),
        };

        if let Some(mv) = res.bestmove {
            debug!(
                difficulty = %self.difficulty,
                candidates = moves.len(),
                nodes = res.nodes,
                score = %res.score,
                %seed,
                bestmove = %mv,
                "selected move"
            );
        }

        res
    }

    /// Scores every move in `moves`, starting from `seed` and replacing it only on a strictly better score.
    fn best_of(&mut self, moves: &[P::Move], seed: P::Move) -> SelectionResult<P::Move> {
        let mut bestmove = seed;
        let mut best = self.score_move(seed);

        for &mv in moves {
            let score = self.score_move(mv);

            // Ties keep the earlier choice
            if score > best {
                best = score;
                bestmove = mv;
            }
        }

        SelectionResult {
            nodes: self.nodes,
            bestmove: Some(bestmove),
            score: best,
        }
    }

    /// Scores `mv` from the mover's perspective.
    fn score_move(&mut self, mv: P::Move) -> Score {
        // Copy-make the new position
        let next = self.position.with_move_made(mv);
        self.nodes += 1;

        // This is from the opponent's perspective, so we need to negate the score.
        let mut score = -Evaluator::new(&next).eval();

        if self.difficulty == Difficulty::Hard {
            // After each reply it is our turn again, so these are already from our perspective.
            // Replies are summed at half weight, not minimized.
            for reply in next.legal_moves() {
                let after = next.with_move_made(reply);
                self.nodes += 1;
                score += Evaluator::new(&after).eval().halved();
            }
        }

        score
    }
}

/// Choose a move on `position` at the given `difficulty`.
///
/// Returns `None` if `position` has no legal moves; callers should check for the end of the game first.
#[inline(always)]
pub fn select_move<P: Position, R: Rng + ?Sized>(
    position: &P,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<P::Move> {
    Selector::new(position, difficulty).start(rng).bestmove
}

#[cfg(test)]
mod tests {
    use chessie::Game;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!("easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("Medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert_eq!(" HARD ".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!("2".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("impossible".parse::<Difficulty>().is_err());

        for difficulty in Difficulty::all() {
            assert_eq!(difficulty.name().parse::<Difficulty>().unwrap(), difficulty);
            assert_eq!(
                difficulty.level().to_string().parse::<Difficulty>().unwrap(),
                difficulty
            );
        }
    }

    #[test]
    fn test_selects_legal_move_at_every_difficulty() {
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 b - - 0 1",
        ];
        let mut rng = StdRng::seed_from_u64(7);

        for fen in fens {
            let game: Game = fen.parse().unwrap();
            let legal = game.legal_moves();
            for difficulty in Difficulty::all() {
                let mv = select_move(&game, difficulty, &mut rng).unwrap();
                assert!(legal.contains(&mv), "{difficulty} chose illegal {mv} on {fen}");
            }
        }
    }

    #[test]
    fn test_no_move_on_checkmate() {
        let game: Game = "r1bqkbnr/pppp1Qpp/2n5/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 1"
            .parse()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        for difficulty in Difficulty::all() {
            let res = Selector::new(&game, difficulty).start(&mut rng);
            assert!(res.bestmove.is_none());
            assert_eq!(res.score, -Score::INF);
        }
    }

    #[test]
    fn test_no_move_on_stalemate() {
        let game: Game = "k7/8/1Q6/8/8/8/8/1K6 b - - 0 1".parse().unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_move(&game, Difficulty::Hard, &mut rng).is_none());
    }

    #[test]
    fn test_medium_startpos_returns_seed() {
        let game = Game::default();

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut replay = StdRng::seed_from_u64(seed);

            let expected = *game.legal_moves().choose(&mut replay).unwrap();
            let res = Selector::new(&game, Difficulty::Medium).start(&mut rng);

            assert_eq!(res.bestmove, Some(expected));
            assert_eq!(res.score, Score::EVEN);
            // The seed is scored once, then every legal move
            assert_eq!(res.nodes, 21);
        }
    }

    #[test]
    fn test_medium_and_hard_take_the_queen() {
        let game: Game = "4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1".parse().unwrap();

        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            for difficulty in [Difficulty::Medium, Difficulty::Hard] {
                let mv = select_move(&game, difficulty, &mut rng).unwrap();
                assert_eq!(mv.to_string(), "d1d5", "{difficulty} missed the queen");
            }
        }
    }

    #[test]
    fn test_black_takes_the_queen() {
        let game: Game = "3rk3/8/8/8/3Q4/8/8/4K3 b - - 0 1".parse().unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let res = Selector::new(&game, Difficulty::Medium).start(&mut rng);
        assert_eq!(res.bestmove.unwrap().to_string(), "d8d4");
        // Rook vs nothing, from Black's perspective
        assert_eq!(res.score, 500);
    }

    #[test]
    fn test_selection_is_repeatable_with_same_seed() {
        let game = Game::default();
        for difficulty in Difficulty::all() {
            let a = select_move(&game, difficulty, &mut StdRng::seed_from_u64(42));
            let b = select_move(&game, difficulty, &mut StdRng::seed_from_u64(42));
            assert_eq!(a, b);
        }
    }
}
