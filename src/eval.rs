/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use chessie::{Color, File, PieceKind, Rank, Square};

use crate::{Position, Score};

/// Evaluate `position` from White's (the maximizing side's) perspective.
///
/// Shorthand for `Evaluator::new(position).eval_for(Color::White)`.
#[inline(always)]
pub fn evaluate<P: Position>(position: &P) -> Score {
    Evaluator::new(position).eval_for(Color::White)
}

/// Encapsulates the logic of scoring a chess position.
///
/// Only material is counted. A high score is good for White, and a low score is good for Black.
/// When comparing candidate moves, positions must be evaluated from the side-to-move's perspective instead;
/// see [`Evaluator::eval`].
#[derive(Debug, Clone)]
pub struct Evaluator<'a, P> {
    /// The position to evaluate.
    position: &'a P,
}

impl<'a, P: Position> Evaluator<'a, P> {
    /// Construct a new [`Evaluator`].
    #[inline(always)]
    pub fn new(position: &'a P) -> Self {
        Self { position }
    }

    /// Evaluate this position from the side-to-move's perspective.
    ///
    /// A positive/high number is good for the side-to-move, while a negative number is better for the opponent.
    /// A score of 0 is considered equal.
    #[inline(always)]
    pub fn eval(&self) -> Score {
        self.eval_for(self.position.side_to_move())
    }

    /// Evaluate this position from `color`'s perspective.
    ///
    /// A positive/high number is good for the `color`, while a negative number is better for the opponent.
    pub fn eval_for(&self, color: Color) -> Score {
        let mut score = Score::EVEN;

        // Iterate over every occupied square
        for (_, piece) in self.position.pieces() {
            let value = value_of(piece.kind());

            if color == piece.color() {
                score += value;
            } else {
                score -= value;
            }
        }

        score
    }

    /// Fetches the value for the piece on the specified square, if one exists.
    ///
    /// Positive for White pieces, negative for Black. Only used when printing the evaluator.
    fn value_at(&self, square: Square) -> Option<Score> {
        self.position
            .pieces()
            .find(|(sq, _)| *sq == square)
            .map(|(_, piece)| {
                let value = Score(value_of(piece.kind()));
                if piece.color() == Color::White {
                    value
                } else {
                    -value
                }
            })
    }
}

impl<P: Position> fmt::Display for Evaluator<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  +")?;
        for _ in File::iter() {
            write!(f, "-----+")?;
        }
        writeln!(f)?;

        for rank in Rank::iter().rev() {
            write!(f, "{rank} |")?;

            // Step 1: Write the piece char
            for file in File::iter() {
                let square = Square::new(file, rank);
                let piece_char = self
                    .position
                    .pieces()
                    .find(|(sq, _)| *sq == square)
                    .map(|(_, p)| p.char())
                    .unwrap_or(' ');
                write!(f, "  {piece_char}  |")?;
            }
            writeln!(f)?;
            write!(f, "  |")?;

            // Step 2: Write the contribution of that piece
            for file in File::iter() {
                let square = Square::new(file, rank);
                let score = match self.value_at(square) {
                    Some(val) if val > Score::EVEN => format!("+{}", val.normalize()),
                    Some(val) => format!("{}", val.normalize()),
                    None => String::new(),
                };
                write!(f, "{score:^5}|")?;
            }
            writeln!(f)?;

            write!(f, "  +")?;
            for _ in File::iter() {
                write!(f, "-----+")?;
            }
            writeln!(f)?;
        }
        for file in File::iter() {
            write!(f, "     {file}")?;
        }

        let score = self.eval_for(Color::White);
        let winning_side = if score > Score::EVEN {
            Some(Color::White)
        } else if score < Score::EVEN {
            Some(Color::Black)
        } else {
            None
        };

        writeln!(f, "\n")?;
        writeln!(
            f,
            "Material lead: {}",
            winning_side.map(|c| c.name()).unwrap_or("none")
        )?;
        write!(f, "Material: {:+}", score.normalize())
    }
}

/// Returns the material value of the provided `PieceKind`, in centipawns.
///
/// The King is given a large finite value so that losing it dominates any other material swing.
#[inline(always)]
pub const fn value_of(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 300,
        PieceKind::Bishop => 300,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 10_000,
    }
}
