/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use chessie::{Color, File, Game, Piece, PieceKind, Square};

/// Everything the evaluator, selector, and advice generator need to know about a single move.
///
/// Produced by the rules engine; never constructed from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveDetails {
    /// Square the piece moves from.
    pub from: Square,

    /// Square the piece moves to.
    pub to: Square,

    /// The piece being moved.
    ///
    /// Only `None` if the origin square is empty, which the engine never produces for a legal move.
    pub piece: Option<Piece>,

    /// What the piece promotes to, if this is a promotion.
    pub promotion: Option<PieceKind>,

    /// Whether an enemy piece is removed by this move (en passant included).
    pub is_capture: bool,

    /// Whether the opponent's King is in check after this move.
    pub gives_check: bool,

    /// Whether this move is an en passant capture.
    pub is_en_passant: bool,
}

impl MoveDetails {
    /// The file this move lands on.
    #[inline(always)]
    pub const fn to_file(&self) -> File {
        self.to.file()
    }
}

/// Capabilities this crate requires from a chess rules engine.
///
/// Positions are treated as immutable snapshots: making a move always yields a successor,
/// and never modifies `self`.
pub trait Position: Clone {
    /// The engine's representation of a move.
    type Move: Copy + PartialEq + fmt::Debug + fmt::Display;

    /// All legal moves for the side to move, in the engine's enumeration order.
    fn legal_moves(&self) -> Vec<Self::Move>;

    /// Copies `self` and returns the position after `mv` has been played.
    fn with_move_made(&self, mv: Self::Move) -> Self;

    /// The side whose turn it is.
    fn side_to_move(&self) -> Color;

    /// Returns `true` if the game has ended in this position.
    fn is_terminal(&self) -> bool;

    /// Returns `true` if the side to move is in check.
    fn is_in_check(&self) -> bool;

    /// Every piece currently on the board, alongside the square it occupies.
    fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_;

    /// Describe `mv`, which must be legal in this position.
    fn describe(&self, mv: Self::Move) -> MoveDetails;

    /// Parse a move in UCI notation (`e2e4`, `e7e8q`), accepting it only if it is legal here.
    fn parse_move(&self, uci: &str) -> Option<Self::Move> {
        self.legal_moves()
            .into_iter()
            .find(|mv| mv.to_string() == uci)
    }
}

impl Position for Game {
    type Move = chessie::Move;

    #[inline(always)]
    fn legal_moves(&self) -> Vec<Self::Move> {
        self.get_legal_moves().into_iter().collect()
    }

    #[inline(always)]
    fn with_move_made(&self, mv: Self::Move) -> Self {
        Game::with_move_made(self, mv)
    }

    #[inline(always)]
    fn side_to_move(&self) -> Color {
        // Resolves to the inherent method on the underlying `chessie::Position`
        (**self).side_to_move()
    }

    fn is_terminal(&self) -> bool {
        self.get_legal_moves().is_empty()
            || self.can_draw_by_fifty()
            || self.can_draw_by_insufficient_material()
    }

    #[inline(always)]
    fn is_in_check(&self) -> bool {
        Game::is_in_check(self)
    }

    fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.board().into_iter()
    }

    fn describe(&self, mv: Self::Move) -> MoveDetails {
        MoveDetails {
            from: mv.from(),
            to: mv.to(),
            piece: self.piece_at(mv.from()),
            promotion: mv.promotion(),
            is_capture: mv.is_capture(),
            gives_check: Game::with_move_made(self, mv).is_in_check(),
            is_en_passant: mv.is_en_passant(),
        }
    }
}
