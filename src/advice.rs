/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use chessie::File;

use crate::{MoveDetails, Position};

/// Why a move might be worth playing.
///
/// Every move is given exactly one reason, chosen by the first matching rule in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// The move removes an enemy piece.
    Capture,

    /// The move attacks the enemy King.
    Check,

    /// The move lands on the d- or e-file.
    CenterControl,

    /// The move is an en passant capture.
    EnPassant,

    /// Nothing more specific applies.
    Development,
}

impl Reason {
    /// Classify a move by the first matching rule.
    ///
    /// Since en passant is itself a capture, [`Reason::EnPassant`] is only produced by engines
    /// that do not flag en passant as a capture.
    pub fn classify(details: &MoveDetails) -> Self {
        let to_file = details.to_file();

        if details.is_capture {
            Self::Capture
        } else if details.gives_check {
            Self::Check
        } else if to_file == File::D || to_file == File::E {
            Self::CenterControl
        } else if details.is_en_passant {
            Self::EnPassant
        } else {
            Self::Development
        }
    }

    /// The explanation shown to the player.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Capture => "captures an opponent's piece",
            Self::Check => "puts the king in check",
            Self::CenterControl => "controls the center",
            Self::EnPassant => "special en passant capture",
            Self::Development => "develops a piece and improves its position",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.description().fmt(f)
    }
}

/// A legal move paired with the reason it might be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advice<M> {
    /// The legal move being explained.
    pub mv: M,

    /// Why `mv` might be worth playing.
    pub reason: Reason,
}

impl<M: fmt::Display> fmt::Display for Advice<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.mv, self.reason)
    }
}

/// Explain every legal move in `position`, in the engine's enumeration order.
///
/// This is a classification pass only; moves are not ranked.
pub fn explain_moves<P: Position>(position: &P) -> Vec<Advice<P::Move>> {
    position
        .legal_moves()
        .into_iter()
        .map(|mv| Advice {
            mv,
            reason: Reason::classify(&position.describe(mv)),
        })
        .collect()
}

/// The hint surfaced to the player: the first entry of [`explain_moves`].
pub fn hint<P: Position>(position: &P) -> Option<Advice<P::Move>> {
    explain_moves(position).into_iter().next()
}

/// Returns `true` if a played move should be reviewed.
///
/// Only a plain capture passes. Quiet moves, en passant, and promotions (even capturing ones) are all flagged.
#[inline(always)]
pub const fn is_mistake(details: &MoveDetails) -> bool {
    !details.is_capture || details.is_en_passant || details.promotion.is_some()
}

/// A played move that was flagged by [`is_mistake`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mistake {
    /// Full-move number the mistake was made on.
    pub fullmove: usize,

    /// The move that was played.
    pub details: MoveDetails,
}

impl fmt::Display for Mistake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let piece = self.details.piece.map(|p| p.kind().char()).unwrap_or('?');

        write!(
            f,
            "{}. You moved {piece} from {} to {} - review better options!",
            self.fullmove, self.details.from, self.details.to
        )
    }
}

#[cfg(test)]
mod tests {
    use chessie::{Color, Game, Piece, PieceKind, Square};

    use super::*;

    fn details(to: &str) -> MoveDetails {
        MoveDetails {
            from: "a1".parse::<Square>().unwrap(),
            to: to.parse::<Square>().unwrap(),
            piece: Some(Piece::new(Color::White, PieceKind::Rook)),
            promotion: None,
            is_capture: false,
            gives_check: false,
            is_en_passant: false,
        }
    }

    #[test]
    fn test_reason_precedence() {
        let all = MoveDetails {
            is_capture: true,
            gives_check: true,
            is_en_passant: true,
            ..details("e4")
        };
        assert_eq!(Reason::classify(&all), Reason::Capture);

        let check_center = MoveDetails {
            gives_check: true,
            ..details("d4")
        };
        assert_eq!(Reason::classify(&check_center), Reason::Check);

        let center_ep = MoveDetails {
            is_en_passant: true,
            ..details("e6")
        };
        assert_eq!(Reason::classify(&center_ep), Reason::CenterControl);

        let ep = MoveDetails {
            is_en_passant: true,
            ..details("c6")
        };
        assert_eq!(Reason::classify(&ep), Reason::EnPassant);

        assert_eq!(Reason::classify(&details("h3")), Reason::Development);
    }

    #[test]
    fn test_explain_capture_and_check() {
        let game: Game = "7k/8/8/8/8/8/8/Rn2K3 w - - 0 1".parse().unwrap();
        let advice = explain_moves(&game);

        assert_eq!(advice.len(), game.legal_moves().len());

        let reason_for = |uci: &str| {
            advice
                .iter()
                .find(|a| a.mv.to_string() == uci)
                .map(|a| a.reason)
                .unwrap()
        };

        assert_eq!(reason_for("a1b1"), Reason::Capture);
        assert_eq!(reason_for("a1a8"), Reason::Check);
        assert_eq!(reason_for("e1d1"), Reason::CenterControl);
        assert_eq!(reason_for("e1e2"), Reason::CenterControl);
        assert_eq!(reason_for("e1f1"), Reason::Development);
        assert_eq!(reason_for("a1a4"), Reason::Development);
    }

    #[test]
    fn test_en_passant_is_reported_as_capture() {
        // Black just played d7d5
        let game: Game = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2".parse().unwrap();
        let advice = explain_moves(&game);
        let ep = advice.iter().find(|a| a.mv.to_string() == "e5d6").unwrap();
        assert_eq!(ep.reason, Reason::Capture);

        // Explained as a capture, but still flagged once played
        let details = game.describe(ep.mv);
        assert!(details.is_capture && details.is_en_passant);
        assert!(is_mistake(&details));

        let mistake = Mistake {
            fullmove: 2,
            details,
        };
        assert_eq!(
            mistake.to_string(),
            "2. You moved p from e5 to d6 - review better options!"
        );
    }

    #[test]
    fn test_hint_is_first_explanation() {
        let game = Game::default();
        let first = explain_moves(&game)[0];
        assert_eq!(hint(&game), Some(first));

        let mate: Game = "r1bqkbnr/pppp1Qpp/2n5/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 1"
            .parse()
            .unwrap();
        assert!(hint(&mate).is_none());
        assert!(explain_moves(&mate).is_empty());
    }

    #[test]
    fn test_mistakes() {
        let quiet = details("a4");
        assert!(is_mistake(&quiet));

        let capture = MoveDetails {
            is_capture: true,
            ..quiet
        };
        assert!(!is_mistake(&capture));

        let capture_promotion = MoveDetails {
            promotion: Some(PieceKind::Queen),
            ..capture
        };
        assert!(is_mistake(&capture_promotion));

        let mistake = Mistake {
            fullmove: 3,
            details: quiet,
        };
        assert_eq!(
            mistake.to_string(),
            "3. You moved r from a1 to a4 - review better options!"
        );
    }

    #[test]
    fn test_advice_display() {
        let game: Game = "7k/8/8/8/8/8/8/Rn2K3 w - - 0 1".parse().unwrap();
        let capture = explain_moves(&game)
            .into_iter()
            .find(|a| a.reason == Reason::Capture)
            .unwrap();
        assert_eq!(capture.to_string(), "a1b1: captures an opponent's piece");
    }
}
