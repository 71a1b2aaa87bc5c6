/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use chessie::{Color, Game};
use clap::{builder::PossibleValue, Parser, ValueEnum};
use uci_parser::UciCommand;

use crate::{Difficulty, SessionConfig};

/// Who the player is playing against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum Mode {
    /// The computer replies to every move.
    #[default]
    Computer,

    /// Two players share the board; the computer never moves.
    Friend,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Computer => write!(f, "computer"),
            Self::Friend => write!(f, "friend"),
        }
    }
}

/// The color the player takes when playing the computer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum Side {
    #[default]
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

/// Practice chess against a material-counting computer, with hints and feedback on your moves.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Options {
    /// How strong the computer plays.
    #[arg(short, long, default_value = "medium")]
    pub difficulty: Difficulty,

    /// Play against the computer, or against a friend on the same board.
    #[arg(short, long, default_value = "computer")]
    pub mode: Mode,

    /// The color you play against the computer. If black, the computer moves first.
    #[arg(long, default_value = "white")]
    pub play_as: Side,

    /// Milliseconds to wait before the computer replies.
    #[arg(long, default_value_t = 500)]
    pub delay_ms: u64,

    /// Seed for the computer's random choices, for reproducible games.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start from this FEN instead of the standard position.
    #[arg(long)]
    pub fen: Option<String>,

    /// Print debug diagnostics to stderr.
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

impl Options {
    /// The session configuration described by these options.
    pub fn config(&self) -> SessionConfig {
        SessionConfig {
            difficulty: self.difficulty,
            mode: self.mode,
            human: self.play_as.into(),
            computer_delay: Duration::from_millis(self.delay_ms),
            seed: self.seed,
        }
    }

    /// The starting position described by these options.
    pub fn game(&self) -> Result<Game> {
        match self.fen.as_deref() {
            Some(fen) => fen
                .parse()
                .with_context(|| format!("Failed to parse starting FEN {fen:?}")),
            None => Ok(Game::default()),
        }
    }
}

/// A command to be sent to the session.
#[derive(Debug, Clone, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<SESSION COMMAND> | <UCI COMMAND>")
)]
pub enum SessionCommand {
    /// Change the computer's difficulty, or display the current difficulty.
    #[command(alias = "level")]
    Difficulty { difficulty: Option<Difficulty> },

    /// Print a visual representation of the current board state.
    #[command(alias = "d")]
    Display,

    /// Print the material evaluation of the current position.
    Eval {
        /// If set, the contribution of every piece will be printed.
        #[arg(short, long, default_value = "false")]
        pretty: bool,
    },

    /// Quit the session.
    #[command(aliases = ["quit", "q"])]
    Exit,

    /// Explain every legal move in the current position.
    Explain,

    /// Generate and print a FEN string for the current position.
    Fen,

    /// Suggest a move, with the reason it might be good.
    Hint,

    /// Show every move played so far.
    History,

    /// Show the moves you should review.
    Mistakes,

    /// Switch between playing the computer and playing a friend, or display the current mode.
    Mode { mode: Option<Mode> },

    /// Play a move, given in UCI notation (e.g. `e2e4`, `e7e8q`).
    #[command(alias = "m")]
    Move { mv_string: String },

    /// Shows all legal moves in the current position.
    Moves,

    /// Start a new game from the standard position.
    New,

    /// Wrapper over UCI commands sent to the session.
    #[command(skip)]
    Uci { cmd: UciCommand },
}

impl FromStr for SessionCommand {
    type Err = clap::Error;
    /// Attempt to parse a [`SessionCommand`] from a string.
    ///
    /// If this fails, it will attempt to parse the string as a [`UciCommand`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::try_parse_from(s.split_ascii_whitespace()) {
            Ok(cmd) => Ok(cmd),
            Err(e) => {
                // If parsing failed, attempt to parse as a UciCommand
                if let Ok(cmd) = UciCommand::new(s) {
                    Ok(Self::Uci { cmd })
                } else {
                    Err(e)
                }
            }
        }
    }
}

impl ValueEnum for Difficulty {
    fn value_variants<'a>() -> &'a [Self] {
        &[Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        // Names are accepted alongside the numeric levels used by the UCI option
        let level = match self {
            Difficulty::Easy => "0",
            Difficulty::Medium => "1",
            Difficulty::Hard => "2",
        };

        Some(PossibleValue::new(self.name()).alias(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = Options::try_parse_from(["learnchess"]).unwrap();
        let config = options.config();

        assert_eq!(config.difficulty, Difficulty::Medium);
        assert_eq!(config.mode, Mode::Computer);
        assert_eq!(config.human, Color::White);
        assert_eq!(config.computer_delay, Duration::from_millis(500));
        assert_eq!(config.seed, None);
        assert_eq!(options.game().unwrap(), Game::default());
    }

    #[test]
    fn test_custom_options() {
        let options = Options::try_parse_from([
            "learnchess",
            "--difficulty",
            "hard",
            "--mode",
            "friend",
            "--play-as",
            "black",
            "--delay-ms",
            "0",
            "--seed",
            "9",
            "--fen",
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
        ])
        .unwrap();
        let config = options.config();

        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.mode, Mode::Friend);
        assert_eq!(config.human, Color::Black);
        assert_eq!(config.computer_delay, Duration::ZERO);
        assert_eq!(config.seed, Some(9));
        assert!(options.game().is_ok());
    }

    #[test]
    fn test_numeric_difficulty_alias() {
        let options = Options::try_parse_from(["learnchess", "-d", "0"]).unwrap();
        assert_eq!(options.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_bad_fen_is_reported() {
        let options = Options::try_parse_from(["learnchess", "--fen", "not a fen"]).unwrap();
        assert!(options.game().is_err());
    }

    #[test]
    fn test_parse_session_commands() {
        assert!(matches!(
            "move e2e4".parse::<SessionCommand>().unwrap(),
            SessionCommand::Move { mv_string } if mv_string == "e2e4"
        ));
        assert!(matches!(
            "m e7e8q".parse::<SessionCommand>().unwrap(),
            SessionCommand::Move { .. }
        ));
        assert!(matches!(
            "difficulty easy".parse::<SessionCommand>().unwrap(),
            SessionCommand::Difficulty {
                difficulty: Some(Difficulty::Easy)
            }
        ));
        assert!(matches!(
            "mode".parse::<SessionCommand>().unwrap(),
            SessionCommand::Mode { mode: None }
        ));
        assert!(matches!(
            "eval --pretty".parse::<SessionCommand>().unwrap(),
            SessionCommand::Eval { pretty: true }
        ));
        assert!(matches!(
            "hint".parse::<SessionCommand>().unwrap(),
            SessionCommand::Hint
        ));
    }

    #[test]
    fn test_uci_fallback() {
        assert!(matches!(
            "isready".parse::<SessionCommand>().unwrap(),
            SessionCommand::Uci { .. }
        ));
        assert!("fly away".parse::<SessionCommand>().is_err());
    }
}
