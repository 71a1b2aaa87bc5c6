/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt, io,
    sync::mpsc::{channel, Receiver, Sender},
    thread,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use chessie::{Color, Game, Move};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};
use uci_parser::{UciCommand, UciInfo, UciOption, UciParseError, UciResponse};

use crate::{
    evaluate, explain_moves, hint, is_mistake, Difficulty, Evaluator, Mistake, Mode, MoveDetails,
    Position, Score, Selector, SessionCommand,
};

/// Default time to wait before the computer replies, so the player's own move is seen first.
pub const DEFAULT_COMPUTER_DELAY: Duration = Duration::from_millis(500);

/// Errors caused by a move the player tried to make.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("the game is over; start a new one with `new`")]
    GameOver,

    #[error("it is the computer's turn to move as {0}")]
    NotYourTurn(&'static str),

    #[error("illegal move {0:?}; try `moves` to list legal moves")]
    IllegalMove(String),
}

/// Who made a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    Human,
    Computer,
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => write!(f, "you"),
            Self::Computer => write!(f, "computer"),
        }
    }
}

/// A single move in the game's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ply {
    /// The move that was played.
    pub mv: Move,

    /// Description of `mv` in the position it was played from.
    pub details: MoveDetails,

    /// Who played `mv`.
    pub player: Player,

    /// The color that played `mv`.
    pub color: Color,

    /// Full-move number of the position `mv` was played from.
    pub fullmove: usize,

    /// Material score after `mv`, from White's perspective.
    pub score: Score,
}

impl fmt::Display for Ply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dots = if self.color == Color::White { "." } else { "..." };
        write!(
            f,
            "{}{dots} {} ({}) material {:+}",
            self.fullmove,
            self.mv,
            self.player,
            self.score.normalize()
        )
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
    FiftyMoveRule,
    InsufficientMaterial,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkmate { winner } => write!(f, "checkmate, {} wins", winner.name()),
            Self::Stalemate => write!(f, "stalemate, the game is drawn"),
            Self::FiftyMoveRule => write!(f, "draw by the fifty-move rule"),
            Self::InsufficientMaterial => write!(f, "draw by insufficient material"),
        }
    }
}

/// Startup configuration for a [`Session`].
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// How strong the computer opponent plays.
    pub difficulty: Difficulty,

    /// Whether the computer replies to the player's moves.
    pub mode: Mode,

    /// The color the human plays when [`Mode::Computer`] is active.
    pub human: Color,

    /// Time to wait before the computer moves.
    pub computer_delay: Duration,

    /// Seed for the computer's randomness. Fresh entropy is used if `None`.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            mode: Mode::default(),
            human: Color::White,
            computer_delay: DEFAULT_COMPUTER_DELAY,
            seed: None,
        }
    }
}

/// A practice game against the computer (or a friend), with move history and mistake feedback.
#[derive(Debug)]
pub struct Session {
    /// The current state of the chess board.
    ///
    /// Replaced after every accepted move, and reset whenever a new game starts.
    game: Game,

    /// Every move played since the game started.
    history: Vec<Ply>,

    /// Moves by the player that were flagged for review.
    mistakes: Vec<Mistake>,

    /// Set once the position becomes terminal.
    outcome: Option<Outcome>,

    /// Startup configuration; difficulty and mode may change during the session.
    config: SessionConfig,

    /// Source of randomness for the computer opponent.
    rng: StdRng,

    /// One half of a channel, responsible for sending commands to the session to execute.
    sender: Sender<SessionCommand>,

    /// One half of a channel, responsible for receiving commands for the session to execute.
    receiver: Receiver<SessionCommand>,
}

impl Session {
    /// Constructs a new [`Session`] at the standard starting position, to be executed with [`Session::run`].
    pub fn new(config: SessionConfig) -> Self {
        Self::from_game(Game::default(), config)
    }

    /// Constructs a new [`Session`] starting from the provided position.
    pub fn from_game(game: Game, config: SessionConfig) -> Self {
        let (sender, receiver) = channel();

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut session = Self {
            game,
            history: Vec::new(),
            mistakes: Vec::new(),
            outcome: None,
            config,
            rng,
            sender,
            receiver,
        };
        session.outcome = session.compute_outcome();
        session
    }

    /// Returns a string of the program's name and current version.
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Returns a string of all authors of this program.
    pub fn authors(&self) -> String {
        // Split multiple authors by comma-space
        env!("CARGO_PKG_AUTHORS").replace(':', ", ")
    }

    /// The current position.
    #[inline(always)]
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// Every move played so far.
    #[inline(always)]
    pub fn history(&self) -> &[Ply] {
        &self.history
    }

    /// Every move the player made that was flagged for review.
    #[inline(always)]
    pub fn mistakes(&self) -> &[Mistake] {
        &self.mistakes
    }

    /// How the game ended, if it has.
    #[inline(always)]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Returns `true` once the game has ended.
    #[inline(always)]
    pub const fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// The session's current configuration.
    #[inline(always)]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Change the computer's difficulty. Takes effect on its next move.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        info!(%difficulty, "difficulty changed");
        self.config.difficulty = difficulty;
    }

    /// Change whether the computer replies to moves.
    pub fn set_mode(&mut self, mode: Mode) {
        info!(%mode, "mode changed");
        self.config.mode = mode;
    }

    /// Returns `true` if the side to move is played by the computer.
    pub fn is_computer_turn(&self) -> bool {
        self.config.mode == Mode::Computer && self.game.side_to_move() != self.config.human
    }

    /// Play the player's move, given in UCI notation.
    ///
    /// On success, the move is recorded in the history and checked for mistakes.
    /// On failure, the session is left untouched.
    pub fn play_human(&mut self, mv_str: &str) -> Result<Ply, SessionError> {
        if self.is_game_over() {
            return Err(SessionError::GameOver);
        }

        if self.is_computer_turn() {
            return Err(SessionError::NotYourTurn(
                self.game.side_to_move().name(),
            ));
        }

        let Some(mv) = self.game.parse_move(mv_str.trim()) else {
            return Err(SessionError::IllegalMove(mv_str.trim().to_string()));
        };

        let ply = self.apply(mv, Player::Human);

        if is_mistake(&ply.details) {
            let mistake = Mistake {
                fullmove: ply.fullmove,
                details: ply.details,
            };
            debug!(%mistake, "flagged mistake");
            self.mistakes.push(mistake);
        }

        Ok(ply)
    }

    /// Let the computer choose and play a move on the current position.
    ///
    /// Returns `None` if the game is already over.
    pub fn play_computer(&mut self) -> Option<Ply> {
        if self.is_game_over() {
            return None;
        }

        let res = Selector::new(&self.game, self.config.difficulty).start(&mut self.rng);
        let mv = res.bestmove?;

        Some(self.apply(mv, Player::Computer))
    }

    /// Starts a new game from the standard position, clearing all history.
    pub fn new_game(&mut self) {
        self.set_position(Game::default());
    }

    /// Replaces the current position, clearing all history.
    pub fn set_position(&mut self, game: Game) {
        self.game = game;
        self.history.clear();
        self.mistakes.clear();
        self.outcome = self.compute_outcome();
    }

    /// Applies `mv` and records it. `mv` must be legal.
    fn apply(&mut self, mv: Move, player: Player) -> Ply {
        let details = self.game.describe(mv);
        let color = self.game.side_to_move();
        let fullmove = self.game.fullmove();
        self.game = Position::with_move_made(&self.game, mv);

        let ply = Ply {
            mv,
            details,
            player,
            color,
            fullmove,
            score: evaluate(&self.game),
        };
        self.history.push(ply);
        self.outcome = self.compute_outcome();

        info!(%mv, %player, score = %ply.score, "move played");
        if let Some(outcome) = self.outcome {
            info!(%outcome, "game over");
        }

        ply
    }

    /// Determines whether (and how) the current position ends the game.
    fn compute_outcome(&self) -> Option<Outcome> {
        if !Position::is_terminal(&self.game) {
            return None;
        }

        let outcome = if self.game.legal_moves().is_empty() {
            if Position::is_in_check(&self.game) {
                Outcome::Checkmate {
                    winner: self.game.side_to_move().opponent(),
                }
            } else {
                Outcome::Stalemate
            }
        } else if self.game.can_draw_by_fifty() {
            Outcome::FiftyMoveRule
        } else {
            Outcome::InsufficientMaterial
        };

        Some(outcome)
    }

    /// Execute the main event loop for the session.
    ///
    /// This function spawns a thread to handle input from `stdin` and waits on received commands.
    pub fn run(&mut self) -> Result<()> {
        // Spawn a separate thread for handling user input
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                warn!("Input handler thread stopping after fatal error: {err:#}");
            }
        });

        // If the player chose Black, the computer opens
        self.respond();

        // Loop on user input
        while let Ok(cmd) = self.receiver.recv() {
            match cmd {
                SessionCommand::Difficulty { difficulty } => {
                    if let Some(difficulty) = difficulty {
                        self.set_difficulty(difficulty);
                    }
                    println!("difficulty: {}", self.config.difficulty);
                }

                SessionCommand::Display => self.display(),

                SessionCommand::Eval { pretty } => self.eval(pretty),

                SessionCommand::Exit => break,

                SessionCommand::Explain => {
                    let advice = explain_moves(&self.game);
                    if advice.is_empty() {
                        println!("(none)");
                    }
                    for entry in advice {
                        println!("{entry}");
                    }
                }

                SessionCommand::Fen => println!("{}", self.game.to_fen()),

                SessionCommand::Hint => match hint(&self.game) {
                    Some(advice) => println!("hint: try {}, it {}", advice.mv, advice.reason),
                    None => println!("no moves available"),
                },

                SessionCommand::History => self.print_history(),

                SessionCommand::Mistakes => {
                    if self.mistakes.is_empty() {
                        println!("No mistakes yet. Great job!");
                    }
                    for mistake in &self.mistakes {
                        println!("{mistake}");
                    }
                }

                SessionCommand::Mode { mode } => {
                    if let Some(mode) = mode {
                        self.set_mode(mode);
                        self.respond();
                    }
                    println!("mode: {}", self.config.mode);
                }

                SessionCommand::Move { mv_string } => match self.play_human(&mv_string) {
                    Ok(ply) => {
                        println!("you played {}", ply.mv);
                        self.announce_outcome();
                        self.respond();
                    }
                    Err(e) => eprintln!("{e}"),
                },

                SessionCommand::Moves => {
                    let moves = self.game.legal_moves();

                    // If there are none, print "(none)"
                    let moves_string = if moves.is_empty() {
                        String::from("(none)")
                    } else {
                        // Otherwise, join them by comma-space
                        moves
                            .into_iter()
                            .map(|mv| mv.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    };
                    println!("{moves_string}");
                }

                SessionCommand::New => {
                    self.new_game();
                    println!("new game started");
                    self.respond();
                }

                SessionCommand::Uci { cmd } => {
                    // Keep running, even on error
                    match self.handle_uci_command(cmd) {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => eprintln!("Error: {e:#}"),
                    }
                }
            };
        }

        Ok(())
    }

    /// If the computer is to move, wait the configured delay, then play its move and print it.
    fn respond(&mut self) {
        if self.is_game_over() || !self.is_computer_turn() {
            return;
        }

        thread::sleep(self.config.computer_delay);

        if let Some(ply) = self.play_computer() {
            println!("computer played {}", ply.mv);
            self.announce_outcome();
        }
    }

    /// Prints the outcome of the game, if it has ended.
    fn announce_outcome(&self) {
        if let Some(outcome) = self.outcome {
            println!("game over: {outcome}");
        }
    }

    /// Handle the execution of a single [`UciCommand`].
    ///
    /// Returns `Ok(true)` if the session should quit.
    fn handle_uci_command(&mut self, uci: UciCommand) -> Result<bool> {
        use UciCommand::*;
        match uci {
            Uci => self.uci(),

            IsReady => println!("{}", UciResponse::<&str>::ReadyOk),

            SetOption { name, value } => self.set_option(&name, value)?,

            UciNewGame => self.new_game(),

            Position { fen, moves } => self.position(fen, moves)?,

            Go(_) => self.go(),

            // Selection is synchronous, so there is never anything to stop
            Stop => {}

            Quit => return Ok(true),

            _ => bail!("{} does not support UCI command {uci:?}", self.name()),
        }

        Ok(false)
    }

    /// Called when the session receives the `uci` command.
    ///
    /// Prints the program's ID, version, and authors, and lists all UCI options.
    fn uci(&self) {
        println!("id name {}\nid author {}\n", self.name(), self.authors());

        // Print all UCI options
        for opt in self.options() {
            println!("{}", UciResponse::Option(opt));
        }

        // We're ready to go!
        println!("{}", UciResponse::<&str>::UciOk)
    }

    /// Convenience function to return an iterator over all UCI options this program supports.
    fn options(&self) -> impl Iterator<Item = UciOption> {
        [UciOption::spin(
            "Difficulty",
            Difficulty::default().level(),
            Difficulty::Easy.level(),
            Difficulty::Hard.level(),
        )]
        .into_iter()
    }

    /// Handles the `setoption` command, setting option `name` to `value`.
    ///
    /// Will return an error if `name` isn't a valid option or `value` is not a valid value for that option.
    fn set_option(&mut self, name: &str, value: Option<String>) -> Result<()> {
        match name {
            "Difficulty" => {
                let Some(value) = value.as_ref() else {
                    bail!("usage: setoption name {name} value <easy / medium / hard>");
                };

                let difficulty = value
                    .parse()
                    .with_context(|| format!("Failed to set option {name:?}"))?;
                self.set_difficulty(difficulty);
            }

            _ => bail!("{} has no option named {name:?}", self.name()),
        }

        Ok(())
    }

    /// Set the position to the supplied FEN string (defaults to the standard startpos if not supplied),
    /// and then apply `moves` one-by-one to the position.
    fn position<T: AsRef<str>>(
        &mut self,
        fen: Option<T>,
        moves: impl IntoIterator<Item = T>,
    ) -> Result<()> {
        // Set the new position
        let mut game = if let Some(fen) = fen {
            fen.as_ref().parse()?
        } else {
            Game::default()
        };

        // Apply the provided moves
        for mv_str in moves {
            let mv_str = mv_str.as_ref();
            let Some(mv) = game.parse_move(mv_str) else {
                bail!("illegal move {mv_str:?} in position {:?}", game.to_fen());
            };
            game = Position::with_move_made(&game, mv);
        }

        self.set_position(game);
        Ok(())
    }

    /// Executes the `go` command, choosing a move on the current position and sending `bestmove`.
    fn go(&mut self) {
        let res = Selector::new(&self.game, self.config.difficulty).start(&mut self.rng);

        self.send_info(
            UciInfo::new()
                .depth(1)
                .nodes(res.nodes)
                .score(res.score.into_uci())
                .string(format!("difficulty {}", self.config.difficulty)),
        );

        let response = UciResponse::BestMove {
            bestmove: res.bestmove,
            ponder: None,
        };
        println!("{response}");
    }

    /// Helper to send a [`UciInfo`] to `stdout`.
    fn send_info(&self, info: UciInfo) {
        let resp = UciResponse::<String>::Info(Box::new(info));
        println!("{resp}");
    }

    /// Executes the `display` command, printing the current position.
    fn display(&self) {
        println!("{}", self.game);
    }

    /// Executes the `eval` command, printing the material score of the current position.
    fn eval(&self, pretty: bool) {
        let evaluator = Evaluator::new(&self.game);
        if pretty {
            println!("{evaluator}");
        } else {
            println!("{}", evaluate(&self.game));
        }
    }

    /// Executes the `history` command, printing one line per move.
    fn print_history(&self) {
        if self.history.is_empty() {
            println!("(none)");
        }

        for ply in &self.history {
            println!("{ply}");
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// Loops endlessly to await input via `stdin`, sending all successfully-parsed commands through the supplied `sender`.
fn input_handler(sender: Sender<SessionCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        // Clear the buffer, read input, and trim the trailing newline
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line when parsing commands")?;

        // For ctrl + d
        if 0 == bytes {
            // Send the Exit command and exit this function
            sender
                .send(SessionCommand::Exit)
                .context("Failed to send 'exit' command after receiving empty input")?;

            debug!("received end of input; exiting");
            return Ok(());
        }

        // Trim any leading/trailing whitespace
        let buf = buffer.trim();

        // Ignore empty lines
        if buf.is_empty() {
            continue;
        }

        // Attempt to parse the input as a UCI command first, so GUIs can drive the session
        match UciCommand::new(buf) {
            Ok(cmd) => sender
                .send(SessionCommand::Uci { cmd })
                .context("Failed to send UCI command to session")?,

            // If it's not a UCI command, check if it's a session command
            Err(UciParseError::UnrecognizedCommand { cmd: _ }) => {
                match SessionCommand::try_parse_from(buf.split_ascii_whitespace()) {
                    Ok(cmd) => sender
                        .send(cmd)
                        .context("Failed to send command to session")?,

                    // If it wasn't a session command, either, print an error.
                    Err(err) => eprintln!("{err}"),
                }
            }

            // If it was a UCI command, print a usage message.
            Err(uci_err) => eprintln!("{uci_err:#}"),
        }
    }
}
