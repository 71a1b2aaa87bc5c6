/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Move explanations, hints, and mistake detection.
mod advice;

/// Command-line options and interactive commands.
mod cli;

/// Evaluation of chess positions.
mod eval;

/// The boundary to the chess rules engine.
mod rules;

/// Scores assigned to positions and moves.
mod score;

/// Computer opponent; chooses a move for each difficulty.
mod search;

/// Game state and the interactive command loop.
mod session;

pub use advice::*;
pub use cli::*;
pub use eval::*;
pub use rules::*;
pub use score::*;
pub use search::*;
pub use session::*;
