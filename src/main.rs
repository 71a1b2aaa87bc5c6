/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::Parser;
use learnchess::{Options, Session};
use tracing_subscriber::EnvFilter;

/// Environment variable used to filter diagnostic output.
const LOG_ENV: &str = "LEARNCHESS_LOG";

fn main() {
    let options = Options::parse();

    // stdout belongs to command output and UCI responses, so diagnostics go to stderr
    let default_level = if options.debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let game = match options.game() {
        Ok(game) => game,
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(2);
        }
    };

    let mut session = Session::from_game(game, options.config());

    if let Err(e) = session.run() {
        eprintln!("{} encountered an error: {e:#}", env!("CARGO_PKG_NAME"));
    }
}
