// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use clap::Parser;
use move_web_cli::{run_cli, MoveWebCli};
use std::process::exit;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter. `RUST_LOG` is consulted if it is unset.
const LOG_ENV: &str = "MOVE_WEB_LOG";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = MoveWebCli::parse();
    init_logging(args.move_args.verbose);

    let result = run_cli(&args.move_args, &args.cmd, &mut std::io::stdout().lock());
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}
