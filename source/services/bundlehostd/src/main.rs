// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
#![forbid(unsafe_code)]

//! CONTEXT: bundlehostd entrypoint wiring logging and arguments to the shared host logic

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    env_logger::init();
    let args = bundlehostd::Args::parse();
    match bundlehostd::run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("bundlehostd: {err:#}");
            ExitCode::FAILURE
        }
    }
}
