// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: bundlehostd – boots an in-process bundle host with the basic log bundle
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Host tests in `source/services/bundlehostd/tests/`

#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use bundlehost::{BundleHandle, Framework, HostConfig};
use clap::Parser;
use log::info;

/// Command-line arguments of the daemon.
#[derive(Debug, Parser)]
#[command(name = "bundlehostd", about = "Hosts the basic log bundle and runs one management command")]
pub struct Args {
    /// Host configuration file (TOML).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Symbolic name to deploy the basic log bundle under.
    #[arg(long, default_value = "basic-log")]
    pub bundle_name: String,
    /// Version to deploy the basic log bundle with.
    #[arg(long, default_value = "1.0.0")]
    pub bundle_version: String,
    /// Leave the bundle resolved instead of starting it.
    #[arg(long)]
    pub no_start: bool,
    /// Management command passed to the bundle host CLI (defaults to `list`).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Boots the framework described by `args` and returns the command output.
pub fn run(args: &Args) -> anyhow::Result<String> {
    let config = match &args.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    let framework = Framework::new(config);
    info!("bundlehostd: host exports {}", framework.config().exported_packages.join(", "));
    let archive = basic_log::package(&args.bundle_name, &args.bundle_version)
        .with_context(|| format!("packaging {}", args.bundle_name))?;
    let bundle = framework.install(archive)?;
    info!("bundlehostd: deployed {} as bundle {}", bundle.symbolic_name(), bundle.id());
    if !args.no_start {
        bundle.start().with_context(|| format!("starting {}", bundle.symbolic_name()))?;
    }

    let command: Vec<&str> = if args.command.is_empty() {
        vec!["list"]
    } else {
        args.command.iter().map(String::as_str).collect()
    };
    Ok(bundlehost::execute(&command, &framework))
}
