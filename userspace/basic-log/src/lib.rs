// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Basic log service bundle
//! INTENT: Leveled line formatter published as `nexus.log.LogService` with `nature=basic`
//! DEPS: bundlehost (capability interface, activator contract)
//! READINESS: Ready; prints to stdout
//! TESTS: Level labels, cause rendering, activator publish/withdraw
//!
//! Lines have the shape `[LEVEL] message[, exception:reason]`. Only the
//! cause's own source is rendered after `exception:`, never the cause's
//! message; a cause without a source renders as an empty reason.

#![forbid(unsafe_code)]

pub mod activator;

pub use activator::{package, Activator, ACTIVATOR_NAME, NATURE, NATURE_BASIC};

use std::error::Error as StdError;
use std::io::{self, Write};

use bundlehost::{LogLevel, LogService, ServiceReference};

/// Destination of formatted lines.
pub trait LineSink: Send + Sync {
    /// Writes one formatted line. Must not fail.
    fn emit(&self, line: &str);
}

/// Writes lines to the process standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl LineSink for Stdout {
    fn emit(&self, line: &str) {
        let mut out = io::stdout().lock();
        // Nothing sensible to do if stdout is gone.
        let _ = writeln!(out, "{line}");
    }
}

/// Formats one log call into its printed line.
pub fn format_line(level: LogLevel, message: Option<&str>, cause: Option<&(dyn StdError + 'static)>) -> String {
    let mut message = message.unwrap_or_default().to_string();
    if let Some(cause) = cause {
        message.push_str(", exception:");
        if let Some(reason) = cause.source() {
            message.push_str(&reason.to_string());
        }
    }
    format!("[{}] {}", level.label().unwrap_or_default(), message)
}

/// Stateless log service writing to a [`LineSink`].
#[derive(Debug, Default, Clone)]
pub struct BasicLogService<S = Stdout> {
    sink: S,
}

impl BasicLogService {
    /// Log service printing to standard output.
    pub fn new() -> Self {
        Self { sink: Stdout }
    }
}

impl<S: LineSink> BasicLogService<S> {
    /// Log service printing to `sink`.
    pub fn with_sink(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: LineSink> LogService for BasicLogService<S> {
    fn log_full(
        &self,
        _reference: Option<&ServiceReference>,
        level: LogLevel,
        message: Option<&str>,
        cause: Option<&(dyn StdError + 'static)>,
    ) {
        self.sink.emit(&format_line(level, message, cause));
    }
}
