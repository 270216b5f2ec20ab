// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging capability interface exported by the host as package `nexus.log`.
//!
//! Bundles that provide a log service implement [`LogService`] and publish it
//! under [`LOG_SERVICE_CLASS`]; clients look it up through the registry.

#![deny(clippy::all, missing_docs)]

use std::error::Error as StdError;

use crate::registry::{ServiceInterface, ServiceReference};

/// Package a bundle imports to use the logging capability.
pub const LOG_PACKAGE: &str = "nexus.log";
/// Object class the logging capability is registered under.
pub const LOG_SERVICE_CLASS: &str = "nexus.log.LogService";

/// Severity of a log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Code 1.
    Error,
    /// Code 2.
    Warning,
    /// Code 3.
    Info,
    /// Code 4.
    Debug,
    /// Any other code; carried through unchanged.
    Unknown(i32),
}

impl LogLevel {
    /// Maps a wire code onto a level.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => LogLevel::Error,
            2 => LogLevel::Warning,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            other => LogLevel::Unknown(other),
        }
    }

    /// Wire code of the level.
    pub fn code(self) -> i32 {
        match self {
            LogLevel::Error => 1,
            LogLevel::Warning => 2,
            LogLevel::Info => 3,
            LogLevel::Debug => 4,
            LogLevel::Unknown(code) => code,
        }
    }

    /// Upper-case label, `None` for unknown levels.
    pub fn label(self) -> Option<&'static str> {
        match self {
            LogLevel::Error => Some("ERROR"),
            LogLevel::Warning => Some("WARNING"),
            LogLevel::Info => Some("INFO"),
            LogLevel::Debug => Some("DEBUG"),
            LogLevel::Unknown(_) => None,
        }
    }

    /// Parses a label (case-insensitive) or a numeric code.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ERROR" => LogLevel::Error,
            "WARNING" | "WARN" => LogLevel::Warning,
            "INFO" => LogLevel::Info,
            "DEBUG" => LogLevel::Debug,
            other => LogLevel::from_code(other.parse().unwrap_or(0)),
        }
    }
}

/// Logging capability published in the service registry.
pub trait LogService: Send + Sync {
    /// Logs `message` with an optional originating reference and cause.
    fn log_full(
        &self,
        reference: Option<&ServiceReference>,
        level: LogLevel,
        message: Option<&str>,
        cause: Option<&(dyn StdError + 'static)>,
    );

    /// Logs `message` at `level`.
    fn log(&self, level: LogLevel, message: &str) {
        self.log_full(None, level, Some(message), None);
    }

    /// Logs `message` at `level` together with `cause`.
    fn log_with_cause(&self, level: LogLevel, message: &str, cause: &(dyn StdError + 'static)) {
        self.log_full(None, level, Some(message), Some(cause));
    }

    /// Logs `message` on behalf of the service behind `reference`.
    fn log_for(&self, reference: &ServiceReference, level: LogLevel, message: &str) {
        self.log_full(Some(reference), level, Some(message), None);
    }
}

impl ServiceInterface for dyn LogService {
    const OBJECT_CLASS: &'static str = LOG_SERVICE_CLASS;
}
