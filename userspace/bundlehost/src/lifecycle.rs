// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bundle identity and lifecycle states.

#![deny(clippy::all, missing_docs)]

use std::fmt;

/// Identifier assigned to each installed bundle, unique for the framework lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BundleId(u64);

impl BundleId {
    /// Identifier of the framework itself (the system bundle).
    pub const SYSTEM: Self = Self(0);

    pub(crate) const fn first() -> Self {
        Self(1)
    }

    /// Returns the next monotonically increasing identifier.
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an installed bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleState {
    /// Installed but its imports are not (yet) satisfied.
    Installed,
    /// Imports satisfied; ready to start.
    Resolved,
    /// Activator started; services may be registered.
    Active,
    /// Activator stop hook is running.
    Stopping,
    /// Removed from the framework; the handle is dead.
    Uninstalled,
}

impl BundleState {
    /// Upper-case label used by the CLI and logs.
    pub fn label(self) -> &'static str {
        match self {
            BundleState::Installed => "INSTALLED",
            BundleState::Resolved => "RESOLVED",
            BundleState::Active => "ACTIVE",
            BundleState::Stopping => "STOPPING",
            BundleState::Uninstalled => "UNINSTALLED",
        }
    }
}

impl fmt::Display for BundleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
