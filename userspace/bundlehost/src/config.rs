// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host configuration loaded from TOML.

#![deny(clippy::all, missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::log_service::LOG_PACKAGE;

/// Errors raised while loading a [`HostConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read host config {path}: {source}")]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config text is not valid TOML for [`HostConfig`].
    #[error("failed to parse host config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Framework settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Packages the host itself exports to installed bundles.
    pub exported_packages: Vec<String>,
    /// Attempt resolution right after install.
    pub resolve_on_install: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { exported_packages: vec![LOG_PACKAGE.to_string()], resolve_on_install: true }
    }
}

impl HostConfig {
    /// Parses a config from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Reads and parses the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&data)
    }

    pub(crate) fn exports(&self, package: &str) -> bool {
        self.exported_packages.iter().any(|exported| exported.trim() == package)
    }
}
