// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bundle manifest parser and builder.
//!
//! The parser focuses on validation and reporting rather than I/O so it can be
//! exercised directly from tests. Manifests are TOML documents carrying the
//! bundle identity, the packages it imports and exports, and the name of the
//! activator invoked on start/stop.

#![deny(clippy::all, missing_docs)]

use semver::Version;
use serde::Serialize;
use thiserror::Error;
use toml::{self, Value};

/// Only manifest layout understood by the host.
pub const MANIFEST_VERSION: i64 = 2;

const KNOWN_KEYS: &[&str] = &[
    "manifest_version",
    "symbolic_name",
    "version",
    "import_packages",
    "export_packages",
    "activator",
];

/// Result alias returned by the parser.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors emitted while parsing or rendering manifests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The manifest failed to parse as TOML.
    #[error("manifest parse error: {0}")]
    Toml(String),
    /// A required field was not provided.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    /// The root element is not a TOML table.
    #[error("manifest root must be a TOML table")]
    InvalidRoot,
    /// A field contained a malformed value.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable reason for the failure.
        reason: String,
    },
}

/// Parsed bundle manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Unique identity of the bundle.
    pub symbolic_name: String,
    /// Bundle version.
    pub version: Version,
    /// Packages the bundle requires from the host or other bundles.
    pub import_packages: Vec<String>,
    /// Packages the bundle provides to others.
    pub export_packages: Vec<String>,
    /// Name of the activator invoked on start/stop, if any.
    pub activator: Option<String>,
    /// Non-fatal warnings produced during parsing.
    pub warnings: Vec<String>,
}

impl Manifest {
    /// Starts a manifest builder.
    pub fn builder() -> ManifestBuilder {
        ManifestBuilder::default()
    }

    /// Parses a manifest from a UTF-8 TOML string.
    pub fn parse_str(input: &str) -> Result<Self> {
        let value: Value = toml::from_str(input).map_err(|err| Error::Toml(err.to_string()))?;
        let table: &toml::Table = value.as_table().ok_or(Error::InvalidRoot)?;

        let mut warnings = Vec::new();
        for key in table.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                warnings.push(format!("unknown key `{key}`"));
            }
        }

        match table.get("manifest_version") {
            Some(Value::Integer(MANIFEST_VERSION)) => {}
            Some(Value::Integer(other)) => {
                return Err(Error::InvalidField {
                    field: "manifest_version",
                    reason: format!("unsupported version {other}"),
                })
            }
            Some(_) => {
                return Err(Error::InvalidField {
                    field: "manifest_version",
                    reason: "expected integer".into(),
                })
            }
            None => return Err(Error::MissingField("manifest_version")),
        }

        let name_raw = require_string(table, "symbolic_name")?;
        let symbolic_name = name_raw.trim().to_string();
        if symbolic_name.is_empty() {
            return Err(Error::InvalidField { field: "symbolic_name", reason: "must not be empty".into() });
        }

        let version_raw = require_string(table, "version")?;
        let version = Version::parse(version_raw.trim())
            .map_err(|err| Error::InvalidField { field: "version", reason: err.to_string() })?;

        let import_packages = optional_string_array(table, "import_packages")?;
        let export_packages = optional_string_array(table, "export_packages")?;

        let activator = match table.get("activator") {
            None => None,
            Some(Value::String(value)) if !value.trim().is_empty() => Some(value.trim().to_string()),
            Some(Value::String(_)) => {
                return Err(Error::InvalidField { field: "activator", reason: "must not be empty".into() })
            }
            Some(_) => {
                return Err(Error::InvalidField { field: "activator", reason: "expected string".into() })
            }
        };

        Ok(Self { symbolic_name, version, import_packages, export_packages, activator, warnings })
    }

    /// Renders the manifest back into TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        let raw = RawManifest {
            manifest_version: MANIFEST_VERSION,
            symbolic_name: &self.symbolic_name,
            version: self.version.to_string(),
            import_packages: &self.import_packages,
            export_packages: &self.export_packages,
            activator: self.activator.as_deref(),
        };
        toml::to_string(&raw).map_err(|err| Error::Toml(err.to_string()))
    }
}

#[derive(Serialize)]
struct RawManifest<'a> {
    manifest_version: i64,
    symbolic_name: &'a str,
    version: String,
    #[serde(skip_serializing_if = "no_packages")]
    import_packages: &'a [String],
    #[serde(skip_serializing_if = "no_packages")]
    export_packages: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    activator: Option<&'a str>,
}

fn no_packages(packages: &&[String]) -> bool {
    packages.is_empty()
}

/// Programmatic manifest construction, mirroring the TOML layout.
#[derive(Debug, Default, Clone)]
pub struct ManifestBuilder {
    symbolic_name: Option<String>,
    version: Option<String>,
    import_packages: Vec<String>,
    export_packages: Vec<String>,
    activator: Option<String>,
}

impl ManifestBuilder {
    /// Sets the bundle symbolic name.
    pub fn symbolic_name(mut self, name: impl Into<String>) -> Self {
        self.symbolic_name = Some(name.into());
        self
    }

    /// Sets the bundle version (semver text).
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Adds an imported package.
    pub fn import_package(mut self, package: impl Into<String>) -> Self {
        self.import_packages.push(package.into());
        self
    }

    /// Adds an exported package.
    pub fn export_package(mut self, package: impl Into<String>) -> Self {
        self.export_packages.push(package.into());
        self
    }

    /// Names the activator invoked on start/stop.
    pub fn activator(mut self, activator: impl Into<String>) -> Self {
        self.activator = Some(activator.into());
        self
    }

    /// Validates the collected fields with the same rules as [`Manifest::parse_str`].
    pub fn build(self) -> Result<Manifest> {
        let symbolic_name = self.symbolic_name.ok_or(Error::MissingField("symbolic_name"))?;
        let symbolic_name = symbolic_name.trim().to_string();
        if symbolic_name.is_empty() {
            return Err(Error::InvalidField { field: "symbolic_name", reason: "must not be empty".into() });
        }
        let version_raw = self.version.ok_or(Error::MissingField("version"))?;
        let version = Version::parse(version_raw.trim())
            .map_err(|err| Error::InvalidField { field: "version", reason: err.to_string() })?;
        let import_packages = validate_packages("import_packages", self.import_packages)?;
        let export_packages = validate_packages("export_packages", self.export_packages)?;
        let activator = match self.activator {
            Some(name) if name.trim().is_empty() => {
                return Err(Error::InvalidField { field: "activator", reason: "must not be empty".into() })
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        Ok(Manifest { symbolic_name, version, import_packages, export_packages, activator, warnings: Vec::new() })
    }
}

fn validate_packages(field: &'static str, packages: Vec<String>) -> Result<Vec<String>> {
    packages
        .into_iter()
        .map(|package| {
            let trimmed = package.trim();
            if trimmed.is_empty() {
                Err(Error::InvalidField { field, reason: "entries must not be empty".into() })
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}

fn require_string(table: &toml::Table, field: &'static str) -> Result<String> {
    match table.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(Error::InvalidField { field, reason: "expected string".into() }),
        None => Err(Error::MissingField(field)),
    }
}

fn optional_string_array(table: &toml::Table, field: &'static str) -> Result<Vec<String>> {
    let Some(raw) = table.get(field) else {
        return Ok(Vec::new());
    };
    let array = raw
        .as_array()
        .ok_or_else(|| Error::InvalidField { field, reason: "expected array of strings".into() })?;

    let mut values = Vec::with_capacity(array.len());
    for item in array {
        let value = item
            .as_str()
            .ok_or_else(|| Error::InvalidField { field, reason: "expected array of strings".into() })?;
        values.push(value.to_string());
    }
    validate_packages(field, values)
}
