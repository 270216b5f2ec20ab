// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: In-process bundle host used to deploy and verify packaged services
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests per module; integration tests in `tests/`
//!
//! PUBLIC API:
//!   - `Framework`: install/resolve/start/stop/uninstall bundles, shared service registry
//!   - `Host`/`BundleHandle`: client traits implemented by the framework and test doubles
//!   - `Filter`: LDAP-style attribute filters for service lookup
//!   - `Manifest`: TOML bundle manifest parser and builder
//!   - `LogService`: logging capability interface (`nexus.log`)

#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod filter;
pub mod framework;
pub mod host;
pub mod lifecycle;
pub mod log_service;
pub mod manifest;
pub mod registry;

pub use cli::{execute, help};
pub use config::{ConfigError, HostConfig};
pub use filter::{Filter, FilterError};
pub use framework::{
    ActivatorError, Bundle, BundleActivator, BundleArchive, BundleContext, Error, Framework, ServiceRegistration,
};
pub use host::{BundleHandle, Host};
pub use lifecycle::{BundleId, BundleState};
pub use log_service::{LogLevel, LogService, LOG_PACKAGE, LOG_SERVICE_CLASS};
pub use manifest::{Manifest, ManifestBuilder};
pub use registry::{Properties, ServiceId, ServiceInterface, ServiceObject, ServiceReference};
