//! CONTEXT: Deployment lifecycle checks for the packaged basic log bundle
//! INTENT: Deploy `my-bundle`, find it by name, find its log service by filter, drive start/stop
//! IDL (target): Host::bundles, Host::service_references, BundleHandle::start/stop
//! DEPS: bundlehost (host traits, framework), basic-log (activator)
//! READINESS: Host backend ready; runs against any `Host` implementation
//! TESTS: Scenario steps in `tests/deployment_lifecycle.rs`
// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::panic::{self, AssertUnwindSafe};

use basic_log::{NATURE, NATURE_BASIC};
use bundlehost::manifest;
use bundlehost::registry::OBJECT_CLASS;
use bundlehost::{
    Bundle, BundleArchive, BundleHandle, BundleState, Framework, Host, LogLevel, LogService, LOG_SERVICE_CLASS,
};
use thiserror::Error;

/// Symbolic name the deployment is packaged under.
pub const SYMBOLIC_NAME: &str = "my-bundle";

/// Version the deployment is packaged with.
pub const VERSION: &str = "1.0.0";

/// Archive file name of the deployment.
pub const ARCHIVE_NAME: &str = "my-bundle.nxb";

/// Failure of a single check step.
#[derive(Debug, Error)]
pub enum CheckError {
    /// An expected condition did not hold.
    #[error("assertion failed: {0}")]
    Assertion(String),
    /// The host rejected a call (including malformed filters).
    #[error(transparent)]
    Host(#[from] bundlehost::Error),
}

fn ensure(condition: bool, message: impl Into<String>) -> Result<(), CheckError> {
    if condition {
        Ok(())
    } else {
        Err(CheckError::Assertion(message.into()))
    }
}

fn ensure_state<B: BundleHandle>(bundle: &B, expected: BundleState) -> Result<(), CheckError> {
    let actual = bundle.state();
    ensure(actual == expected, format!("bundle {} is {actual}, expected {expected}", bundle.symbolic_name()))
}

/// Filter selecting the basic log service registration.
pub fn log_service_filter() -> String {
    format!("(&({OBJECT_CLASS}={LOG_SERVICE_CLASS})({NATURE}={NATURE_BASIC}))")
}

/// Packages the basic log bundle as `my-bundle` 1.0.0.
pub fn deployment() -> manifest::Result<BundleArchive> {
    basic_log::package(SYMBOLIC_NAME, VERSION)
}

/// Installs [`deployment`] into `framework`.
pub fn deploy(framework: &Framework) -> Result<Bundle, CheckError> {
    let archive = deployment().map_err(bundlehost::Error::from)?;
    Ok(framework.install(archive)?)
}

/// Step 1: the host handed out a context.
pub fn check_context<H: Host>(context: Option<&H>) -> Result<&H, CheckError> {
    context.ok_or_else(|| CheckError::Assertion("bundle context not injected".into()))
}

/// Step 2: the bundle is resolved before start and active after.
pub fn check_activation<B: BundleHandle>(bundle: &B) -> Result<(), CheckError> {
    ensure_state(bundle, BundleState::Resolved)?;
    bundle.start()?;
    ensure_state(bundle, BundleState::Active)
}

/// Step 3: some installed bundle carries `expected` as symbolic name.
pub fn check_symbolic_name<H: Host>(host: &H, expected: &str) -> Result<(), CheckError> {
    let found = host.bundles().iter().any(|bundle| bundle.symbolic_name() == expected);
    ensure(found, format!("no installed bundle named {expected}"))
}

/// Step 4: exactly one log service matches `filter`, it carries `nature=basic`,
/// resolves to a live service and accepts a debug call.
pub fn check_log_service_with<H: Host>(host: &H, filter: &str) -> Result<(), CheckError> {
    let references = host.references_for::<dyn LogService>(Some(filter))?;
    ensure(references.len() == 1, format!("expected exactly one reference for {filter}, found {}", references.len()))?;
    let reference = &references[0];

    let nature = reference.property(NATURE);
    ensure(nature.is_some(), "no nature property on the service reference")?;
    ensure(nature == Some(NATURE_BASIC), format!("unexpected nature {nature:?}"))?;

    let service = host
        .get_service::<dyn LogService>(reference)
        .ok_or_else(|| CheckError::Assertion("log service not found".into()))?;
    let call = panic::catch_unwind(AssertUnwindSafe(|| service.log(LogLevel::Debug, "test")));
    ensure(call.is_ok(), "log service panicked on a debug call")
}

/// Step 4 with [`log_service_filter`].
pub fn check_log_service<H: Host>(host: &H) -> Result<(), CheckError> {
    check_log_service_with(host, &log_service_filter())
}

/// Step 5: stopping leaves the bundle resolved.
pub fn check_deactivation<B: BundleHandle>(bundle: &B) -> Result<(), CheckError> {
    bundle.stop()?;
    ensure_state(bundle, BundleState::Resolved)
}

/// Runs every step in order, stopping at the first failure.
pub fn run_scenario<H: Host>(context: Option<&H>, bundle: &H::Bundle) -> Result<(), CheckError> {
    let host = check_context(context)?;
    check_activation(bundle)?;
    check_symbolic_name(host, SYMBOLIC_NAME)?;
    check_log_service(host)?;
    check_deactivation(bundle)
}
