// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Startup hook publishing the basic log service.

use std::sync::Arc;

use bundlehost::manifest;
use bundlehost::{
    ActivatorError, BundleActivator, BundleArchive, BundleContext, LogService, Manifest, Properties,
    ServiceRegistration, LOG_PACKAGE,
};
use log::debug;
use parking_lot::Mutex;

use crate::BasicLogService;

/// Name the manifest uses to designate [`Activator`].
pub const ACTIVATOR_NAME: &str = "basic_log::Activator";
/// Registration property classifying log service implementations.
pub const NATURE: &str = "nature";
/// Value of [`NATURE`] advertised by this bundle.
pub const NATURE_BASIC: &str = "basic";

/// Registers a [`LogService`] tagged `nature=basic` while the bundle is active.
pub struct Activator {
    service: Arc<dyn LogService>,
    registration: Mutex<Option<ServiceRegistration>>,
}

impl Activator {
    /// Activator publishing a stdout-backed [`BasicLogService`].
    pub fn new() -> Self {
        Self::with_service(Arc::new(BasicLogService::new()))
    }

    /// Activator publishing `service` instead of the stdout default.
    pub fn with_service(service: Arc<dyn LogService>) -> Self {
        Self { service, registration: Mutex::new(None) }
    }
}

impl Default for Activator {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleActivator for Activator {
    fn start(&self, context: &BundleContext) -> Result<(), ActivatorError> {
        let mut properties = Properties::new();
        properties.insert(NATURE.to_string(), NATURE_BASIC.to_string());
        let registration = context.register_service::<dyn LogService>(Arc::clone(&self.service), properties)?;
        debug!("basic-log: published service {}", registration.reference().id());
        *self.registration.lock() = Some(registration);
        Ok(())
    }

    fn stop(&self, _context: &BundleContext) -> Result<(), ActivatorError> {
        if let Some(registration) = self.registration.lock().take() {
            registration.unregister();
        }
        Ok(())
    }
}

/// Packages the basic log bundle under `symbolic_name`/`version`.
pub fn package(symbolic_name: &str, version: &str) -> manifest::Result<BundleArchive> {
    let manifest = Manifest::builder()
        .symbolic_name(symbolic_name)
        .version(version)
        .import_package(LOG_PACKAGE)
        .activator(ACTIVATOR_NAME)
        .build()?;
    Ok(BundleArchive::from_manifest(format!("{symbolic_name}.nxb"), &manifest)?
        .with_activator(ACTIVATOR_NAME, Arc::new(Activator::new())))
}
