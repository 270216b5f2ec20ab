// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory bundle framework: installation, resolution, lifecycle and the
//! service registry shared by all installed bundles.
//!
//! The framework never holds its lock while an activator runs, so activators
//! are free to register services or query the host from their hooks.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;
use semver::Version;
use thiserror::Error;

use crate::config::HostConfig;
use crate::filter::FilterError;
use crate::host::{parse_filter, BundleHandle, Host};
use crate::lifecycle::{BundleId, BundleState};
use crate::manifest::{self, Manifest};
use crate::registry::{erase, Properties, Registry, ServiceInterface, ServiceObject, ServiceReference};

/// Result alias for framework operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error raised by activator hooks.
pub type ActivatorError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the framework.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A bundle with the same symbolic name and version is already installed.
    #[error("bundle {name} {version} already installed")]
    AlreadyInstalled {
        /// Symbolic name of the duplicate.
        name: String,
        /// Version of the duplicate.
        version: Version,
    },
    /// The archive manifest is invalid.
    #[error("manifest error: {0}")]
    Manifest(#[from] manifest::Error),
    /// The manifest names an activator the archive does not carry.
    #[error("archive does not contain activator `{0}`")]
    MissingActivator(String),
    /// Imported packages are not exported by anyone.
    #[error("bundle {bundle} cannot resolve imports: {}", .missing.join(", "))]
    Unresolved {
        /// Symbolic name of the bundle.
        bundle: String,
        /// Packages nobody exports.
        missing: Vec<String>,
    },
    /// The bundle handle refers to an uninstalled bundle.
    #[error("bundle {0} is uninstalled")]
    Uninstalled(BundleId),
    /// The operation is not allowed in the bundle's current state.
    #[error("bundle {bundle} is {state}")]
    InvalidState {
        /// Bundle identifier.
        bundle: BundleId,
        /// State that rejected the operation.
        state: BundleState,
    },
    /// Another start or stop of the bundle is still running its activator.
    #[error("bundle {0} is busy with another lifecycle transition")]
    Busy(BundleId),
    /// No installed bundle matches the given name.
    #[error("unknown bundle `{0}`")]
    UnknownBundle(String),
    /// The activator hook failed.
    #[error("activator of {bundle} failed: {reason}")]
    Activator {
        /// Symbolic name of the bundle.
        bundle: String,
        /// Rendered activator error.
        reason: String,
    },
    /// A registration named no object class.
    #[error("service registration requires at least one object class")]
    NoObjectClass,
    /// The lookup filter is malformed.
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Startup hook named by a bundle manifest.
pub trait BundleActivator: Send + Sync {
    /// Called when the bundle starts. Services registered here stay published
    /// until the bundle stops.
    fn start(&self, context: &BundleContext) -> core::result::Result<(), ActivatorError>;

    /// Called when the bundle stops.
    fn stop(&self, context: &BundleContext) -> core::result::Result<(), ActivatorError>;
}

/// Deployable unit: a manifest plus the activators it may name.
#[derive(Clone)]
pub struct BundleArchive {
    name: String,
    manifest: String,
    activators: BTreeMap<String, Arc<dyn BundleActivator>>,
}

impl BundleArchive {
    /// Creates an archive from raw manifest text.
    pub fn new(name: impl Into<String>, manifest: impl Into<String>) -> Self {
        Self { name: name.into(), manifest: manifest.into(), activators: BTreeMap::new() }
    }

    /// Creates an archive by rendering `manifest`.
    pub fn from_manifest(name: impl Into<String>, manifest: &Manifest) -> manifest::Result<Self> {
        Ok(Self::new(name, manifest.to_toml_string()?))
    }

    /// Adds an activator under `name`.
    pub fn with_activator(mut self, name: impl Into<String>, activator: Arc<dyn BundleActivator>) -> Self {
        self.activators.insert(name.into(), activator);
        self
    }

    /// Archive file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Manifest text.
    pub fn manifest(&self) -> &str {
        &self.manifest
    }

    fn activator(&self, name: &str) -> Option<Arc<dyn BundleActivator>> {
        self.activators.get(name).cloned()
    }
}

impl fmt::Debug for BundleArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleArchive")
            .field("name", &self.name)
            .field("activators", &self.activators.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Entry point for hosting bundles.
#[derive(Clone)]
pub struct Framework {
    inner: Arc<Inner>,
}

struct Inner {
    config: HostConfig,
    state: Mutex<State>,
}

struct State {
    next_bundle: BundleId,
    bundles: BTreeMap<BundleId, BundleRecord>,
    registry: Registry,
}

struct BundleRecord {
    manifest: Manifest,
    location: String,
    state: BundleState,
    activator: Option<Arc<dyn BundleActivator>>,
    // Set while an activator hook runs outside the lock.
    transition: bool,
}

impl State {
    fn missing_imports(&self, config: &HostConfig, id: BundleId) -> Vec<String> {
        let Some(record) = self.bundles.get(&id) else {
            return Vec::new();
        };
        record
            .manifest
            .import_packages
            .iter()
            .filter(|package| {
                !config.exports(package)
                    && !self.bundles.values().any(|other| other.manifest.export_packages.contains(*package))
            })
            .cloned()
            .collect()
    }

    fn record(&self, id: BundleId) -> Result<&BundleRecord> {
        self.bundles.get(&id).ok_or(Error::Uninstalled(id))
    }

    fn record_mut(&mut self, id: BundleId) -> Result<&mut BundleRecord> {
        self.bundles.get_mut(&id).ok_or(Error::Uninstalled(id))
    }
}

impl Default for Framework {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}

impl fmt::Debug for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Framework")
            .field("config", &self.inner.config)
            .field("bundles", &state.bundles.len())
            .finish()
    }
}

impl Framework {
    /// Creates an empty framework.
    pub fn new(config: HostConfig) -> Self {
        let state = State { next_bundle: BundleId::first(), bundles: BTreeMap::new(), registry: Registry::default() };
        Self { inner: Arc::new(Inner { config, state: Mutex::new(state) }) }
    }

    /// Active configuration.
    pub fn config(&self) -> &HostConfig {
        &self.inner.config
    }

    /// Context of the framework itself, usable to query and register services.
    pub fn context(&self) -> BundleContext {
        BundleContext { framework: self.clone(), bundle: BundleId::SYSTEM }
    }

    /// Installs `archive`, resolving it right away when configured to.
    pub fn install(&self, archive: BundleArchive) -> Result<Bundle> {
        let manifest = Manifest::parse_str(archive.manifest())?;
        for warning in &manifest.warnings {
            warn!("bundle {} ({}): {warning}", manifest.symbolic_name, archive.name());
        }
        let activator = match &manifest.activator {
            Some(name) => Some(archive.activator(name).ok_or_else(|| Error::MissingActivator(name.clone()))?),
            None => None,
        };

        let mut state = self.inner.state.lock();
        let duplicate = state.bundles.values().any(|record| {
            record.manifest.symbolic_name == manifest.symbolic_name && record.manifest.version == manifest.version
        });
        if duplicate {
            return Err(Error::AlreadyInstalled { name: manifest.symbolic_name, version: manifest.version });
        }

        let id = state.next_bundle;
        state.next_bundle = id.next();
        let bundle = Bundle {
            framework: self.clone(),
            id,
            symbolic_name: manifest.symbolic_name.clone(),
            version: manifest.version.clone(),
        };
        state.bundles.insert(
            id,
            BundleRecord {
                manifest,
                location: archive.name().to_string(),
                state: BundleState::Installed,
                activator,
                transition: false,
            },
        );
        info!("installed {} {} from {} as bundle {id}", bundle.symbolic_name, bundle.version, archive.name());

        if self.inner.config.resolve_on_install {
            let missing = state.missing_imports(&self.inner.config, id);
            if missing.is_empty() {
                state.record_mut(id)?.state = BundleState::Resolved;
                debug!("bundle {id} resolved");
            } else {
                debug!("bundle {id} left installed, missing imports: {}", missing.join(", "));
            }
        }
        Ok(bundle)
    }

    /// Every installed bundle, ordered by identifier.
    pub fn bundles(&self) -> Vec<Bundle> {
        let state = self.inner.state.lock();
        state
            .bundles
            .iter()
            .map(|(id, record)| Bundle {
                framework: self.clone(),
                id: *id,
                symbolic_name: record.manifest.symbolic_name.clone(),
                version: record.manifest.version.clone(),
            })
            .collect()
    }

    /// First installed bundle (lowest id) with the given symbolic name.
    pub fn bundle_by_name(&self, symbolic_name: &str) -> Option<Bundle> {
        self.bundles().into_iter().find(|bundle| bundle.symbolic_name == symbolic_name)
    }

    /// Lifecycle state of `id`; uninstalled once the bundle is gone.
    pub fn state(&self, id: BundleId) -> BundleState {
        let state = self.inner.state.lock();
        state.bundles.get(&id).map_or(BundleState::Uninstalled, |record| record.state)
    }

    /// Archive name the bundle was installed from.
    pub fn location(&self, id: BundleId) -> Result<String> {
        let state = self.inner.state.lock();
        Ok(state.record(id)?.location.clone())
    }

    /// Attempts to resolve an installed bundle. Returns whether it is resolved.
    pub fn resolve(&self, id: BundleId) -> Result<bool> {
        let mut state = self.inner.state.lock();
        match state.record(id)?.state {
            BundleState::Installed => {}
            _ => return Ok(true),
        }
        if state.missing_imports(&self.inner.config, id).is_empty() {
            state.record_mut(id)?.state = BundleState::Resolved;
            debug!("bundle {id} resolved");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Starts `id`: resolves it if needed, then runs its activator.
    ///
    /// Fails with [`Error::Busy`] while another start or stop of the same
    /// bundle is in flight.
    pub fn start(&self, id: BundleId) -> Result<()> {
        let (name, activator) = {
            let mut state = self.inner.state.lock();
            let record = state.record(id)?;
            if record.transition {
                return Err(Error::Busy(id));
            }
            let current = record.state;
            match current {
                BundleState::Active => return Ok(()),
                BundleState::Stopping | BundleState::Uninstalled => {
                    return Err(Error::InvalidState { bundle: id, state: current })
                }
                BundleState::Installed => {
                    let missing = state.missing_imports(&self.inner.config, id);
                    if !missing.is_empty() {
                        let bundle = state.record(id)?.manifest.symbolic_name.clone();
                        return Err(Error::Unresolved { bundle, missing });
                    }
                    state.record_mut(id)?.state = BundleState::Resolved;
                }
                BundleState::Resolved => {}
            }
            let record = state.record_mut(id)?;
            record.transition = true;
            (record.manifest.symbolic_name.clone(), record.activator.clone())
        };

        let outcome = match activator {
            Some(activator) => activator.start(&BundleContext { framework: self.clone(), bundle: id }),
            None => Ok(()),
        };

        let mut state = self.inner.state.lock();
        if let Err(err) = outcome {
            let removed = state.registry.unregister_bundle(id);
            if let Ok(record) = state.record_mut(id) {
                record.transition = false;
            }
            warn!("activator of {name} failed to start: {err}; withdrew {} services", removed.len());
            return Err(Error::Activator { bundle: name, reason: err.to_string() });
        }
        let record = state.record_mut(id)?;
        record.transition = false;
        record.state = BundleState::Active;
        info!("bundle {name} ({id}) started");
        Ok(())
    }

    /// Stops `id`: runs its activator stop hook and withdraws its services.
    ///
    /// The bundle ends up resolved even when the hook fails; the failure is
    /// reported afterwards.
    /// Like [`Framework::start`], returns [`Error::Busy`] while another
    /// transition of the bundle is in flight.
    pub fn stop(&self, id: BundleId) -> Result<()> {
        let (name, activator) = {
            let mut state = self.inner.state.lock();
            let record = state.record_mut(id)?;
            if record.transition {
                return Err(Error::Busy(id));
            }
            if record.state != BundleState::Active {
                return Ok(());
            }
            record.state = BundleState::Stopping;
            record.transition = true;
            (record.manifest.symbolic_name.clone(), record.activator.clone())
        };

        let outcome = match activator {
            Some(activator) => activator.stop(&BundleContext { framework: self.clone(), bundle: id }),
            None => Ok(()),
        };

        {
            let mut state = self.inner.state.lock();
            let removed = state.registry.unregister_bundle(id);
            if !removed.is_empty() {
                debug!("bundle {id} withdrew {} services", removed.len());
            }
            if let Ok(record) = state.record_mut(id) {
                record.state = BundleState::Resolved;
                record.transition = false;
            }
        }
        info!("bundle {name} ({id}) stopped");

        outcome.map_err(|err| {
            warn!("activator of {name} failed to stop: {err}");
            Error::Activator { bundle: name, reason: err.to_string() }
        })
    }

    /// Stops `id` if active and removes it from the framework.
    pub fn uninstall(&self, id: BundleId) -> Result<()> {
        if let Err(err) = self.stop(id) {
            match err {
                Error::Activator { .. } => warn!("uninstalling bundle {id} after failed stop: {err}"),
                other => return Err(other),
            }
        }
        let mut state = self.inner.state.lock();
        let record = state.bundles.remove(&id).ok_or(Error::Uninstalled(id))?;
        state.registry.unregister_bundle(id);
        info!("bundle {} ({id}) uninstalled", record.manifest.symbolic_name);
        Ok(())
    }

    fn register(
        &self,
        bundle: BundleId,
        object_classes: Vec<String>,
        properties: Properties,
        object: ServiceObject,
    ) -> Result<ServiceRegistration> {
        if object_classes.is_empty() {
            return Err(Error::NoObjectClass);
        }
        let mut state = self.inner.state.lock();
        if bundle != BundleId::SYSTEM {
            state.record(bundle)?;
        }
        let reference = state.registry.register(bundle, object_classes, properties, object);
        debug!("bundle {bundle} registered service {} as {}", reference.id(), reference.object_classes().join(", "));
        Ok(ServiceRegistration { framework: self.clone(), reference })
    }
}

impl Host for Framework {
    type Bundle = Bundle;

    fn bundles(&self) -> Vec<Bundle> {
        Framework::bundles(self)
    }

    fn service_references(&self, class: Option<&str>, filter: Option<&str>) -> Result<Vec<ServiceReference>> {
        let filter = parse_filter(filter)?;
        let state = self.inner.state.lock();
        Ok(state.registry.lookup(class, filter.as_ref()))
    }

    fn service(&self, reference: &ServiceReference) -> Option<ServiceObject> {
        self.inner.state.lock().registry.object(reference.id())
    }
}

/// Live handle to an installed bundle.
#[derive(Clone)]
pub struct Bundle {
    framework: Framework,
    id: BundleId,
    symbolic_name: String,
    version: Version,
}

impl Bundle {
    /// The bundle's own context.
    pub fn context(&self) -> BundleContext {
        BundleContext { framework: self.framework.clone(), bundle: self.id }
    }

    /// Removes the bundle from its framework.
    pub fn uninstall(&self) -> Result<()> {
        self.framework.uninstall(self.id)
    }
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundle")
            .field("id", &self.id)
            .field("symbolic_name", &self.symbolic_name)
            .field("version", &self.version)
            .finish()
    }
}

impl BundleHandle for Bundle {
    fn id(&self) -> BundleId {
        self.id
    }

    fn symbolic_name(&self) -> &str {
        &self.symbolic_name
    }

    fn version(&self) -> &Version {
        &self.version
    }

    fn state(&self) -> BundleState {
        self.framework.state(self.id)
    }

    fn start(&self) -> Result<()> {
        self.framework.start(self.id)
    }

    fn stop(&self) -> Result<()> {
        self.framework.stop(self.id)
    }
}

/// Per-bundle view of the framework handed to activators and clients.
#[derive(Clone)]
pub struct BundleContext {
    framework: Framework,
    bundle: BundleId,
}

impl BundleContext {
    /// Identifier of the bundle owning this context.
    pub fn bundle_id(&self) -> BundleId {
        self.bundle
    }

    /// Handle to the owning bundle; `None` for the framework context or once uninstalled.
    pub fn bundle(&self) -> Option<Bundle> {
        self.framework.bundles().into_iter().find(|bundle| bundle.id == self.bundle)
    }

    /// Framework this context belongs to.
    pub fn framework(&self) -> &Framework {
        &self.framework
    }

    /// Installs another archive into the framework.
    pub fn install(&self, archive: BundleArchive) -> Result<Bundle> {
        self.framework.install(archive)
    }

    /// Publishes `service` under its interface's object class.
    pub fn register_service<S>(&self, service: Arc<S>, properties: Properties) -> Result<ServiceRegistration>
    where
        S: ?Sized + ServiceInterface,
    {
        self.register_object(vec![S::OBJECT_CLASS.to_string()], properties, erase(service))
    }

    /// Publishes an already erased service under `object_classes`.
    pub fn register_object(
        &self,
        object_classes: Vec<String>,
        properties: Properties,
        object: ServiceObject,
    ) -> Result<ServiceRegistration> {
        self.framework.register(self.bundle, object_classes, properties, object)
    }
}

impl fmt::Debug for BundleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleContext").field("bundle", &self.bundle).finish()
    }
}

impl Host for BundleContext {
    type Bundle = Bundle;

    fn bundles(&self) -> Vec<Bundle> {
        self.framework.bundles()
    }

    fn service_references(&self, class: Option<&str>, filter: Option<&str>) -> Result<Vec<ServiceReference>> {
        self.framework.service_references(class, filter)
    }

    fn service(&self, reference: &ServiceReference) -> Option<ServiceObject> {
        self.framework.service(reference)
    }
}

/// Handle returned when a service is published.
#[derive(Debug)]
pub struct ServiceRegistration {
    framework: Framework,
    reference: ServiceReference,
}

impl ServiceRegistration {
    /// Reference clients use to look the service up.
    pub fn reference(&self) -> &ServiceReference {
        &self.reference
    }

    /// Withdraws the service. Returns `false` if it was already gone.
    pub fn unregister(self) -> bool {
        let removed = self.framework.inner.state.lock().registry.unregister(self.reference.id());
        if removed.is_some() {
            debug!("service {} unregistered", self.reference.id());
        }
        removed.is_some()
    }
}
