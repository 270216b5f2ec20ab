// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Client-side view of a bundle host.
//!
//! Deployment checks and tools are written against these traits so they run
//! unchanged on the in-memory [`crate::Framework`] or on a test double.

#![deny(clippy::all, missing_docs)]

use std::sync::Arc;

use semver::Version;

use crate::filter::{Filter, FilterError};
use crate::framework::Error;
use crate::lifecycle::{BundleId, BundleState};
use crate::registry::{downcast, ServiceInterface, ServiceObject, ServiceReference};

/// Installed bundle as observed by a client.
pub trait BundleHandle {
    /// Framework-assigned identifier.
    fn id(&self) -> BundleId;
    /// Symbolic name declared by the manifest.
    fn symbolic_name(&self) -> &str;
    /// Version declared by the manifest.
    fn version(&self) -> &Version;
    /// Current lifecycle state.
    fn state(&self) -> BundleState;
    /// Starts the bundle, running its activator.
    fn start(&self) -> Result<(), Error>;
    /// Stops the bundle, running its activator stop hook.
    fn stop(&self) -> Result<(), Error>;
}

/// Query surface of a running host.
pub trait Host {
    /// Handle type returned for installed bundles.
    type Bundle: BundleHandle;

    /// Every bundle currently installed.
    fn bundles(&self) -> Vec<Self::Bundle>;

    /// Looks up a single bundle by identifier.
    fn bundle(&self, id: BundleId) -> Option<Self::Bundle> {
        self.bundles().into_iter().find(|bundle| bundle.id() == id)
    }

    /// Returns registrations published under `class` that match `filter`.
    ///
    /// `None` for either argument disables that criterion. A filter that does
    /// not parse yields [`Error::Filter`].
    fn service_references(&self, class: Option<&str>, filter: Option<&str>) -> Result<Vec<ServiceReference>, Error>;

    /// Resolves a reference to its live service, `None` once unregistered.
    fn service(&self, reference: &ServiceReference) -> Option<ServiceObject>;

    /// Typed variant of [`Host::service_references`].
    fn references_for<S>(&self, filter: Option<&str>) -> Result<Vec<ServiceReference>, Error>
    where
        S: ?Sized + ServiceInterface,
        Self: Sized,
    {
        self.service_references(Some(S::OBJECT_CLASS), filter)
    }

    /// Typed variant of [`Host::service`].
    fn get_service<S>(&self, reference: &ServiceReference) -> Option<Arc<S>>
    where
        S: ?Sized + ServiceInterface,
        Self: Sized,
    {
        self.service(reference).as_ref().and_then(downcast::<S>)
    }
}

/// Parses an optional filter string.
pub fn parse_filter(filter: Option<&str>) -> Result<Option<Filter>, FilterError> {
    filter.map(Filter::parse).transpose()
}
