// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Service registrations, references and the lookup table behind them.

#![deny(clippy::all, missing_docs)]

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::filter::{Attributes, Filter};
use crate::lifecycle::BundleId;

/// Property carrying the interfaces a registration is published under.
pub const OBJECT_CLASS: &str = "objectClass";
/// Property carrying the registration identifier.
pub const SERVICE_ID: &str = "service.id";
/// Property carrying the identifier of the registering bundle.
pub const SERVICE_BUNDLE_ID: &str = "service.bundleid";
/// Optional integer property; higher ranks sort first in lookups.
pub const SERVICE_RANKING: &str = "service.ranking";

/// Key/value attributes attached to a registration.
pub type Properties = BTreeMap<String, String>;

/// Type-erased service instance stored by the registry.
///
/// Typed registrations store an `Arc<S>` inside the erased handle so that
/// trait-object services can be recovered with [`downcast`].
pub type ServiceObject = Arc<dyn Any + Send + Sync>;

/// Marker for capability interfaces that can be published in the registry.
pub trait ServiceInterface: Send + Sync + 'static {
    /// Object class name the interface is registered under.
    const OBJECT_CLASS: &'static str;
}

/// Wraps a typed service for storage in the registry.
pub fn erase<S: ?Sized + ServiceInterface>(service: Arc<S>) -> ServiceObject {
    Arc::new(service)
}

/// Recovers a typed service from an erased handle created by [`erase`].
pub fn downcast<S: ?Sized + ServiceInterface>(object: &ServiceObject) -> Option<Arc<S>> {
    object.downcast_ref::<Arc<S>>().cloned()
}

/// Unique registration identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceId(u64);

impl ServiceId {
    const fn first() -> Self {
        Self(1)
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of a registration handed to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReference {
    id: ServiceId,
    bundle: BundleId,
    object_classes: Vec<String>,
    properties: Properties,
}

impl ServiceReference {
    /// Registration identifier.
    pub fn id(&self) -> ServiceId {
        self.id
    }

    /// Bundle that registered the service.
    pub fn bundle(&self) -> BundleId {
        self.bundle
    }

    /// Interfaces the service is published under.
    pub fn object_classes(&self) -> &[String] {
        &self.object_classes
    }

    /// Returns the first value of `key`, looked up case-insensitively.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.values(key).into_iter().next()
    }

    /// All registration properties, excluding `objectClass`.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    fn ranking(&self) -> i32 {
        self.property(SERVICE_RANKING).and_then(|raw| raw.trim().parse().ok()).unwrap_or(0)
    }
}

impl Attributes for ServiceReference {
    fn values(&self, key: &str) -> Vec<&str> {
        if key.eq_ignore_ascii_case(OBJECT_CLASS) {
            return self.object_classes.iter().map(String::as_str).collect();
        }
        Attributes::values(&self.properties, key)
    }
}

struct Entry {
    reference: ServiceReference,
    object: ServiceObject,
}

/// Registration table. Callers provide synchronization.
pub(crate) struct Registry {
    next_id: ServiceId,
    entries: BTreeMap<ServiceId, Entry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self { next_id: ServiceId::first(), entries: BTreeMap::new() }
    }
}

impl Registry {
    pub(crate) fn register(
        &mut self,
        bundle: BundleId,
        object_classes: Vec<String>,
        mut properties: Properties,
        object: ServiceObject,
    ) -> ServiceReference {
        let id = self.next_id;
        self.next_id = id.next();
        properties.retain(|key, _| !key.eq_ignore_ascii_case(OBJECT_CLASS));
        properties.insert(SERVICE_ID.to_string(), id.to_string());
        properties.insert(SERVICE_BUNDLE_ID.to_string(), bundle.to_string());
        let reference = ServiceReference { id, bundle, object_classes, properties };
        self.entries.insert(id, Entry { reference: reference.clone(), object });
        reference
    }

    pub(crate) fn unregister(&mut self, id: ServiceId) -> Option<ServiceReference> {
        self.entries.remove(&id).map(|entry| entry.reference)
    }

    pub(crate) fn unregister_bundle(&mut self, bundle: BundleId) -> Vec<ServiceReference> {
        let ids: Vec<ServiceId> = self
            .entries
            .values()
            .filter(|entry| entry.reference.bundle == bundle)
            .map(|entry| entry.reference.id)
            .collect();
        ids.into_iter().filter_map(|id| self.unregister(id)).collect()
    }

    /// Returns matching references ordered by ranking (highest first), then id.
    pub(crate) fn lookup(&self, class: Option<&str>, filter: Option<&Filter>) -> Vec<ServiceReference> {
        let mut found: Vec<ServiceReference> = self
            .entries
            .values()
            .map(|entry| &entry.reference)
            .filter(|reference| {
                class.map_or(true, |class| reference.object_classes.iter().any(|c| c == class))
            })
            .filter(|reference| filter.map_or(true, |filter| filter.matches(*reference)))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.ranking().cmp(&a.ranking()).then(a.id.cmp(&b.id)));
        found
    }

    pub(crate) fn object(&self, id: ServiceId) -> Option<ServiceObject> {
        self.entries.get(&id).map(|entry| Arc::clone(&entry.object))
    }
}
