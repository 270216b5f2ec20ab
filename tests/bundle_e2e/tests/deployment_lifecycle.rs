//! CONTEXT: Deployment lifecycle end-to-end tests
//! INTENT: Deploy my-bundle, look it up by name and by filter, start/stop it
//! IDL (target): install → start → lookup(filter) → log(DEBUG) → stop
//! DEPS: bundle-e2e (scenario steps), bundlehost (framework), basic-log (activator)
//! READINESS: Host backend ready
//! TESTS: Each scenario step on a fresh deployment; failure detection against broken hosts
// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use basic_log::{BasicLogService, NATURE, NATURE_BASIC};
use bundle_e2e::{
    check_activation, check_context, check_deactivation, check_log_service, check_log_service_with,
    check_symbolic_name, deploy, deployment, log_service_filter, run_scenario, CheckError, ARCHIVE_NAME, SYMBOLIC_NAME,
    VERSION,
};
use bundlehost::{
    Bundle, BundleHandle, BundleId, BundleState, Error, Framework, Host, HostConfig, LogLevel, LogService,
    Manifest, Properties, ServiceObject, ServiceReference, LOG_PACKAGE,
};
use semver::Version;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn deployed() -> (Framework, Bundle) {
    init_logging();
    let framework = Framework::default();
    let bundle = deploy(&framework).expect("deploy my-bundle");
    (framework, bundle)
}

fn basic_properties() -> Properties {
    Properties::from([(NATURE.to_string(), NATURE_BASIC.to_string())])
}

#[test]
fn deployment_packages_basic_log_as_my_bundle() {
    let archive = deployment().unwrap();
    assert_eq!(archive.name(), ARCHIVE_NAME);
    let manifest = Manifest::parse_str(archive.manifest()).unwrap();
    assert_eq!(manifest.symbolic_name, SYMBOLIC_NAME);
    assert_eq!(manifest.version, Version::parse(VERSION).unwrap());
    assert_eq!(manifest.import_packages, vec![LOG_PACKAGE.to_string()]);
    assert_eq!(manifest.activator.as_deref(), Some(basic_log::ACTIVATOR_NAME));
}

#[test]
fn bundle_context_injection() {
    let (_framework, bundle) = deployed();
    let context = bundle.context();
    assert!(check_context(Some(&context)).is_ok());
    assert!(matches!(check_context::<Framework>(None), Err(CheckError::Assertion(_))));
}

#[test]
fn bundle_injection_and_start() {
    let (_framework, bundle) = deployed();
    check_activation(&bundle).unwrap();
    assert_eq!(bundle.state(), BundleState::Active);
}

#[test]
fn symbolic_name_available() {
    let (framework, _bundle) = deployed();
    check_symbolic_name(&framework.context(), SYMBOLIC_NAME).unwrap();
    assert!(matches!(check_symbolic_name(&framework, "other-bundle"), Err(CheckError::Assertion(_))));
}

#[test]
fn service_found_by_filter() {
    let (_framework, bundle) = deployed();
    bundle.start().unwrap();
    let context = bundle.context();
    check_log_service(&context).unwrap();

    let references = context.service_references(None, Some(&log_service_filter())).unwrap();
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].property("nature"), Some("basic"));
    assert_eq!(references[0].bundle(), bundle.id());
}

#[test]
fn stop_returns_to_resolved() {
    let (_framework, bundle) = deployed();
    bundle.start().unwrap();
    check_deactivation(&bundle).unwrap();
    assert_eq!(bundle.state(), BundleState::Resolved);
}

#[test]
fn full_scenario_in_order() {
    let (framework, bundle) = deployed();
    let context = bundle.context();
    run_scenario(Some(&context), &bundle).unwrap();

    assert!(framework.references_for::<dyn LogService>(None).unwrap().is_empty());
    bundle.uninstall().unwrap();
    assert_eq!(bundle.state(), BundleState::Uninstalled);
}

#[test]
fn service_missing_before_start() {
    let (framework, _bundle) = deployed();
    let err = check_log_service(&framework).unwrap_err();
    assert!(matches!(err, CheckError::Assertion(ref msg) if msg.contains("found 0")));
}

#[test]
fn duplicate_basic_service_breaks_cardinality() {
    let (framework, bundle) = deployed();
    bundle.start().unwrap();
    framework
        .context()
        .register_service::<dyn LogService>(Arc::new(BasicLogService::new()), basic_properties())
        .unwrap();
    let err = check_log_service(&framework).unwrap_err();
    assert!(matches!(err, CheckError::Assertion(ref msg) if msg.contains("found 2")));
}

#[test]
fn malformed_filter_is_a_host_failure() {
    let (framework, bundle) = deployed();
    bundle.start().unwrap();
    let err = check_log_service_with(&framework, "(&(objectClass=nexus.log.LogService)(nature=basic)").unwrap_err();
    assert!(matches!(err, CheckError::Host(Error::Filter(_))));
}

#[test]
fn unresolvable_deployment_fails_activation() {
    init_logging();
    let framework = Framework::new(HostConfig { exported_packages: Vec::new(), ..HostConfig::default() });
    let bundle = deploy(&framework).unwrap();
    assert_eq!(bundle.state(), BundleState::Installed);
    let err = check_activation(&bundle).unwrap_err();
    assert!(matches!(err, CheckError::Assertion(ref msg) if msg.contains("INSTALLED")));
}

struct PanickingLog;

impl LogService for PanickingLog {
    fn log_full(
        &self,
        _reference: Option<&ServiceReference>,
        _level: LogLevel,
        _message: Option<&str>,
        _cause: Option<&(dyn std::error::Error + 'static)>,
    ) {
        panic!("log sink unavailable");
    }
}

#[test]
fn panicking_service_is_reported() {
    init_logging();
    let framework = Framework::default();
    framework.context().register_service::<dyn LogService>(Arc::new(PanickingLog), basic_properties()).unwrap();
    let err = check_log_service(&framework).unwrap_err();
    assert!(matches!(err, CheckError::Assertion(ref msg) if msg.contains("panicked")));
}

/// Host whose registry lists services it can no longer hand out.
struct VanishingHost(Framework);

impl Host for VanishingHost {
    type Bundle = Bundle;

    fn bundles(&self) -> Vec<Bundle> {
        self.0.bundles()
    }

    fn service_references(&self, class: Option<&str>, filter: Option<&str>) -> Result<Vec<ServiceReference>, Error> {
        self.0.service_references(class, filter)
    }

    fn service(&self, _reference: &ServiceReference) -> Option<ServiceObject> {
        None
    }
}

#[test]
fn unresolvable_reference_is_reported() {
    let (framework, bundle) = deployed();
    bundle.start().unwrap();
    let err = check_log_service(&VanishingHost(framework)).unwrap_err();
    assert!(matches!(err, CheckError::Assertion(ref msg) if msg == "log service not found"));
}

/// Bundle that ignores lifecycle calls.
struct StuckBundle {
    version: Version,
}

impl BundleHandle for StuckBundle {
    fn id(&self) -> BundleId {
        BundleId::SYSTEM
    }

    fn symbolic_name(&self) -> &str {
        SYMBOLIC_NAME
    }

    fn version(&self) -> &Version {
        &self.version
    }

    fn state(&self) -> BundleState {
        BundleState::Resolved
    }

    fn start(&self) -> Result<(), Error> {
        Ok(())
    }

    fn stop(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[test]
fn bundle_that_never_activates_fails_start_check() {
    let stuck = StuckBundle { version: Version::new(1, 0, 0) };
    let err = check_activation(&stuck).unwrap_err();
    assert!(matches!(err, CheckError::Assertion(ref msg) if msg.contains("expected ACTIVE")));
    check_deactivation(&stuck).unwrap();
}
