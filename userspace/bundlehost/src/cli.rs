// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command-line helpers shared with the host daemon.

use crate::framework::{Bundle, Framework};
use crate::host::{BundleHandle, Host};
use crate::log_service::{LogLevel, LogService};
use crate::registry::ServiceReference;

/// Returns a short usage description for the bundle host CLI.
pub fn help() -> &'static str {
    "bundlehost manages installed bundles. Usage: bundlehost \
     <list|state NAME|start NAME|stop NAME|uninstall NAME|services CLASS [FILTER]|log LEVEL MESSAGE...>"
}

/// Executes one CLI command against `framework` and returns the printable result.
pub fn execute(args: &[&str], framework: &Framework) -> String {
    if args.is_empty() || args.iter().any(|arg| *arg == "--help" || *arg == "help") {
        return help().to_string();
    }

    match args[0] {
        "list" => list(framework),
        "state" => with_bundle(framework, args.get(1), |bundle| {
            format!("{}: {}", bundle.symbolic_name(), bundle.state())
        }),
        "start" => with_bundle(framework, args.get(1), |bundle| match bundle.start() {
            Ok(()) => format!("bundle {} started", bundle.symbolic_name()),
            Err(err) => format!("start failed: {err}"),
        }),
        "stop" => with_bundle(framework, args.get(1), |bundle| match bundle.stop() {
            Ok(()) => format!("bundle {} stopped", bundle.symbolic_name()),
            Err(err) => format!("stop failed: {err}"),
        }),
        "uninstall" => with_bundle(framework, args.get(1), |bundle| match bundle.uninstall() {
            Ok(()) => format!("bundle {} uninstalled", bundle.symbolic_name()),
            Err(err) => format!("uninstall failed: {err}"),
        }),
        "services" => services(framework, args.get(1).copied(), args.get(2).copied()),
        "log" => match args.get(1) {
            Some(level) if args.len() > 2 => log(framework, LogLevel::parse(level), &args[2..].join(" ")),
            _ => "missing log level or message".to_string(),
        },
        other => format!("unknown command {other}"),
    }
}

fn with_bundle(framework: &Framework, name: Option<&&str>, action: impl FnOnce(&Bundle) -> String) -> String {
    let Some(name) = name else {
        return "missing bundle name".to_string();
    };
    match framework.bundle_by_name(name) {
        Some(bundle) => action(&bundle),
        None => format!("unknown bundle {name}"),
    }
}

fn list(framework: &Framework) -> String {
    let bundles = framework.bundles();
    if bundles.is_empty() {
        return "no bundles installed".to_string();
    }
    bundles
        .iter()
        .map(|bundle| format!("{}\t{}\t{} {}", bundle.id(), bundle.state(), bundle.symbolic_name(), bundle.version()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn services(framework: &Framework, class: Option<&str>, filter: Option<&str>) -> String {
    let class = class.filter(|class| *class != "*");
    match framework.service_references(class, filter) {
        Ok(references) if references.is_empty() => "no matching services".to_string(),
        Ok(references) => references.iter().map(describe).collect::<Vec<_>>().join("\n"),
        Err(err) => format!("query failed: {err}"),
    }
}

fn describe(reference: &ServiceReference) -> String {
    let properties: Vec<String> =
        reference.properties().iter().map(|(key, value)| format!("{key}={value}")).collect();
    format!(
        "service {} [{}] {{{}}}",
        reference.id(),
        reference.object_classes().join(", "),
        properties.join(", ")
    )
}

fn log(framework: &Framework, level: LogLevel, message: &str) -> String {
    let references = match framework.references_for::<dyn LogService>(None) {
        Ok(references) => references,
        Err(err) => return format!("query failed: {err}"),
    };
    let Some(reference) = references.first() else {
        return "no log service available".to_string();
    };
    match framework.get_service::<dyn LogService>(reference) {
        Some(service) => {
            service.log(level, message);
            format!("logged via service {}", reference.id())
        }
        None => "log service went away".to_string(),
    }
}
