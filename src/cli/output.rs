//! Human-readable rendering for the discover and env commands.

use crate::discovery::{Build, Network, Runtime, Service};
use crate::env::EnvResult;
use crate::output::{EnvReport, ServiceEnv};
use std::fmt::Write;

pub fn render_services(services: &[Service]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Discovered {} services:", services.len());

    for service in services {
        let _ = writeln!(
            out,
            "  - {}: network={}, runtime={}, build={}",
            service.name,
            network_label(service.network),
            runtime_label(service.runtime),
            build_label(service.build),
        );
        if !service.build_path.is_empty() {
            let _ = writeln!(out, "    build path: {}", service.build_path);
        }
        if !service.image.is_empty() {
            let _ = writeln!(out, "    image: {}", service.image);
        }
        let _ = writeln!(out, "    config sources ({}):", service.configs.len());
        for config in &service.configs {
            let _ = writeln!(out, "      - {}: {}", config.config_type, config.path);
        }
    }

    out
}

pub fn render_env_report(report: &EnvReport) -> String {
    let mut out = String::new();

    for ServiceEnv { name, variables } in &report.services {
        let _ = writeln!(out, "=== {} ===", name);
        if variables.is_empty() {
            let _ = writeln!(out, "  no environment variables found");
        }
        for var in variables {
            let _ = writeln!(out, "  {} = {}", var.var_name, var.value);
            let _ = writeln!(out, "    source: {}{}", var.source, sensitive_marker(var));
        }
        let _ = writeln!(out);
    }

    out
}

fn sensitive_marker(var: &EnvResult) -> &'static str {
    if var.sensitive {
        " [SENSITIVE]"
    } else {
        ""
    }
}

fn network_label(network: Network) -> &'static str {
    match network {
        Network::None => "none",
        Network::Private => "private",
        Network::Public => "public",
    }
}

fn runtime_label(runtime: Runtime) -> &'static str {
    match runtime {
        Runtime::Continuous => "continuous",
        Runtime::Scheduled => "scheduled",
    }
}

fn build_label(build: Build) -> &'static str {
    match build {
        Build::FromSource => "from_source",
        Build::FromImage => "from_image",
    }
}
