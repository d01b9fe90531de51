//! Health dashboard across both targets

use vpsops_core::{ProbeOutcome, ProbeRunner, ProbeSpec};

use crate::commands::{command_probe, compose_probe, truncated, up_down, App};
use crate::ui;

pub async fn run(app: &App) -> anyhow::Result<()> {
    ui::header("Status Overview");
    println!("  Running checks on both targets...\n");

    let report = ProbeRunner::new().run_all(build_probes(app)).await;
    ui::print_report(&report);
    Ok(())
}

fn build_probes(app: &App) -> Vec<ProbeSpec> {
    let exec = &app.executor;
    let compose = app.compose();
    let primary = &app.config.primary;
    let secondary = &app.config.secondary;
    let mesh_secondary = app.config.mesh_secondary_ip.clone();

    let mut specs = Vec::new();

    // Primary
    specs.push(command_probe(exec, "SSH connectivity", primary, "echo ok", |r| {
        if r.success {
            ProbeOutcome::pass("Connected")
        } else {
            ProbeOutcome::fail(r.stderr)
        }
    }));
    specs.push(command_probe(
        exec,
        "WireGuard",
        primary,
        "sudo wg show wg0 2>/dev/null | grep -c 'latest handshake'",
        wireguard_handshake,
    ));
    specs.push(compose_probe(&compose, "Gateway stack", primary, "ps", |r| {
        let up = r.success && (r.stdout.contains("Up") || r.stdout.contains("running"));
        if up {
            ProbeOutcome::pass("Running")
        } else {
            ProbeOutcome::fail("Not running")
        }
    }));
    specs.push(command_probe(
        exec,
        "Gateway health",
        primary,
        &format!("curl -sf {}", app.config.gateway_health_url),
        |r| {
            if r.success {
                ProbeOutcome::pass(truncated(&r.stdout, 50))
            } else {
                ProbeOutcome::fail("Unreachable")
            }
        },
    ));
    specs.push(command_probe(
        exec,
        "Node exporter",
        primary,
        "curl -sf http://localhost:9100/metrics | head -1",
        up_down("Serving metrics", "Unreachable"),
    ));

    // Secondary
    specs.push(command_probe(exec, "SSH connectivity", secondary, "echo ok", |r| {
        if r.success {
            ProbeOutcome::pass("Connected")
        } else {
            ProbeOutcome::fail(r.stderr)
        }
    }));
    specs.push(command_probe(
        exec,
        "WireGuard",
        secondary,
        "sudo wg show wg0 2>/dev/null | grep -c 'latest handshake'",
        wireguard_handshake,
    ));
    specs.push(compose_probe(
        &compose,
        "Monitoring stack",
        secondary,
        "ps --format '{{.Name}} {{.Status}}'",
        all_services_up,
    ));
    specs.push(command_probe(
        exec,
        "Prometheus",
        secondary,
        &format!("curl -sf http://{}:9090/api/v1/targets | head -c 200", mesh_secondary),
        up_down("Responding", "Unreachable"),
    ));
    specs.push(command_probe(
        exec,
        "Loki",
        secondary,
        &format!("curl -sf http://{}:3100/ready", mesh_secondary),
        |r| {
            if r.success {
                ProbeOutcome::pass(truncated(&r.stdout, 30))
            } else {
                ProbeOutcome::fail("Not ready")
            }
        },
    ));
    specs.push(command_probe(
        exec,
        "Grafana",
        secondary,
        "curl -sf http://localhost:3000/api/health",
        up_down("Healthy", "Unreachable"),
    ));
    specs.push(command_probe(
        exec,
        "Alertmanager",
        secondary,
        "curl -sf http://localhost:9093/-/healthy",
        up_down("Healthy", "Unreachable"),
    ));

    specs
}

/// Handshake count of zero means the link is configured but dead.
pub(crate) fn wireguard_handshake(r: vpsops_core::CommandResult) -> ProbeOutcome {
    let active = r.success && r.stdout.trim() != "0";
    if active {
        ProbeOutcome::pass("Active")
    } else {
        ProbeOutcome::fail("No handshake")
    }
}

/// Every compose service line must report Up.
pub(crate) fn all_services_up(r: vpsops_core::CommandResult) -> ProbeOutcome {
    if !r.success {
        return ProbeOutcome::fail("compose ps failed");
    }
    let lines: Vec<&str> = r.stdout.lines().filter(|l| !l.is_empty()).collect();
    let all_up = !lines.is_empty() && lines.iter().all(|l| l.contains("Up"));
    if all_up {
        ProbeOutcome::pass(format!("{} services all up", lines.len()))
    } else {
        ProbeOutcome::fail(format!("{} services, some down", lines.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpsops_core::CommandResult;

    fn capture(success: bool, stdout: &str) -> CommandResult {
        CommandResult {
            success,
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: if success { 0 } else { 1 },
        }
    }

    #[test]
    fn handshake_count_zero_is_dead_link() {
        assert!(!wireguard_handshake(capture(true, "0")).ok);
        assert!(wireguard_handshake(capture(true, "2")).ok);
        assert!(!wireguard_handshake(capture(false, "")).ok);
    }

    #[test]
    fn all_services_up_requires_every_line_up() {
        let ok = all_services_up(capture(true, "prom Up 3 days\nloki Up 3 days"));
        assert!(ok.ok);
        assert_eq!(ok.detail, "2 services all up");

        let down = all_services_up(capture(true, "prom Up 3 days\nloki Restarting"));
        assert!(!down.ok);

        assert!(!all_services_up(capture(true, "")).ok);
    }
}
