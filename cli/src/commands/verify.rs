//! Full verification suite
//!
//! Every probe the deployment docs call for, in one aggregation pass.
//! The batch always settles and reports a complete tally; only a
//! configuration error can abort the run.

use vpsops_core::{ProbeOutcome, ProbeRunner, ProbeSpec};

use crate::commands::status::{all_services_up, wireguard_handshake};
use crate::commands::{backups, command_probe, compose_probe, otel, truncated, up_down, App};
use crate::ui;

/// Run the suite. Returns whether every check passed.
pub async fn run(app: &App) -> anyhow::Result<bool> {
    ui::header("Full Verification Suite");
    println!("  Running all deployment checks...\n");

    let report = ProbeRunner::new().run_all(build_probes(app)).await;
    ui::print_report(&report);
    Ok(report.all_passed())
}

fn build_probes(app: &App) -> Vec<ProbeSpec> {
    let exec = &app.executor;
    let compose = app.compose();
    let primary = &app.config.primary;
    let secondary = &app.config.secondary;
    let mesh_primary = &app.config.mesh_primary_ip;
    let mesh_secondary = &app.config.mesh_secondary_ip;

    let mut specs = Vec::new();

    // Mesh link
    specs.push(command_probe(
        exec,
        "WireGuard interface up",
        primary,
        "sudo wg show wg0 2>/dev/null | grep -c 'latest handshake'",
        wireguard_handshake,
    ));
    specs.push(command_probe(
        exec,
        "WireGuard interface up",
        secondary,
        "sudo wg show wg0 2>/dev/null | grep -c 'latest handshake'",
        wireguard_handshake,
    ));
    specs.push(command_probe(
        exec,
        "Ping secondary via mesh",
        primary,
        &format!("ping -c 1 -W 3 {}", mesh_secondary),
        up_down("Reachable", "Unreachable"),
    ));
    specs.push(command_probe(
        exec,
        "Ping primary via mesh",
        secondary,
        &format!("ping -c 1 -W 3 {}", mesh_primary),
        up_down("Reachable", "Unreachable"),
    ));

    // Gateway (primary)
    specs.push(compose_probe(&compose, "Gateway containers running", primary, "ps", |r| {
        let up = r.success && (r.stdout.contains("Up") || r.stdout.contains("running"));
        if up {
            ProbeOutcome::pass("Running")
        } else {
            ProbeOutcome::fail("Not running")
        }
    }));
    specs.push(command_probe(
        exec,
        "Gateway health endpoint",
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
        "Node exporter metrics",
        primary,
        "curl -sf http://localhost:9100/metrics | head -1",
        up_down("Serving", "Unreachable"),
    ));
    specs.push(command_probe(
        exec,
        "Log shipper running",
        primary,
        "sudo docker ps --filter name=promtail --format '{{.Status}}'",
        |r| {
            if r.success && r.stdout.contains("Up") {
                ProbeOutcome::pass(r.stdout.trim().to_string())
            } else {
                ProbeOutcome::fail("Not running")
            }
        },
    ));

    // Monitoring (secondary)
    specs.push(compose_probe(
        &compose,
        "Monitoring containers running",
        secondary,
        "ps --format '{{.Name}} {{.Status}}'",
        all_services_up,
    ));
    specs.push(command_probe(
        exec,
        "Prometheus targets",
        secondary,
        &format!("curl -sf http://{}:9090/api/v1/targets", mesh_secondary),
        |r| {
            if r.success && r.stdout.contains("activeTargets") {
                ProbeOutcome::pass("Responding")
            } else {
                ProbeOutcome::fail("Unreachable")
            }
        },
    ));
    specs.push(command_probe(
        exec,
        "Loki readiness",
        secondary,
        &format!("curl -sf http://{}:3100/ready", mesh_secondary),
        up_down("Ready", "Not ready"),
    ));
    specs.push(command_probe(
        exec,
        "Grafana health",
        secondary,
        "curl -sf http://localhost:3000/api/health",
        up_down("Healthy", "Unreachable"),
    ));
    specs.push(command_probe(
        exec,
        "Alertmanager health",
        secondary,
        "curl -sf http://localhost:9093/-/healthy",
        up_down("Healthy", "Unreachable"),
    ));

    // Cross-target scrape
    specs.push(command_probe(
        exec,
        "Primary metrics reachable from secondary",
        secondary,
        &format!("curl -sf http://{}:9100/metrics | head -1", mesh_primary),
        up_down("Reachable", "Unreachable"),
    ));

    // OTEL signals
    specs.push(command_probe(
        exec,
        "Tempo ready",
        secondary,
        "curl -sf http://localhost:3200/ready",
        up_down("Ready", "Not ready"),
    ));
    specs.push(command_probe(
        exec,
        "Tempo OTLP port listening",
        secondary,
        "ss -tlnp | grep 4318",
        |r| {
            if r.success && r.stdout.contains("4318") {
                ProbeOutcome::pass("Listening")
            } else {
                ProbeOutcome::fail("Not listening")
            }
        },
    ));
    specs.push(command_probe(
        exec,
        "Prometheus OTLP receiver enabled",
        secondary,
        &format!(
            "curl -sf http://{}:9090/api/v1/status/config | grep -o enable_otlp_receiver",
            mesh_secondary
        ),
        |r| {
            if r.success && r.stdout.contains("enable_otlp_receiver") {
                ProbeOutcome::pass("Enabled")
            } else {
                ProbeOutcome::fail("Not enabled")
            }
        },
    ));
    for (signal, path) in otel::OTLP_SIGNALS {
        specs.push(command_probe(
            exec,
            &format!("{} OTLP endpoint reachable", signal),
            primary,
            &otel::otlp_probe_command(mesh_secondary, path),
            otel::otlp_reachable,
        ));
    }

    // Log shipping
    specs.push(command_probe(
        exec,
        "Loki receiving logs from primary",
        secondary,
        &format!(
            r#"curl -sf "http://{}:3100/loki/api/v1/query" --data-urlencode 'query={{host="{}"}}'"#,
            mesh_secondary, app.config.log_host_label
        ),
        log_shipping,
    ));

    // External access
    specs.push(command_probe(
        exec,
        "Tunnel service",
        primary,
        "sudo systemctl is-active cloudflared 2>/dev/null || sudo docker ps --filter name=cloudflared --format '{{.Status}}'",
        tunnel_active,
    ));

    // Security posture
    for target in [primary, secondary] {
        specs.push(command_probe(
            exec,
            "Firewall active",
            target,
            "sudo ufw status | head -1",
            |r| {
                if r.success && r.stdout.contains("active") {
                    ProbeOutcome::pass("Active")
                } else {
                    ProbeOutcome::fail(r.stdout.trim().to_string())
                }
            },
        ));
        specs.push(command_probe(
            exec,
            "Fail2ban running",
            target,
            "sudo systemctl is-active fail2ban",
            service_active,
        ));
        specs.push(command_probe(
            exec,
            "SSH on configured port",
            target,
            &format!("ss -tlnp | grep ':{}'", target.port),
            up_down("Listening", "Not found"),
        ));
    }
    specs.push(command_probe(
        exec,
        "Sysbox runtime",
        primary,
        "sudo systemctl is-active sysbox",
        service_active,
    ));
    specs.push(command_probe(
        exec,
        "Backup cron job",
        primary,
        &format!("sudo cat {} 2>/dev/null | head -1", backups::CRON_FILE),
        |r| {
            if r.success && !r.stdout.trim().is_empty() {
                ProbeOutcome::pass("Configured")
            } else {
                ProbeOutcome::fail("Missing")
            }
        },
    ));

    specs
}

fn service_active(r: vpsops_core::CommandResult) -> ProbeOutcome {
    let state = r.stdout.trim().to_string();
    if r.success && state == "active" {
        ProbeOutcome::pass(state)
    } else {
        ProbeOutcome::fail(state)
    }
}

/// The tunnel runs either as a systemd unit or as a container; the
/// probe command falls back from one to the other.
fn tunnel_active(r: vpsops_core::CommandResult) -> ProbeOutcome {
    let out = r.stdout.trim();
    if out == "active" {
        ProbeOutcome::pass("Active")
    } else if out.contains("Up") {
        ProbeOutcome::pass("Running (Docker)")
    } else {
        ProbeOutcome::fail("Not running")
    }
}

fn log_shipping(r: vpsops_core::CommandResult) -> ProbeOutcome {
    if !r.success {
        return ProbeOutcome::fail("Query failed");
    }
    match loki_stream_count(&r.stdout) {
        Some(n) if n > 0 => ProbeOutcome::pass(format!("{} stream(s) found", n)),
        Some(_) => ProbeOutcome::fail("0 streams found"),
        None => ProbeOutcome::fail("Unexpected Loki response"),
    }
}

/// Number of log streams in a Loki query response.
fn loki_stream_count(body: &str) -> Option<usize> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    Some(value.get("data")?.get("result")?.as_array()?.len())
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
    fn tunnel_accepts_systemd_or_docker() {
        assert_eq!(tunnel_active(capture(true, "active")).detail, "Active");
        let docker = tunnel_active(capture(true, "Up 2 days"));
        assert!(docker.ok);
        assert_eq!(docker.detail, "Running (Docker)");
        assert!(!tunnel_active(capture(true, "")).ok);
        assert!(!tunnel_active(capture(false, "inactive")).ok);
    }

    #[test]
    fn log_shipping_requires_at_least_one_stream() {
        let body = r#"{"status":"success","data":{"result":[{"stream":{}},{"stream":{}}]}}"#;
        let outcome = log_shipping(capture(true, body));
        assert!(outcome.ok);
        assert_eq!(outcome.detail, "2 stream(s) found");

        let empty = r#"{"status":"success","data":{"result":[]}}"#;
        assert!(!log_shipping(capture(true, empty)).ok);
        assert!(!log_shipping(capture(true, "not json")).ok);
        assert!(!log_shipping(capture(false, "")).ok);
    }

    #[test]
    fn service_active_requires_exact_state() {
        let active = CommandResult {
            success: true,
            stdout: "active".to_string(),
            stderr: String::new(),
            exit_code: 0,
        };
        assert!(service_active(active).ok);

        let failed = CommandResult {
            success: false,
            stdout: "inactive".to_string(),
            stderr: String::new(),
            exit_code: 3,
        };
        let outcome = service_active(failed);
        assert!(!outcome.ok);
        assert_eq!(outcome.detail, "inactive");
    }
}
