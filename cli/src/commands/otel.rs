//! OTEL diagnostics for the gateway agent
//!
//! Endpoint reachability for the three OTLP signals, plus the OTEL
//! environment and diagnostics config as seen from the gateway.

use clap::Subcommand;
use futures::future::join_all;
use serde_json::Value;
use vpsops_core::{shell_quote, CommandResult, ProbeOutcome};

use crate::commands::App;
use crate::ui;

/// OTLP ingest paths on the monitoring host, by signal.
pub(crate) const OTLP_SIGNALS: &[(&str, &str)] = &[
    ("Traces", ":4318/v1/traces"),
    ("Metrics", ":9090/api/v1/otlp/v1/metrics"),
    ("Logs", ":3100/otlp/v1/logs"),
];

#[derive(Subcommand, Debug)]
pub enum OtelCommand {
    /// Check OTLP endpoint reachability from the primary target
    Endpoints,
    /// Show OTEL environment variables inside the gateway container
    Env,
    /// Show the agent's diagnostics configuration
    Config,
}

pub async fn run(app: &App, command: OtelCommand) -> anyhow::Result<()> {
    let target = &app.config.primary;

    match command {
        OtelCommand::Endpoints => {
            ui::info("Checking OTLP endpoints from the primary target...");
            let mesh = &app.config.mesh_secondary_ip;
            let results = join_all(OTLP_SIGNALS.iter().map(|(_, path)| {
                let command = otlp_probe_command(mesh, path);
                async move { app.executor.exec_safe(target, &command).await }
            }))
            .await;
            for ((signal, path), r) in OTLP_SIGNALS.iter().zip(results) {
                let outcome = otlp_reachable(r);
                let line = format!("{} ({}{}): {}", signal, mesh, path, outcome.detail);
                if outcome.ok {
                    ui::pass(&line);
                } else {
                    ui::fail(&line);
                }
            }
            println!();
        }
        OtelCommand::Env => {
            let r = app
                .gateway()
                .run_safe(target, "env | grep OTEL | sort")
                .await;
            if r.success {
                ui::print_output(&r.stdout);
            } else {
                ui::fail("Could not read OTEL env vars from the gateway container");
                ui::print_output(&r.stderr);
            }
        }
        OtelCommand::Config => {
            let r = app
                .executor
                .exec_safe(
                    target,
                    &format!("sudo cat {}", shell_quote(&app.config.agent_config_path)),
                )
                .await;
            if r.success {
                ui::print_output(&render_diagnostics(&r.stdout));
            } else {
                ui::fail("Could not read the agent config");
                ui::print_output(&r.stderr);
            }
        }
    }

    Ok(())
}

/// POST an empty body to an OTLP path and report only the HTTP status.
pub(crate) fn otlp_probe_command(mesh_ip: &str, path: &str) -> String {
    format!(
        "curl -s -o /dev/null -w '%{{http_code}}' -X POST -H 'Content-Type: application/json' -d '{{}}' http://{}{}",
        mesh_ip, path
    )
}

/// Any HTTP status means a listener answered; `000` is curl's marker
/// for no connection at all.
pub(crate) fn otlp_reachable(r: CommandResult) -> ProbeOutcome {
    let code = r.stdout.trim();
    if r.success && !code.is_empty() && code != "000" {
        ProbeOutcome::pass(format!("HTTP {}", code))
    } else {
        ProbeOutcome::fail("Unreachable")
    }
}

/// Pretty-print the `diagnostics` section of the agent config, the whole
/// document when there is none, or the raw capture when it isn't JSON.
fn render_diagnostics(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            let section = value.get("diagnostics").cloned().unwrap_or(value);
            serde_json::to_string_pretty(&section).unwrap_or_else(|_| body.to_string())
        }
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(success: bool, stdout: &str) -> CommandResult {
        CommandResult {
            success,
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: if success { 0 } else { 7 },
        }
    }

    #[test]
    fn rejected_post_still_proves_the_listener_is_up() {
        let outcome = otlp_reachable(capture(true, "415"));
        assert!(outcome.ok);
        assert_eq!(outcome.detail, "HTTP 415");
    }

    #[test]
    fn no_connection_is_unreachable() {
        assert!(!otlp_reachable(capture(false, "000")).ok);
        assert!(!otlp_reachable(capture(true, "")).ok);
    }

    #[test]
    fn probe_command_targets_the_signal_path() {
        let cmd = otlp_probe_command("10.0.0.2", ":4318/v1/traces");
        assert!(cmd.contains("http://10.0.0.2:4318/v1/traces"));
        assert!(cmd.contains("-w '%{http_code}'"));
    }

    #[test]
    fn diagnostics_section_is_extracted_when_present() {
        let body = r#"{"name":"agent","diagnostics":{"otel":true}}"#;
        let rendered = render_diagnostics(body);
        assert!(rendered.contains("\"otel\": true"));
        assert!(!rendered.contains("\"name\""));
    }

    #[test]
    fn non_json_config_passes_through_raw() {
        assert_eq!(render_diagnostics("not json"), "not json");
    }
}
