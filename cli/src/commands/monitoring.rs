//! Observability stack management on the secondary target

use clap::Subcommand;
use serde_json::Value;

use crate::commands::App;
use crate::ui;

#[derive(Subcommand, Debug)]
pub enum MonitoringCommand {
    /// Show container status
    Ps,
    /// Show or follow logs for one service
    Logs {
        /// Compose service name (all services when omitted)
        service: Option<String>,
        /// Number of lines to tail
        #[arg(short = 'n', long, default_value_t = 100)]
        lines: usize,
        /// Follow log output until interrupted
        #[arg(short, long)]
        follow: bool,
    },
    /// Restart the stack
    Restart,
    /// Summarize Prometheus scrape targets
    Targets,
}

pub async fn run(app: &App, command: MonitoringCommand) -> anyhow::Result<()> {
    let target = &app.config.secondary;
    let compose = app.compose();

    match command {
        MonitoringCommand::Ps => {
            let r = compose.run_safe(target, "ps").await;
            if r.success {
                ui::print_output(&r.stdout);
            } else {
                ui::fail(&r.stderr);
            }
        }
        MonitoringCommand::Logs {
            service,
            lines,
            follow,
        } => {
            let service = service.unwrap_or_default();
            if follow {
                ui::info("Streaming logs, press Ctrl-C to stop.");
                compose
                    .stream(target, &format!("logs -f --tail {} {}", lines, service))
                    .await?;
            } else {
                let r = compose
                    .run_safe(target, &format!("logs --tail {} {}", lines, service))
                    .await;
                ui::print_output(if r.stdout.is_empty() { &r.stderr } else { &r.stdout });
            }
        }
        MonitoringCommand::Restart => {
            ui::info("Restarting monitoring stack...");
            ui::print_output(&compose.run(target, "restart").await?);
            ui::info("Done.");
        }
        MonitoringCommand::Targets => {
            let r = app
                .executor
                .exec_safe(
                    target,
                    &format!(
                        "curl -sf http://{}:9090/api/v1/targets",
                        app.config.mesh_secondary_ip
                    ),
                )
                .await;
            if !r.success {
                ui::fail("Prometheus unreachable");
                return Ok(());
            }
            match summarize_targets(&r.stdout) {
                Some((up, total)) => {
                    let line = format!("{}/{} scrape targets up", up, total);
                    if up == total && total > 0 {
                        ui::pass(&line);
                    } else {
                        ui::warn(&line);
                    }
                }
                None => ui::fail("Unexpected Prometheus response"),
            }
        }
    }

    Ok(())
}

/// Parse the Prometheus targets API response into (up, total).
fn summarize_targets(body: &str) -> Option<(usize, usize)> {
    let value: Value = serde_json::from_str(body).ok()?;
    let targets = value.get("data")?.get("activeTargets")?.as_array()?;
    let up = targets
        .iter()
        .filter(|t| t.get("health").and_then(Value::as_str) == Some("up"))
        .count();
    Some((up, targets.len()))
}
