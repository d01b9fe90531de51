//! Gateway stack management on the primary target

use clap::Subcommand;
use vpsops_core::shell_quote;

use crate::commands::App;
use crate::ui;

#[derive(Subcommand, Debug)]
pub enum GatewayCommand {
    /// Show container status
    Ps,
    /// Check the gateway health endpoint
    Health,
    /// Show or follow gateway logs
    Logs {
        /// Number of lines to tail
        #[arg(short = 'n', long, default_value_t = 100)]
        lines: usize,
        /// Follow log output until interrupted
        #[arg(short, long)]
        follow: bool,
    },
    /// Start the stack
    Start,
    /// Stop the stack
    Stop,
    /// Restart the stack
    Restart,
    /// Open a shell inside the gateway container
    Shell,
}

pub async fn run(app: &App, command: GatewayCommand) -> anyhow::Result<()> {
    let target = &app.config.primary;
    let compose = app.compose();
    let container = shell_quote(&app.config.gateway_container);

    match command {
        GatewayCommand::Ps => {
            let r = compose.run_safe(target, "ps").await;
            if r.success {
                ui::print_output(&r.stdout);
            } else {
                ui::fail(&r.stderr);
            }
        }
        GatewayCommand::Health => {
            let r = app
                .executor
                .exec_safe(target, &format!("curl -sf {}", app.config.gateway_health_url))
                .await;
            if r.success {
                ui::info("Gateway healthy");
                ui::print_output(&r.stdout);
            } else {
                ui::fail("Gateway health check failed");
                ui::print_output(&r.stderr);
            }
        }
        GatewayCommand::Logs { lines, follow } => {
            if follow {
                ui::info("Streaming gateway logs, press Ctrl-C to stop.");
                app.executor
                    .exec_stream(target, &format!("sudo docker logs -f {}", container))
                    .await?;
            } else {
                let r = app
                    .executor
                    .exec_safe(target, &format!("sudo docker logs --tail {} {}", lines, container))
                    .await;
                ui::print_output(if r.stdout.is_empty() { &r.stderr } else { &r.stdout });
            }
        }
        GatewayCommand::Start => {
            ui::info("Starting gateway stack...");
            ui::print_output(&compose.run(target, "up -d").await?);
            ui::info("Done.");
        }
        GatewayCommand::Stop => {
            ui::info("Stopping gateway stack...");
            ui::print_output(&compose.run(target, "down").await?);
            ui::info("Done.");
        }
        GatewayCommand::Restart => {
            ui::info("Restarting gateway stack...");
            ui::print_output(&compose.run(target, "restart").await?);
            ui::info("Done.");
        }
        GatewayCommand::Shell => {
            ui::info("Opening shell in gateway container. Type 'exit' to return.");
            app.gateway().run_interactive(target, "/bin/sh").await?;
        }
    }

    Ok(())
}
