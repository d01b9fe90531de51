//! Infrastructure checks across the targets

use clap::Subcommand;
use futures::future::join_all;
use vpsops_core::{CommandResult, Target};

use crate::commands::App;
use crate::config::TargetScope;
use crate::ui;

#[derive(Subcommand, Debug)]
pub enum InfraCommand {
    /// WireGuard status
    Wireguard,
    /// Firewall status
    Firewall,
    /// Disk usage
    Disk,
    /// Memory and load
    Resources,
    /// SSH connectivity
    Ssh,
}

pub async fn run(app: &App, scope: TargetScope, command: InfraCommand) -> anyhow::Result<()> {
    match command {
        InfraCommand::Wireguard => run_on(app, scope, "WireGuard", "sudo wg show").await,
        InfraCommand::Firewall => run_on(app, scope, "Firewall", "sudo ufw status").await,
        InfraCommand::Disk => {
            run_on(
                app,
                scope,
                "Disk usage",
                "df -h --output=source,size,used,avail,pcent -x tmpfs -x devtmpfs 2>/dev/null || df -h",
            )
            .await
        }
        InfraCommand::Resources => {
            run_on(
                app,
                scope,
                "System resources",
                "echo '--- Memory ---' && free -h && echo '--- Uptime ---' && uptime",
            )
            .await
        }
        InfraCommand::Ssh => {
            for (target, result) in fan_out(app, scope, "echo ok").await {
                print_connectivity(target, result);
            }
            println!();
            Ok(())
        }
    }
}

/// Run the same command on every target in scope, concurrently.
async fn fan_out<'a>(
    app: &'a App,
    scope: TargetScope,
    command: &str,
) -> Vec<(&'a Target, CommandResult)> {
    let targets = app.config.targets(scope);
    let results = join_all(
        targets
            .iter()
            .map(|target| app.executor.exec_safe(target, command)),
    )
    .await;
    targets.into_iter().zip(results).collect()
}

async fn run_on(app: &App, scope: TargetScope, label: &str, command: &str) -> anyhow::Result<()> {
    let outputs = fan_out(app, scope, command).await;
    let last = outputs.len().saturating_sub(1);

    println!();
    for (i, (target, result)) in outputs.into_iter().enumerate() {
        println!("  {} {}", ui::target_label(&target.name), label);
        if result.success {
            ui::print_output(&result.stdout);
        } else {
            ui::fail(&result.stderr);
        }
        if i < last {
            ui::divider();
        }
    }

    println!();
    Ok(())
}

fn print_connectivity(target: &Target, result: CommandResult) {
    let label = ui::target_label(&target.name);
    if result.success {
        ui::pass(&format!("{} Connected", label));
    } else {
        ui::fail(&format!("{} {}", label, result.stderr));
    }
}
