//! Agent CLI passthrough into the gateway container

use crate::commands::App;
use crate::ui;

/// Run an agent CLI command inside the gateway container.
///
/// Arguments are joined into the agent command line as-is; this is the
/// same operator trust boundary as the composer, so callers pass fixed
/// tokens, not free text.
pub async fn run(app: &App, args: Vec<String>, interactive: bool) -> anyhow::Result<()> {
    let target = &app.config.primary;
    let cmdline = format!("{} {}", app.config.agent_command, args.join(" "));
    let gateway = app.gateway();

    if interactive {
        gateway.run_interactive(target, &cmdline).await?;
        return Ok(());
    }

    ui::info(&format!("agent {}", args.join(" ")));
    let r = gateway.run_safe(target, &cmdline).await;
    if r.success {
        ui::print_output(&r.stdout);
    } else {
        ui::fail(&format!("Exit code {}", r.exit_code));
        ui::print_output(&r.stderr);
        ui::print_output(&r.stdout);
    }

    Ok(())
}
