//! Backup operations on the primary target

use clap::Subcommand;

use crate::commands::App;
use crate::ui;

pub(crate) const BACKUP_SCRIPT: &str = "/usr/local/sbin/vpsops-backup.sh";
pub(crate) const BACKUP_DIR: &str = "/var/backups/gateway";
pub(crate) const BACKUP_LOG: &str = "/var/log/vpsops-backup.log";
pub(crate) const CRON_FILE: &str = "/etc/cron.d/vpsops-backup";

#[derive(Subcommand, Debug)]
pub enum BackupsCommand {
    /// Run a manual backup now
    Run,
    /// List existing backups
    List,
    /// Show the tail of the backup log
    Log,
    /// Show the backup cron job
    Cron,
}

pub async fn run(app: &App, command: BackupsCommand) -> anyhow::Result<()> {
    let target = &app.config.primary;

    match command {
        BackupsCommand::Run => {
            ui::info("Running backup...");
            let r = app
                .executor
                .exec_safe(target, &format!("sudo {}", BACKUP_SCRIPT))
                .await;
            if r.success {
                ui::pass("Backup completed");
                ui::print_output(&r.stdout);
            } else {
                ui::fail("Backup failed");
                ui::print_output(if r.stderr.is_empty() { &r.stdout } else { &r.stderr });
            }
        }
        BackupsCommand::List => {
            let r = app
                .executor
                .exec_safe(target, &format!("sudo ls -lh {} 2>/dev/null", BACKUP_DIR))
                .await;
            if r.success && !r.stdout.is_empty() {
                ui::print_output(&r.stdout);
            } else {
                ui::info("No backups found or backup directory empty.");
            }
        }
        BackupsCommand::Log => {
            let r = app
                .executor
                .exec_safe(target, &format!("sudo cat {} 2>/dev/null | tail -50", BACKUP_LOG))
                .await;
            if r.success && !r.stdout.is_empty() {
                ui::print_output(&r.stdout);
            } else {
                ui::info("No backup log found.");
            }
        }
        BackupsCommand::Cron => {
            let r = app
                .executor
                .exec_safe(target, &format!("sudo cat {} 2>/dev/null", CRON_FILE))
                .await;
            if r.success && !r.stdout.is_empty() {
                ui::print_output(&r.stdout);
            } else {
                ui::info("No backup cron job found.");
            }
        }
    }

    Ok(())
}
