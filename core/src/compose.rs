//! Privileged remote command composition
//!
//! Builds the compound shell commands needed to run the compose stack as
//! the low-privilege service account from its fixed directory, and to run
//! commands inside the gateway container. Pure string composition on top
//! of [`RemoteExecutor`].

use crate::{CommandResult, RemoteExecutor, Result, Target};

/// Quote a value for safe interpolation into a remote shell string.
///
/// POSIX single-quote escaping: the value is wrapped in single quotes and
/// embedded quotes become `'\''`.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Runs `docker compose` subcommands in a target's stack directory as the
/// service account.
///
/// The login user cannot enter the stack directory, so the composed
/// command re-executes under `sudo sh -c` and drops to the service user
/// for compose itself. `subcmd` is interpolated into a shell line:
/// callers must pass fixed, caller-controlled tokens only, never raw
/// end-user text.
#[derive(Debug, Clone)]
pub struct ComposeRunner {
    executor: RemoteExecutor,
    service_user: String,
}

impl ComposeRunner {
    pub fn new(executor: RemoteExecutor, service_user: impl Into<String>) -> Self {
        Self {
            executor,
            service_user: service_user.into(),
        }
    }

    /// Build the composed command string for a target.
    fn command(&self, target: &Target, subcmd: &str) -> String {
        let inner = format!(
            "cd {} && sudo -u {} docker compose {}",
            shell_quote(&target.stack_dir),
            shell_quote(&self.service_user),
            subcmd
        );
        format!("sudo sh -c {}", shell_quote(&inner))
    }

    /// Run a compose subcommand, returning trimmed stdout or failing on
    /// non-zero exit.
    pub async fn run(&self, target: &Target, subcmd: &str) -> Result<String> {
        self.executor.exec(target, &self.command(target, subcmd)).await
    }

    /// Run a compose subcommand, capturing all failure into the result.
    pub async fn run_safe(&self, target: &Target, subcmd: &str) -> CommandResult {
        self.executor
            .exec_safe(target, &self.command(target, subcmd))
            .await
    }

    /// Stream a compose subcommand's output (for `logs --follow`).
    pub async fn stream(&self, target: &Target, subcmd: &str) -> Result<()> {
        self.executor
            .exec_stream(target, &self.command(target, subcmd))
            .await
    }
}

/// Runs commands inside a named container on a target.
#[derive(Debug, Clone)]
pub struct ContainerRunner {
    executor: RemoteExecutor,
    container: String,
}

impl ContainerRunner {
    pub fn new(executor: RemoteExecutor, container: impl Into<String>) -> Self {
        Self {
            executor,
            container: container.into(),
        }
    }

    fn command(&self, cmd: &str, tty: bool) -> String {
        let flags = if tty { " -it" } else { "" };
        format!(
            "sudo docker exec{} {} {}",
            flags,
            shell_quote(&self.container),
            cmd
        )
    }

    /// Run a command inside the container, failing on non-zero exit.
    pub async fn run(&self, target: &Target, cmd: &str) -> Result<String> {
        self.executor.exec(target, &self.command(cmd, false)).await
    }

    /// Run a command inside the container, capturing all failure.
    pub async fn run_safe(&self, target: &Target, cmd: &str) -> CommandResult {
        self.executor
            .exec_safe(target, &self.command(cmd, false))
            .await
    }

    /// Run an interactive command inside the container over a PTY.
    pub async fn run_interactive(&self, target: &Target, cmd: &str) -> Result<()> {
        self.executor
            .exec_interactive(target, &self.command(cmd, true))
            .await
    }
}
