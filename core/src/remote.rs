//! Remote execution via SSH

use std::future::Future;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info, instrument};

use crate::{CommandResult, Error, Result, Target};

/// Session flavor, controls PTY allocation and batch-mode flags.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SessionKind {
    Batch,
    Stream,
    Interactive,
}

/// Remote command executor
///
/// Spawns the system `ssh` binary with argv-style arguments. Each call
/// opens and tears down its own session; nothing is pooled or shared
/// between concurrent calls, so one executor may be cloned freely across
/// tasks.
#[derive(Debug, Clone)]
pub struct RemoteExecutor {
    verbose: bool,
}

impl RemoteExecutor {
    /// Create a new remote executor.
    ///
    /// `verbose` is fixed at construction; when set, each command is
    /// logged at info level instead of debug.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn log_command(&self, target: &Target, command: &str) {
        if self.verbose {
            info!(target = %target.name, command = %command, "Executing remote command");
        } else {
            debug!(target = %target.name, command = %command, "Executing remote command");
        }
    }

    /// Build the ssh argument vector for a target.
    ///
    /// The remote command itself is passed as a separate argv element by
    /// the callers, never spliced into these arguments.
    fn ssh_args(&self, target: &Target, kind: SessionKind) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        if kind == SessionKind::Interactive {
            args.push("-t".to_string());
        }
        args.push("-i".to_string());
        args.push(target.key_path.clone());
        args.push("-p".to_string());
        args.push(target.port.to_string());
        args.push("-o".to_string());
        args.push(format!("ConnectTimeout={}", target.connect_timeout));
        if kind == SessionKind::Batch {
            args.push("-o".to_string());
            args.push("BatchMode=yes".to_string());
        }
        args.push("-o".to_string());
        args.push("StrictHostKeyChecking=accept-new".to_string());
        args.push(format!("{}@{}", target.user, target.host));
        args
    }

    /// Execute a command on a target and return trimmed stdout.
    ///
    /// Fails with [`Error::CommandFailed`] on non-zero exit or transport
    /// failure. Thin wrapper over [`exec_safe`](Self::exec_safe) for call
    /// sites with no sensible fallback.
    #[instrument(skip(self, command), fields(target = %target.name))]
    pub async fn exec(&self, target: &Target, command: &str) -> Result<String> {
        into_throwing(self.exec_safe(target, command).await)
    }

    /// Execute a command on a target, capturing all failure into the
    /// result. Never fails.
    ///
    /// Transport failures (unreachable host, auth, timeout) surface the
    /// same way as a non-zero remote exit; when no remote exit code was
    /// observable the exit code is the sentinel value 1.
    pub async fn exec_safe(&self, target: &Target, command: &str) -> CommandResult {
        self.log_command(target, command);

        let output = Command::new("ssh")
            .args(self.ssh_args(target, SessionKind::Batch))
            .arg(command)
            .output()
            .await;

        match output {
            Ok(out) => CommandResult {
                success: out.status.success(),
                stdout: String::from_utf8_lossy(&out.stdout).trim().to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
                exit_code: out.status.code().unwrap_or(1),
            },
            Err(e) => CommandResult {
                success: false,
                stdout: String::new(),
                stderr: format!("failed to spawn ssh: {}", e),
                exit_code: 1,
            },
        }
    }

    /// Execute a long-lived command, forwarding its output to this
    /// process's stdout/stderr until the remote side exits or Ctrl-C is
    /// received.
    ///
    /// On interrupt the ssh child is killed and reaped, which tears down
    /// the session and the remote process with it. The interrupt listener
    /// exists only for the duration of this call. A non-zero remote exit
    /// is not an error in this mode.
    #[instrument(skip(self, command), fields(target = %target.name))]
    pub async fn exec_stream(&self, target: &Target, command: &str) -> Result<()> {
        self.log_command(target, command);

        let child = Command::new("ssh")
            .args(self.ssh_args(target, SessionKind::Stream))
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        // ctrl_c installs a process-global SIGINT handler on first use;
        // the handler outlives this call even though the listener future
        // does not.
        let interrupted = wait_or_cancel(child, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

        if interrupted {
            debug!(target = %target.name, "Interrupt received, terminated remote session");
        }

        Ok(())
    }

    /// Open an interactive PTY session, wiring this process's
    /// stdin/stdout/stderr to the remote side. Returns when the remote
    /// side exits.
    ///
    /// The remote UI owns the interaction; its exit status carries no
    /// success/failure contract.
    #[instrument(skip(self, command), fields(target = %target.name))]
    pub async fn exec_interactive(&self, target: &Target, command: &str) -> Result<()> {
        self.log_command(target, command);

        let mut child = Command::new("ssh")
            .args(self.ssh_args(target, SessionKind::Interactive))
            .arg(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        let _ = child.wait().await?;
        Ok(())
    }
}

impl Default for RemoteExecutor {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Wait for a streamed child until it exits or `cancel` resolves,
/// whichever comes first. On cancellation the child is killed and
/// reaped before returning. Returns whether cancellation won.
async fn wait_or_cancel<C>(mut child: Child, cancel: C) -> Result<bool>
where
    C: Future<Output = ()>,
{
    tokio::pin!(cancel);
    let interrupted = tokio::select! {
        status = child.wait() => {
            status?;
            false
        }
        _ = &mut cancel => true,
    };

    if interrupted {
        child.kill().await?;
    }
    Ok(interrupted)
}

/// Convert a captured result into the throwing form. The error carries
/// exactly the stdout/stderr/exit code the safe form would have returned.
fn into_throwing(result: CommandResult) -> Result<String> {
    if result.success {
        Ok(result.stdout)
    } else {
        Err(Error::CommandFailed {
            stdout: result.stdout,
            stderr: result.stderr,
            exit_code: result.exit_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target {
            name: "primary".to_string(),
            host: "203.0.113.10".to_string(),
            port: 222,
            user: "admin".to_string(),
            key_path: "/home/op/.ssh/id_ed25519".to_string(),
            connect_timeout: 10,
            stack_dir: "/srv/gateway".to_string(),
        }
    }

    #[test]
    fn batch_args_use_batch_mode_without_pty() {
        let executor = RemoteExecutor::new(false);
        let args = executor.ssh_args(&target(), SessionKind::Batch);
        assert!(!args.contains(&"-t".to_string()));
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert_eq!(args.last().unwrap(), "admin@203.0.113.10");
        let port_idx = args.iter().position(|a| a == "-p").unwrap();
        assert_eq!(args[port_idx + 1], "222");
        assert!(args.contains(&"ConnectTimeout=10".to_string()));
    }

    #[test]
    fn interactive_args_allocate_pty() {
        let executor = RemoteExecutor::new(false);
        let args = executor.ssh_args(&target(), SessionKind::Interactive);
        assert_eq!(args[0], "-t");
        assert!(!args.contains(&"BatchMode=yes".to_string()));
    }

    #[test]
    fn streaming_args_have_neither_pty_nor_batch_mode() {
        let executor = RemoteExecutor::new(false);
        let args = executor.ssh_args(&target(), SessionKind::Stream);
        assert!(!args.contains(&"-t".to_string()));
        assert!(!args.contains(&"BatchMode=yes".to_string()));
    }

    #[test]
    fn throwing_form_carries_identical_capture_on_failure() {
        let captured = CommandResult {
            success: false,
            stdout: "partial".to_string(),
            stderr: "permission denied".to_string(),
            exit_code: 1,
        };
        match into_throwing(captured) {
            Err(Error::CommandFailed {
                stdout,
                stderr,
                exit_code,
            }) => {
                assert_eq!(stdout, "partial");
                assert_eq!(stderr, "permission denied");
                assert_eq!(exit_code, 1);
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancellation_kills_streamed_child_promptly() {
        let child = Command::new("sleep")
            .arg("30")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        let started = std::time::Instant::now();
        let interrupted = wait_or_cancel(
            child,
            tokio::time::sleep(std::time::Duration::from_millis(50)),
        )
        .await
        .unwrap();
        assert!(interrupted);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[tokio::test]
    async fn child_exit_wins_over_pending_cancellation() {
        let child = Command::new("true")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        let interrupted = wait_or_cancel(child, std::future::pending::<()>())
            .await
            .unwrap();
        assert!(!interrupted);
    }

    #[test]
    fn throwing_form_returns_stdout_on_success() {
        let captured = CommandResult {
            success: true,
            stdout: "up 3 days".to_string(),
            stderr: String::new(),
            exit_code: 0,
        };
        assert_eq!(into_throwing(captured).unwrap(), "up 3 days");
    }
}
