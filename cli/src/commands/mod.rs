//! Operator commands

pub mod agent;
pub mod backups;
pub mod gateway;
pub mod infra;
pub mod monitoring;
pub mod otel;
pub mod status;
pub mod verify;

use vpsops_core::{
    CommandResult, ComposeRunner, ContainerRunner, ProbeOutcome, ProbeSpec, RemoteExecutor, Target,
};

use crate::config::Config;

/// Shared handles for all commands.
pub struct App {
    pub config: Config,
    pub executor: RemoteExecutor,
}

impl App {
    pub fn compose(&self) -> ComposeRunner {
        ComposeRunner::new(self.executor.clone(), self.config.service_user.clone())
    }

    pub fn gateway(&self) -> ContainerRunner {
        ContainerRunner::new(self.executor.clone(), self.config.gateway_container.clone())
    }
}

/// Build a probe that runs one command over SSH and evaluates the capture.
pub(crate) fn command_probe<E>(
    executor: &RemoteExecutor,
    name: &str,
    target: &Target,
    command: &str,
    eval: E,
) -> ProbeSpec
where
    E: FnOnce(CommandResult) -> ProbeOutcome + Send + 'static,
{
    let executor = executor.clone();
    let owned_target = target.clone();
    let command = command.to_string();
    ProbeSpec::new(name, target.name.clone(), async move {
        Ok(eval(executor.exec_safe(&owned_target, &command).await))
    })
}

/// Build a probe that runs one compose subcommand in the target's stack
/// directory and evaluates the capture.
pub(crate) fn compose_probe<E>(
    runner: &ComposeRunner,
    name: &str,
    target: &Target,
    subcmd: &str,
    eval: E,
) -> ProbeSpec
where
    E: FnOnce(CommandResult) -> ProbeOutcome + Send + 'static,
{
    let runner = runner.clone();
    let owned_target = target.clone();
    let subcmd = subcmd.to_string();
    ProbeSpec::new(name, target.name.clone(), async move {
        Ok(eval(runner.run_safe(&owned_target, &subcmd).await))
    })
}

/// Evaluator for exit-code-only checks with fixed details.
pub(crate) fn up_down(
    pass_detail: &'static str,
    fail_detail: &'static str,
) -> impl FnOnce(CommandResult) -> ProbeOutcome + Send + 'static {
    move |result| {
        if result.success {
            ProbeOutcome::pass(pass_detail)
        } else {
            ProbeOutcome::fail(fail_detail)
        }
    }
}

/// First `max` characters of a capture, for use as a detail string.
pub(crate) fn truncated(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
