//! Core library for vpsops
//!
//! This crate provides remote command execution over SSH, privileged
//! command composition, and the concurrent health-check engine used by
//! the vpsops CLI.

pub mod compose;
pub mod error;
pub mod probe;
pub mod remote;
pub mod types;

// Re-exports
pub use compose::{shell_quote, ComposeRunner, ContainerRunner};
pub use error::{Error, Result};
pub use probe::{ProbeOutcome, ProbeRunner, ProbeSpec, DEFAULT_MAX_CONCURRENT_PROBES};
pub use remote::RemoteExecutor;
pub use types::{AggregateReport, CheckResult, CommandResult, Target};
