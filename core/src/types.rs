//! Shared types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named remote host with its connection parameters.
///
/// Immutable once constructed; cloned into probe futures and shared
/// freely across concurrent executions. No per-target session state is
/// kept between calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Target {
    /// Symbolic name, e.g. "primary" or "secondary"
    pub name: String,
    /// Host address (IP or hostname)
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Login user
    pub user: String,
    /// Path to the SSH identity file
    pub key_path: String,
    /// Connect timeout in seconds
    pub connect_timeout: u64,
    /// Directory holding this target's compose stack
    pub stack_dir: String,
}

impl Target {
    /// Get display string for target
    pub fn display(&self) -> String {
        format!("{} ({}@{}:{})", self.name, self.user, self.host, self.port)
    }
}

/// The outcome of running one command against one target.
///
/// Either all four fields reflect a completed session, or the transport
/// failed before a remote exit code was observable and `exit_code` holds
/// the sentinel value 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// The normalized, never-failing outcome of one probe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    pub name: String,
    pub target: String,
    pub ok: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            ok: true,
            detail: detail.into(),
        }
    }

    pub fn fail(name: impl Into<String>, target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            ok: false,
            detail: detail.into(),
        }
    }
}

/// Ordered collection of all probe outcomes for one run, plus the tally.
///
/// Element order always matches the order the probe specs were supplied,
/// never completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub results: Vec<CheckResult>,
    pub passed: usize,
    pub total: usize,
    pub generated_at: DateTime<Utc>,
}

impl AggregateReport {
    pub fn new(results: Vec<CheckResult>) -> Self {
        let passed = results.iter().filter(|r| r.ok).count();
        let total = results.len();
        Self {
            results,
            passed,
            total,
            generated_at: Utc::now(),
        }
    }

    /// True when every check passed. An empty report is not "all passed";
    /// callers render it as "no checks ran".
    pub fn all_passed(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }
}
