//! Probe execution and concurrent aggregation
//!
//! A probe is a caller-defined asynchronous predicate bound to one
//! target. The runner executes a batch of probes concurrently, makes
//! every failure total, and folds the outcomes into an ordered report.

use std::future::Future;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, instrument};

use crate::{AggregateReport, CheckResult, Result};

/// Minimal outcome of one probe predicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeOutcome {
    pub ok: bool,
    pub detail: String,
}

impl ProbeOutcome {
    pub fn pass(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            detail: detail.into(),
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
        }
    }
}

/// Default bound on concurrently running probes within one batch.
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 16;

/// A named probe bound to one target.
///
/// Identity is the (name, target) pair; duplicates are permitted and each
/// produces its own result.
pub struct ProbeSpec {
    name: String,
    target: String,
    probe: BoxFuture<'static, Result<ProbeOutcome>>,
}

impl ProbeSpec {
    pub fn new<F>(name: impl Into<String>, target: impl Into<String>, probe: F) -> Self
    where
        F: Future<Output = Result<ProbeOutcome>> + Send + 'static,
    {
        Self {
            name: name.into(),
            target: target.into(),
            probe: Box::pin(probe),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl std::fmt::Debug for ProbeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeSpec")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Execute one probe, producing a [`CheckResult`] no matter what.
///
/// The probe runs on its own task so that even a panic is contained here
/// and surfaces as `ok: false`. This is the only place probe failure is
/// made total; nothing propagates past it.
async fn run_one(spec: ProbeSpec) -> CheckResult {
    let ProbeSpec {
        name,
        target,
        probe,
    } = spec;

    match tokio::spawn(probe).await {
        Ok(Ok(outcome)) => CheckResult {
            name,
            target,
            ok: outcome.ok,
            detail: outcome.detail,
        },
        Ok(Err(err)) => CheckResult::fail(name, target, err.to_string()),
        Err(join_err) => CheckResult::fail(name, target, format!("probe aborted: {}", join_err)),
    }
}

/// Runs batches of probes concurrently and aggregates their results.
#[derive(Debug, Clone)]
pub struct ProbeRunner {
    max_concurrent: usize,
}

impl ProbeRunner {
    pub fn new() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT_PROBES,
        }
    }

    pub fn with_max_concurrent(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run all probes and fold their outcomes into a report.
    ///
    /// Every probe settles — a slow or failing probe never cancels or
    /// blocks its siblings, and the batch never aborts. Results are
    /// collected in input order regardless of completion order, so
    /// `report.total` always equals the number of specs supplied.
    #[instrument(skip(self, specs), fields(count = specs.len()))]
    pub async fn run_all(&self, specs: Vec<ProbeSpec>) -> AggregateReport {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let futures = specs.into_iter().map(|spec| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // The semaphore is never closed, so acquisition only ever
                // fails after close; run unbounded in that case rather
                // than lose the probe.
                let _permit = semaphore.acquire_owned().await.ok();
                run_one(spec).await
            }
        });

        let results = join_all(futures).await;
        let report = AggregateReport::new(results);
        debug!(passed = report.passed, total = report.total, "Probe batch settled");
        report
    }
}

impl Default for ProbeRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::time::Duration;

    fn passing(name: &str, target: &str, detail: &'static str) -> ProbeSpec {
        ProbeSpec::new(name, target, async move { Ok(ProbeOutcome::pass(detail)) })
    }

    async fn panic_probe(msg: &'static str) -> Result<ProbeOutcome> {
        panic!("{}", msg)
    }

    #[tokio::test]
    async fn empty_batch_produces_empty_report() {
        let report = ProbeRunner::new().run_all(vec![]).await;
        assert_eq!(report.total, 0);
        assert_eq!(report.passed, 0);
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn report_always_accounts_for_every_spec() {
        let specs = vec![
            passing("a", "primary", "ok"),
            ProbeSpec::new("b", "primary", async {
                Err(Error::Probe("malformed output".to_string()))
            }),
            ProbeSpec::new("c", "secondary", panic_probe("unexpected")),
            passing("d", "secondary", "ok"),
        ];
        let report = ProbeRunner::new().run_all(specs).await;
        assert_eq!(report.total, 4);
        assert_eq!(report.passed, 2);
    }

    #[tokio::test]
    async fn order_matches_input_not_completion() {
        let specs = vec![
            passing("a", "primary", "fast"),
            ProbeSpec::new("b", "primary", async {
                tokio::time::sleep(Duration::from_millis(80)).await;
                Ok(ProbeOutcome::pass("slow"))
            }),
            passing("c", "secondary", "fast"),
        ];
        let report = ProbeRunner::new().run_all(specs).await;
        let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn failing_probe_is_isolated_from_siblings() {
        let specs = vec![
            passing("first", "primary", "ok"),
            ProbeSpec::new("second", "primary", async {
                Err(Error::Probe("boom".to_string()))
            }),
            passing("third", "secondary", "ok"),
        ];
        let report = ProbeRunner::new().run_all(specs).await;
        let oks: Vec<bool> = report.results.iter().map(|r| r.ok).collect();
        assert_eq!(oks, vec![true, false, true]);
        assert!(report.results[1].detail.contains("boom"));
    }

    #[tokio::test]
    async fn panicking_probe_becomes_failed_result() {
        let specs = vec![ProbeSpec::new("p", "primary", panic_probe("boom"))];
        let report = ProbeRunner::new().run_all(specs).await;
        assert_eq!(report.total, 1);
        assert!(!report.results[0].ok);
        assert!(report.results[0].detail.contains("probe aborted"));
    }

    #[tokio::test]
    async fn duplicate_specs_each_produce_a_result() {
        let specs = vec![
            passing("ssh-reachable", "primary", "ok"),
            passing("ssh-reachable", "secondary", "ok"),
            passing("ssh-reachable", "primary", "ok"),
        ];
        let report = ProbeRunner::new().run_all(specs).await;
        assert_eq!(report.total, 3);
        assert_eq!(report.passed, 3);
    }

    #[tokio::test]
    async fn bounded_runner_still_settles_everything() {
        let specs: Vec<ProbeSpec> = (0..20)
            .map(|i| {
                ProbeSpec::new(format!("probe-{}", i), "primary", async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(ProbeOutcome::pass("ok"))
                })
            })
            .collect();
        let report = ProbeRunner::with_max_concurrent(3).run_all(specs).await;
        assert_eq!(report.total, 20);
        assert_eq!(report.passed, 20);
        assert_eq!(report.results[7].name, "probe-7");
    }

    #[tokio::test]
    async fn uptime_check_scenario() {
        // Probe transport reports "up 3 days" with exit 0.
        let spec = ProbeSpec::new("uptime-check", "primary", async {
            Ok(ProbeOutcome::pass("up 3 days"))
        });
        let report = ProbeRunner::new().run_all(vec![spec]).await;
        assert_eq!(
            report.results[0],
            CheckResult::pass("uptime-check", "primary", "up 3 days")
        );
        assert_eq!(report.passed, 1);
    }

    #[tokio::test]
    async fn one_reachable_one_unreachable_target() {
        let specs = vec![
            ProbeSpec::new("ssh-reachable", "primary", async {
                Ok(ProbeOutcome::pass("ok"))
            }),
            ProbeSpec::new("ssh-reachable", "secondary", async {
                Ok(ProbeOutcome::fail("connection timed out"))
            }),
        ];
        let report = ProbeRunner::new().run_all(specs).await;
        assert!(report.results[0].ok);
        assert!(!report.results[1].ok);
        assert_eq!(report.passed, 1);
        assert_eq!(report.total, 2);
    }
}
