//! Named health checks with concurrent aggregation.

use crate::error::panic_message;
use may::coroutine;
use may::sync::mpsc;
use serde::Serialize;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Outcome of one health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckResult {
    /// Whether the probed subsystem is healthy
    pub healthy: bool,
    /// Optional human-readable detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional underlying error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl CheckResult {
    /// A healthy result with no detail.
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            message: None,
            cause: None,
        }
    }

    /// A healthy result carrying a message.
    #[must_use]
    pub fn healthy_with_message(message: &str) -> Self {
        Self {
            healthy: true,
            message: Some(message.to_string()),
            cause: None,
        }
    }

    /// An unhealthy result carrying a message and no structured cause.
    #[must_use]
    pub fn unhealthy(message: &str) -> Self {
        Self {
            healthy: false,
            message: Some(message.to_string()),
            cause: None,
        }
    }

    /// An unhealthy result with no detail at all.
    #[must_use]
    pub fn unhealthy_bare() -> Self {
        Self {
            healthy: false,
            message: None,
            cause: None,
        }
    }

    /// An unhealthy result carrying an underlying error as cause.
    #[must_use]
    pub fn unhealthy_with_cause(message: Option<&str>, cause: &dyn std::fmt::Display) -> Self {
        Self {
            healthy: false,
            message: message.map(str::to_string),
            cause: Some(cause.to_string()),
        }
    }
}

/// A named, side-effect-free probe.
///
/// Returning `Err` yields an unhealthy result carrying the error as cause;
/// returning `Ok` passes the result through untouched.
pub trait HealthCheck: Send + Sync {
    /// Probe the subsystem.
    fn check(&self) -> anyhow::Result<CheckResult>;
}

impl<F> HealthCheck for F
where
    F: Fn() -> anyhow::Result<CheckResult> + Send + Sync,
{
    fn check(&self) -> anyhow::Result<CheckResult> {
        self()
    }
}

/// Mutex-guarded name→check mapping with a concurrent aggregate runner.
#[derive(Default)]
pub struct HealthCheckRegistry {
    checks: Mutex<HashMap<String, Arc<dyn HealthCheck>>>,
}

impl HealthCheckRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check under `name`, replacing any previous registration.
    pub fn register(&self, name: &str, check: Arc<dyn HealthCheck>) {
        let replaced = self
            .checks
            .lock()
            .unwrap()
            .insert(name.to_string(), check)
            .is_some();
        if replaced {
            warn!(check = %name, "Replaced existing health check");
        } else {
            debug!(check = %name, "Health check registered");
        }
    }

    /// Remove the check registered under `name`, if any.
    pub fn unregister(&self, name: &str) {
        self.checks.lock().unwrap().remove(name);
    }

    /// Names of the registered checks, unordered.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.checks.lock().unwrap().keys().cloned().collect()
    }

    /// Look up and run a single check synchronously.
    ///
    /// Returns an unhealthy "not found" result when `name` is absent.
    #[must_use]
    pub fn run_check(&self, name: &str) -> CheckResult {
        let check = self.checks.lock().unwrap().get(name).cloned();
        match check {
            Some(check) => run_isolated(name, check.as_ref()),
            None => CheckResult::unhealthy(&format!("no health check named '{name}'")),
        }
    }

    /// Run every registered check concurrently and aggregate the results.
    ///
    /// One coroutine per check; the call blocks until exactly as many
    /// results have arrived as checks were registered when the run was
    /// dispatched (checks registered mid-run are not included). Worker
    /// isolation guarantees one malfunctioning check can never abort the
    /// aggregate run. There is no timeout: a check that never returns
    /// leaves this call blocked forever, a documented limitation.
    #[must_use]
    pub fn run_checks(&self) -> HashMap<String, CheckResult> {
        let snapshot: Vec<(String, Arc<dyn HealthCheck>)> = {
            let checks = self.checks.lock().unwrap();
            checks
                .iter()
                .map(|(name, check)| (name.clone(), check.clone()))
                .collect()
        };
        let expected = snapshot.len();
        debug!(checks = expected, "Dispatching health check run");

        let (tx, rx) = mpsc::channel::<(String, CheckResult)>();
        for (name, check) in snapshot {
            let tx = tx.clone();
            // SAFETY: may::coroutine::spawn() is marked unsafe by the may
            // runtime. The closure is Send + 'static, owns its check and
            // sender, and isolates panics with catch_unwind before they can
            // reach the coroutine boundary.
            unsafe {
                coroutine::spawn(move || {
                    let result = run_isolated(&name, check.as_ref());
                    let _ = tx.send((name, result));
                });
            }
        }
        drop(tx);

        let mut results = HashMap::with_capacity(expected);
        for _ in 0..expected {
            match rx.recv() {
                Ok((name, result)) => {
                    results.insert(name, result);
                }
                Err(_) => break, // all workers gone; every result accounted for
            }
        }
        results
    }
}

/// Run one check inside a result-capturing boundary.
///
/// `Err` from the check becomes an unhealthy result with that error as
/// cause; a panic with a string payload becomes an unhealthy result with
/// that message; any other panic payload becomes a generic unhealthy
/// result.
fn run_isolated(name: &str, check: &dyn HealthCheck) -> CheckResult {
    match catch_unwind(AssertUnwindSafe(|| check.check())) {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!(check = %name, error = %e, "Health check returned an error");
            CheckResult::unhealthy_with_cause(Some(&e.to_string()), &e)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref(), "health check panicked");
            warn!(check = %name, panic_message = %message, "Health check panicked");
            CheckResult::unhealthy(&message)
        }
    }
}
