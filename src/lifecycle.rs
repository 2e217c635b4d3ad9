//! Supervised startup and shutdown for long-lived components.
//!
//! The supervisor is a best-effort aggregator, not a transactional
//! activator: a failing start is logged and iteration continues, and a
//! failing or panicking stop never prevents the remaining objects from
//! shutting down. Callers needing all-or-nothing startup must check
//! object-specific state separately.

use crate::error::panic_message;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, warn};

/// A component with explicit start/stop lifecycle hooks. No other state is
/// imposed by the supervisor.
pub trait ManagedObject: Send + Sync {
    /// Bring the component up.
    fn start(&self) -> anyhow::Result<()>;
    /// Bring the component down.
    fn stop(&self) -> anyhow::Result<()>;
}

/// Supervisor states. Driven by exactly two external transitions
/// ([`Lifecycle::start`] and [`Lifecycle::stop`]); not reentrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, nothing started
    Idle,
    /// `start` in progress
    Starting,
    /// All start calls issued
    Running,
    /// `stop` in progress
    Stopping,
    /// All stop calls issued
    Stopped,
}

/// Orders startup and shutdown of managed components with failure
/// isolation.
///
/// Registration is not safe for concurrent use and must complete before
/// `start`/`stop` are invoked; both iterate on the calling thread.
#[derive(Default)]
pub struct Lifecycle {
    managed: Vec<(String, Arc<dyn ManagedObject>)>,
    state: LifecycleState,
}

impl Default for LifecycleState {
    fn default() -> Self {
        LifecycleState::Idle
    }
}

impl Lifecycle {
    /// Create an idle supervisor with no managed objects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Register a component. Objects start in registration order and stop
    /// in exact reverse order. The name is used for log correlation only.
    pub fn manage(&mut self, name: &str, object: Arc<dyn ManagedObject>) {
        self.managed.push((name.to_string(), object));
    }

    /// Start every managed object in registration order.
    ///
    /// A failing start is logged and iteration continues to the next
    /// object; startup failures are diagnostic, not fatal.
    pub fn start(&mut self) {
        if self.state != LifecycleState::Idle {
            warn!(state = ?self.state, "Ignoring start: supervisor is not idle");
            return;
        }
        self.state = LifecycleState::Starting;
        for (name, object) in &self.managed {
            match object.start() {
                Ok(()) => info!(managed = %name, "Managed object started"),
                Err(e) => error!(managed = %name, error = %e, "Managed object failed to start, continuing"),
            }
        }
        self.state = LifecycleState::Running;
    }

    /// Stop every managed object in exact reverse registration order.
    ///
    /// Each stop call is wrapped so that both a returned failure and a
    /// panic from that single object are logged and swallowed; one broken
    /// component's shutdown never prevents the rest from shutting down.
    /// There are no retries or timeouts: each stop runs to completion
    /// synchronously before the next begins.
    pub fn stop(&mut self) {
        if self.state != LifecycleState::Running {
            warn!(state = ?self.state, "Ignoring stop: supervisor is not running");
            return;
        }
        self.state = LifecycleState::Stopping;
        for (name, object) in self.managed.iter().rev() {
            match catch_unwind(AssertUnwindSafe(|| object.stop())) {
                Ok(Ok(())) => info!(managed = %name, "Managed object stopped"),
                Ok(Err(e)) => {
                    error!(managed = %name, error = %e, "Managed object failed to stop, continuing")
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref(), "stop panicked");
                    error!(managed = %name, panic_message = %message, "Managed object panicked during stop, continuing");
                }
            }
        }
        self.state = LifecycleState::Stopped;
    }
}
