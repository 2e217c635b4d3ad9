//! Explicitly constructed runtime environment.
//!
//! Replaces package-level singletons: the host builds one `Environment`,
//! threads it (or its parts) to wherever they are needed, and tears it
//! down with an explicit call. Construction order is plain code instead of
//! initialization magic.

use crate::admin::TaskRegistry;
use crate::dispatch::ResourceDispatcher;
use crate::health::HealthCheckRegistry;
use crate::lifecycle::Lifecycle;
use std::sync::Arc;
use tracing::info;

/// The toolkit's process-wide state: lifecycle supervisor, health
/// registry, and the resource dispatcher (which owns the negotiation
/// engine and the admin task registry).
pub struct Environment {
    /// Startup/shutdown supervisor
    pub lifecycle: Lifecycle,
    /// Health check registry
    pub health: Arc<HealthCheckRegistry>,
    /// Component registration and request dispatch
    pub dispatcher: ResourceDispatcher,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Construct an idle environment with empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            health: Arc::new(HealthCheckRegistry::new()),
            dispatcher: ResourceDispatcher::new(),
        }
    }

    /// The admin task registry owned by the dispatcher.
    #[must_use]
    pub fn tasks(&self) -> Arc<TaskRegistry> {
        self.dispatcher.tasks()
    }

    /// Start every managed object. Call after all registration is done.
    pub fn start(&mut self) {
        info!("Environment starting");
        self.lifecycle.start();
    }

    /// Explicit teardown: stops managed objects in reverse registration
    /// order.
    pub fn shutdown(&mut self) {
        info!("Environment shutting down");
        self.lifecycle.stop();
    }
}
