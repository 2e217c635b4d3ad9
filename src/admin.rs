//! Admin task registry.
//!
//! Any component exposing a name and a request-handling function can be
//! registered as a task, invoked only via POST at `/tasks/<name>`.

use crate::message::{Request, Response};
use http::Method;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// An operator-invoked action exposed on the admin surface.
pub trait Task: Send + Sync {
    /// Execute the task, writing its outcome into the response.
    fn execute(&self, req: &mut Request, res: &mut Response);
}

impl<F> Task for F
where
    F: Fn(&mut Request, &mut Response) + Send + Sync,
{
    fn execute(&self, req: &mut Request, res: &mut Response) {
        self(req, res)
    }
}

/// Name→task mapping serving the `/tasks/<name>` contract.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<String, Arc<dyn Task>>>,
}

impl TaskRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under `name`, replacing any previous registration.
    pub fn register(&self, name: &str, task: Arc<dyn Task>) {
        debug!(task = %name, "Admin task registered");
        self.tasks.write().unwrap().insert(name.to_string(), task);
    }

    /// Names of the registered tasks, unordered.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.tasks.read().unwrap().keys().cloned().collect()
    }

    /// Serve a request against the task surface.
    ///
    /// Tasks are invoked only via POST at `/tasks/<name>`: any other method
    /// gets 405, an unknown name or malformed path gets 404.
    pub fn handle(&self, req: &mut Request, res: &mut Response) {
        let Some(name) = req.path.strip_prefix("/tasks/").map(str::to_string) else {
            res.set_json_error(404, "Not Found");
            return;
        };
        if name.is_empty() || name.contains('/') {
            res.set_json_error(404, "Not Found");
            return;
        }
        if req.method != Method::POST {
            res.set_json_error(405, "Method Not Allowed");
            return;
        }
        let task = self.tasks.read().unwrap().get(&name).cloned();
        match task {
            Some(task) => {
                info!(task = %name, "Executing admin task");
                task.execute(req, res);
            }
            None => res.set_json_error(404, &format!("no task named '{name}'")),
        }
    }
}
