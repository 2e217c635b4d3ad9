//! Resource dispatcher: wires registered components into the router and
//! the negotiation engine.
//!
//! Capability classification happens once, at registration, against a
//! fixed set of capabilities (provider, resource, admin task) instead of
//! repeated dynamic probing at request time. The resolved reader/writer
//! sets travel in an explicit [`NegotiatedContext`] threaded into the
//! resource's handling logic, guaranteeing one negotiation per request
//! without ambient lookup.

use super::metrics::ResourceMetrics;
use crate::admin::{Task, TaskRegistry};
use crate::error::ServiceError;
use crate::filter::Handler;
use crate::message::{Request, Response};
use crate::negotiation::{
    negotiate_readers, negotiate_writers, Candidates, Provider, ProviderMap, ProviderSource,
    RestrictedProviderMap,
};
use http::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::{debug, error, info};

/// External router collaborator. Supplies path-pattern registration; the
/// router is expected to invoke the handler with the request and response
/// sink when a pattern matches.
pub trait Router {
    /// Register `handler` for `method` on `pattern`.
    fn handle(&mut self, method: Method, pattern: &str, handler: Box<dyn Handler>);
}

/// A routable unit of application logic.
pub trait Resource: Send + Sync {
    /// HTTP method this resource serves.
    fn method(&self) -> Method;

    /// Path pattern handed to the router collaborator.
    fn pattern(&self) -> &str;

    /// Optional allow-list narrowing readable media types for this
    /// resource. `None` leaves the global engine unrestricted.
    fn consumes(&self) -> Option<&[&str]> {
        None
    }

    /// Optional allow-list narrowing writable media types.
    fn produces(&self) -> Option<&[&str]> {
        None
    }

    /// Declaring a name installs a request counter and latency histogram
    /// for this resource.
    fn metrics_name(&self) -> Option<&str> {
        None
    }

    /// Application logic. Negotiation has already succeeded when this runs;
    /// a returned error is rendered through [`write_error`].
    fn handle(
        &self,
        ctx: &NegotiatedContext,
        req: &mut Request,
        res: &mut Response,
    ) -> Result<(), ServiceError>;
}

/// Per-request negotiation outcome, resolved once by the dispatcher and
/// passed explicitly to the resource and the entity helpers.
pub struct NegotiatedContext {
    /// Readers for the request's `Content-Type`; `None` when the request
    /// has no body and no default bucket exists.
    pub readers: Option<Candidates>,
    /// Writers for the first satisfiable `Accept` entry.
    pub writers: Candidates,
}

/// A component under registration, carrying any subset of the fixed
/// capability set. Capabilities are independent and not mutually
/// exclusive: one component may be a provider and a resource at once.
#[derive(Default)]
pub struct Component {
    provider: Option<Arc<dyn Provider>>,
    resource: Option<Arc<dyn Resource>>,
    task: Option<(String, Arc<dyn Task>)>,
}

impl Component {
    /// An empty component with no capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the provider capability.
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Attach the resource capability.
    #[must_use]
    pub fn resource(mut self, resource: Arc<dyn Resource>) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Attach the admin task capability.
    #[must_use]
    pub fn task(mut self, name: &str, task: Arc<dyn Task>) -> Self {
        self.task = Some((name.to_string(), task));
        self
    }
}

/// Registers components and synthesizes router handlers around the
/// negotiation engine.
///
/// Registration order across all components determines provider priority;
/// route registration order is independent.
pub struct ResourceDispatcher {
    providers: Arc<RwLock<ProviderMap>>,
    tasks: Arc<TaskRegistry>,
    metrics: RwLock<HashMap<String, Arc<ResourceMetrics>>>,
}

impl Default for ResourceDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceDispatcher {
    /// Create a dispatcher with an empty provider map and task registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Arc::new(RwLock::new(ProviderMap::new())),
            tasks: Arc::new(TaskRegistry::new()),
            metrics: RwLock::new(HashMap::new()),
        }
    }

    /// Shared provider map, for hosts that negotiate outside the
    /// synthesized handlers.
    #[must_use]
    pub fn providers(&self) -> Arc<RwLock<ProviderMap>> {
        self.providers.clone()
    }

    /// The admin task registry fed by registered task capabilities.
    #[must_use]
    pub fn tasks(&self) -> Arc<TaskRegistry> {
        self.tasks.clone()
    }

    /// Metrics for the named resource, if it declared a metrics name.
    #[must_use]
    pub fn resource_metrics(&self, name: &str) -> Option<Arc<ResourceMetrics>> {
        self.metrics.read().unwrap().get(name).cloned()
    }

    /// Register a component, classifying its capabilities once.
    ///
    /// A provider capability joins the negotiation engine; a resource
    /// capability gets a synthesized handler wired into `router`; a task
    /// capability joins the admin task registry.
    pub fn handle_component(&self, router: &mut dyn Router, component: Component) {
        if let Some(provider) = component.provider {
            self.providers.write().unwrap().add_provider(provider);
        }
        if let Some(resource) = component.resource {
            let metrics = resource.metrics_name().map(|name| {
                let m = Arc::new(ResourceMetrics::new());
                self.metrics
                    .write()
                    .unwrap()
                    .insert(name.to_string(), m.clone());
                m
            });
            let method = resource.method();
            let pattern = resource.pattern().to_string();
            info!(method = %method, pattern = %pattern, "Resource registered");
            let handler = synthesize_handler(self.providers.clone(), resource, metrics);
            router.handle(method, &pattern, handler);
        }
        if let Some((name, task)) = component.task {
            self.tasks.register(&name, task);
        }
    }
}

/// Build the router handler for one resource.
fn synthesize_handler(
    providers: Arc<RwLock<ProviderMap>>,
    resource: Arc<dyn Resource>,
    metrics: Option<Arc<ResourceMetrics>>,
) -> Box<dyn Handler> {
    Box::new(move |req: &mut Request, res: &mut Response| {
        let ctx = {
            let map = providers.read().unwrap();
            let restricted;
            let source: &dyn ProviderSource =
                if resource.consumes().is_some() || resource.produces().is_some() {
                    restricted =
                        RestrictedProviderMap::new(&map, resource.consumes(), resource.produces());
                    &restricted
                } else {
                    &*map
                };
            match negotiate(source, req) {
                Ok(ctx) => ctx,
                Err(e) => {
                    debug!(pattern = %resource.pattern(), error = %e, "Negotiation rejected request");
                    res.set_json_error(e.status(), &e.to_string());
                    return;
                }
            }
        };

        let start = Instant::now();
        let outcome = resource.handle(&ctx, req, res);
        if let Some(metrics) = &metrics {
            metrics.record(start.elapsed());
        }
        if let Err(e) = outcome {
            error!(pattern = %resource.pattern(), error = %e, "Resource handler failed");
            write_error(&ctx, res, &e);
        }
    })
}

/// Resolve readers and writers for one request. One resolution per
/// request; the result travels in the context.
fn negotiate(
    source: &dyn ProviderSource,
    req: &Request,
) -> Result<NegotiatedContext, ServiceError> {
    let readers = negotiate_readers(source, req.content_type(), req.body.is_some())?;
    let writers = negotiate_writers(source, req.accept())?;
    Ok(NegotiatedContext { readers, writers })
}

/// Deserialize the request body through the first applicable negotiated
/// reader.
pub fn read_entity(ctx: &NegotiatedContext, req: &Request) -> Result<Value, ServiceError> {
    let Some(body) = req.body.as_deref() else {
        return Err(ServiceError::bad_request("request body required"));
    };
    let Some(readers) = &ctx.readers else {
        return Err(ServiceError::UnsupportedMediaType {
            media_type: req.content_type().unwrap_or("").to_string(),
        });
    };
    for provider in &readers.providers {
        if provider.can_read(req) {
            return provider.read(body);
        }
    }
    Err(ServiceError::UnsupportedMediaType {
        media_type: readers.media_type.clone(),
    })
}

/// Serialize `value` through the first applicable negotiated writer and
/// store it on the response with the negotiated content type.
pub fn write_response(
    ctx: &NegotiatedContext,
    res: &mut Response,
    status: u16,
    value: &Value,
) -> Result<(), ServiceError> {
    for provider in &ctx.writers.providers {
        if provider.can_write(value) {
            let bytes = provider.write(value)?;
            res.status = status;
            res.set_header("content-type", ctx.writers.media_type.clone());
            res.body = bytes;
            return Ok(());
        }
    }
    Err(ServiceError::NotAcceptable {
        accept: ctx.writers.media_type.clone(),
    })
}

/// Render a service error through the negotiated writer, falling back to
/// JSON when the writer set cannot represent it.
pub fn write_error(ctx: &NegotiatedContext, res: &mut Response, err: &ServiceError) {
    let body = serde_json::json!({ "error": err.to_string() });
    if write_response(ctx, res, err.status(), &body).is_err() {
        res.set_json_error(err.status(), &err.to_string());
    }
}
