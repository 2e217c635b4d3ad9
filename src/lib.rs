//! # Armature
//!
//! **Armature** is an application-runtime toolkit for network services: a
//! uniform request-processing pipeline, content-type-aware dispatch, a
//! supervised startup/shutdown sequence, a concurrent health-check
//! aggregator, and a fan-out asynchronous writer for non-blocking
//! diagnostics.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`filter`]** - Ordered middleware chain with explicit continuation,
//!   plus panic recovery and access logging filters
//! - **[`negotiation`]** - MIME-type keyed provider registry and
//!   `Content-Type`/`Accept` resolution
//! - **[`dispatch`]** - Component registration, synthesized router
//!   handlers, and entity read/write helpers
//! - **[`lifecycle`]** - Ordered start/stop supervision with failure
//!   isolation
//! - **[`health`]** - Named health checks run concurrently and aggregated
//! - **[`fanout`]** - One logical write delivered to N independent sinks
//! - **[`admin`]** - POST-only operator task surface
//! - **[`environment`]** - Explicitly constructed process-wide state
//!
//! ## Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host as Host server
//!     participant Chain as FilterChain
//!     participant Handler as Synthesized handler
//!     participant Engine as ProviderMap
//!     participant Resource
//!
//!     Host->>Chain: process(req, res)
//!     Chain->>Chain: recovery, auth, logging filters
//!     alt Filter short-circuits
//!         Chain-->>Host: response (preflight, 401, ...)
//!     end
//!     Chain->>Handler: terminal handler
//!     Handler->>Engine: negotiate readers (Content-Type)
//!     Handler->>Engine: negotiate writers (Accept)
//!     alt No reader / no writer
//!         Handler-->>Host: 415 / 406
//!     end
//!     Handler->>Resource: handle(ctx, req, res)
//!     Resource->>Resource: read_entity / write_response
//!     Resource-->>Host: response
//! ```
//!
//! The lifecycle supervisor and the health registry operate orthogonally
//! to the request path, managing process-wide state for the service's
//! running lifetime. The fan-out writer is a utility consumed by logging
//! filters and admin surfaces.
//!
//! ## Collaborators
//!
//! Armature deliberately does not parse configuration files, bind
//! listeners, or match path patterns: hosts supply a parsed configuration,
//! a [`dispatch::Router`] implementation, and the serving loop. The
//! library logs through `tracing` and never installs a subscriber.
//!
//! ## Quick Start
//!
//! ```no_run
//! use armature::environment::Environment;
//! use armature::negotiation::JsonProvider;
//! use armature::dispatch::{Component, Router};
//! use std::sync::Arc;
//!
//! # struct NullRouter;
//! # impl Router for NullRouter {
//! #     fn handle(&mut self, _: http::Method, _: &str, _: Box<dyn armature::filter::Handler>) {}
//! # }
//! let mut env = Environment::new();
//! # let mut router = NullRouter;
//! env.dispatcher.handle_component(
//!     &mut router,
//!     Component::new().provider(Arc::new(JsonProvider)),
//! );
//! env.start();
//! // ... serve ...
//! env.shutdown();
//! ```

pub mod admin;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod fanout;
pub mod filter;
pub mod health;
pub mod lifecycle;
pub mod message;
pub mod negotiation;

pub use error::ServiceError;
pub use message::{HeaderVec, ParamVec, Request, Response};
