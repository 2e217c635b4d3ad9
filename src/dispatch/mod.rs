mod core;
mod metrics;

pub use core::{
    read_entity, write_error, write_response, Component, NegotiatedContext, Resource,
    ResourceDispatcher, Router,
};
pub use metrics::ResourceMetrics;
