mod registry;
mod report;

pub use registry::{CheckResult, HealthCheck, HealthCheckRegistry};
pub use report::{health_endpoint, health_report};
