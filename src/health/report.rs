//! Health report rendering per the admin endpoint contract.

use super::registry::{CheckResult, HealthCheckRegistry};
use crate::message::Response;
use serde_json::Value;
use std::collections::HashMap;

/// Render an aggregate result map as `(status, body)`.
///
/// 200 when every check is healthy, 500 otherwise, 501 when zero checks
/// are registered. The body maps each check name to its PascalCase-encoded
/// result.
#[must_use]
pub fn health_report(results: &HashMap<String, CheckResult>) -> (u16, Value) {
    if results.is_empty() {
        return (
            501,
            serde_json::json!({ "error": "no health checks registered" }),
        );
    }
    let status = if results.values().all(|r| r.healthy) {
        200
    } else {
        500
    };
    // CheckResult serialization is infallible (strings and a bool)
    let body = serde_json::to_value(results).unwrap_or(Value::Null);
    (status, body)
}

/// Run every registered check and write the report into `res`.
pub fn health_endpoint(registry: &HealthCheckRegistry, res: &mut Response) {
    let results = registry.run_checks();
    let (status, body) = health_report(&results);
    res.set_json(status, &body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_reports_not_implemented() {
        let (status, _) = health_report(&HashMap::new());
        assert_eq!(status, 501);
    }

    #[test]
    fn report_serializes_pascal_case_and_skips_absent_fields() {
        let mut results = HashMap::new();
        results.insert("db".to_string(), CheckResult::healthy());
        results.insert("queue".to_string(), CheckResult::unhealthy("backlog"));
        let (status, body) = health_report(&results);
        assert_eq!(status, 500);
        assert_eq!(body["db"]["Healthy"], serde_json::json!(true));
        assert!(body["db"].get("Message").is_none());
        assert_eq!(body["queue"]["Message"], serde_json::json!("backlog"));
        assert!(body["queue"].get("Cause").is_none());
    }
}
