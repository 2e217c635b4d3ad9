use armature::health::{health_endpoint, health_report, CheckResult, HealthCheck, HealthCheckRegistry};
use armature::message::Response;
use std::sync::Arc;

use tracing_util::TestTracing;

struct Panicking;

impl HealthCheck for Panicking {
    fn check(&self) -> anyhow::Result<CheckResult> {
        panic!("boom");
    }
}

struct SlowButHealthy;

impl HealthCheck for SlowButHealthy {
    fn check(&self) -> anyhow::Result<CheckResult> {
        std::thread::sleep(std::time::Duration::from_millis(20));
        Ok(CheckResult::healthy_with_message("caught up"))
    }
}

fn healthy_check() -> Arc<dyn HealthCheck> {
    Arc::new(|| -> anyhow::Result<CheckResult> { Ok(CheckResult::healthy()) })
}

#[test]
fn aggregate_run_isolates_every_failure_mode() {
    let _tracing = TestTracing::init();
    let registry = HealthCheckRegistry::new();
    registry.register("db", healthy_check());
    registry.register("queue", Arc::new(Panicking));
    registry.register(
        "disk",
        Arc::new(|| -> anyhow::Result<CheckResult> { Ok(CheckResult::unhealthy_bare()) }),
    );
    registry.register(
        "upstream",
        Arc::new(|| -> anyhow::Result<CheckResult> { anyhow::bail!("connection refused") }),
    );

    let results = registry.run_checks();
    assert_eq!(results.len(), 4);

    assert_eq!(results["db"], CheckResult::healthy());

    // panic payload becomes the message, with no structured cause
    let queue = &results["queue"];
    assert!(!queue.healthy);
    assert_eq!(queue.message.as_deref(), Some("boom"));
    assert!(queue.cause.is_none());

    let disk = &results["disk"];
    assert!(!disk.healthy);
    assert!(disk.message.is_none());
    assert!(disk.cause.is_none());

    let upstream = &results["upstream"];
    assert!(!upstream.healthy);
    assert_eq!(upstream.cause.as_deref(), Some("connection refused"));
}

#[test]
fn run_waits_for_every_dispatched_check() {
    let registry = HealthCheckRegistry::new();
    for i in 0..8 {
        registry.register(&format!("slow-{i}"), Arc::new(SlowButHealthy));
    }
    let results = registry.run_checks();
    assert_eq!(results.len(), 8);
    assert!(results.values().all(|r| r.healthy));
}

#[test]
fn single_check_lookup_reports_missing_names_as_unhealthy() {
    let registry = HealthCheckRegistry::new();
    registry.register("db", healthy_check());

    assert!(registry.run_check("db").healthy);

    let missing = registry.run_check("ghost");
    assert!(!missing.healthy);
    assert!(missing.message.as_deref().unwrap().contains("ghost"));
}

#[test]
fn registration_replaces_and_unregisters_by_name() {
    let _tracing = TestTracing::init();
    let registry = HealthCheckRegistry::new();
    registry.register("db", healthy_check());
    registry.register(
        "db",
        Arc::new(|| -> anyhow::Result<CheckResult> { Ok(CheckResult::unhealthy("degraded")) }),
    );
    assert_eq!(registry.names(), vec!["db".to_string()]);
    assert!(!registry.run_check("db").healthy);

    registry.unregister("db");
    assert!(registry.names().is_empty());
}

#[test]
fn endpoint_reports_aggregate_status() {
    let registry = HealthCheckRegistry::new();

    // zero checks: explicitly not implemented rather than vacuously healthy
    let mut res = Response::new();
    health_endpoint(&registry, &mut res);
    assert_eq!(res.status, 501);

    registry.register("db", healthy_check());
    let mut res = Response::new();
    health_endpoint(&registry, &mut res);
    assert_eq!(res.status, 200);
    let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(body["db"]["Healthy"], serde_json::json!(true));

    registry.register("queue", Arc::new(Panicking));
    let mut res = Response::new();
    health_endpoint(&registry, &mut res);
    assert_eq!(res.status, 500);
    let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(body["queue"]["Message"], serde_json::json!("boom"));
}

#[test]
fn report_includes_every_check_exactly_once() {
    let mut results = std::collections::HashMap::new();
    results.insert("a".to_string(), CheckResult::healthy());
    results.insert(
        "b".to_string(),
        CheckResult::unhealthy_with_cause(Some("io error"), &"disk full"),
    );
    let (status, body) = health_report(&results);
    assert_eq!(status, 500);
    assert_eq!(body.as_object().unwrap().len(), 2);
    assert_eq!(body["b"]["Cause"], serde_json::json!("disk full"));
}
