use armature::filter::{ChainBuilder, ChainError, Filter, RecoveryFilter};
use armature::message::{Request, Response};
use http::Method;
use std::sync::{Arc, Mutex};

use tracing_util::TestTracing;

type Log = Arc<Mutex<Vec<String>>>;

fn forwarding(name: &str, log: Log) -> Filter {
    let tag = name.to_string();
    Filter::new(name, move |req, res, chain| {
        log.lock().unwrap().push(tag.clone());
        chain.process(req, res);
    })
}

fn short_circuiting(name: &str, log: Log, status: u16) -> Filter {
    let tag = name.to_string();
    Filter::new(name, move |_req, res, _chain| {
        log.lock().unwrap().push(tag.clone());
        res.set_json_error(status, "rejected");
        // continuation deliberately not called
    })
}

fn terminal(log: Log) -> Arc<dyn armature::filter::Handler> {
    Arc::new(move |_req: &mut Request, res: &mut Response| {
        log.lock().unwrap().push("terminal".to_string());
        res.status = 200;
    })
}

#[test]
fn filters_run_in_insertion_order_then_terminal() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut builder = ChainBuilder::new();
    builder.add(forwarding("a", log.clone()));
    builder.add(forwarding("c", log.clone()));
    builder
        .insert_before("c", forwarding("b", log.clone()))
        .unwrap();

    let chain = builder.build(terminal(log.clone()));
    let mut req = Request::new(Method::GET, "/");
    let mut res = Response::new();
    chain.process(&mut req, &mut res);

    assert_eq!(res.status, 200);
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c", "terminal"]);
}

#[test]
fn filter_without_continuation_terminates_request() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut builder = ChainBuilder::new();
    builder.add(forwarding("first", log.clone()));
    builder.add(short_circuiting("auth", log.clone(), 401));
    builder.add(forwarding("never", log.clone()));

    let chain = builder.build(terminal(log.clone()));
    let mut req = Request::new(Method::GET, "/protected");
    let mut res = Response::new();
    chain.process(&mut req, &mut res);

    assert_eq!(res.status, 401);
    assert_eq!(*log.lock().unwrap(), vec!["first", "auth"]);
}

#[test]
fn insert_before_absent_name_fails_and_preserves_chain() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut builder = ChainBuilder::new();
    builder.add(forwarding("a", log.clone()));
    builder.add(forwarding("b", log.clone()));

    let err = builder
        .insert_before("missing", forwarding("x", log.clone()))
        .unwrap_err();
    assert_eq!(
        err,
        ChainError::FilterNotFound {
            name: "missing".to_string()
        }
    );
    assert_eq!(builder.filter_names(), vec!["a", "b"]);
}

#[test]
fn base_chain_specializes_per_sub_router_without_mutation() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut base = ChainBuilder::new();
    base.add(forwarding("common", log.clone()));

    let api_chain = base.build(terminal(log.clone()));

    let mut admin = base.clone();
    admin.add(short_circuiting("admin_auth", log.clone(), 403));
    let admin_chain = admin.build(terminal(log.clone()));

    let mut req = Request::new(Method::GET, "/api");
    let mut res = Response::new();
    api_chain.process(&mut req, &mut res);
    assert_eq!(res.status, 200);

    let mut req = Request::new(Method::GET, "/admin");
    let mut res = Response::new();
    admin_chain.process(&mut req, &mut res);
    assert_eq!(res.status, 403);

    assert_eq!(
        *log.lock().unwrap(),
        vec!["common", "terminal", "common", "admin_auth"]
    );
}

#[test]
fn recovery_filter_converts_panic_and_counts() {
    let _tracing = TestTracing::init();
    let recovery = RecoveryFilter::new();
    let mut builder = ChainBuilder::new();
    builder.add(recovery.filter());

    let chain = builder.build(Arc::new(|_: &mut Request, _: &mut Response| {
        panic!("handler exploded");
    }));

    for expected in 1..=3u64 {
        let mut req = Request::new(Method::GET, "/explode");
        let mut res = Response::new();
        chain.clone().process(&mut req, &mut res);
        assert_eq!(res.status, 500);
        assert_eq!(recovery.panic_count(), expected);
    }
}

#[test]
fn recovery_filter_is_transparent_without_panic() {
    let recovery = RecoveryFilter::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut builder = ChainBuilder::new();
    builder.add(recovery.filter());
    builder.add(forwarding("inner", log.clone()));

    let chain = builder.build(terminal(log.clone()));
    let mut req = Request::new(Method::GET, "/");
    let mut res = Response::new();
    chain.process(&mut req, &mut res);

    assert_eq!(res.status, 200);
    assert_eq!(recovery.panic_count(), 0);
    assert_eq!(*log.lock().unwrap(), vec!["inner", "terminal"]);
}
