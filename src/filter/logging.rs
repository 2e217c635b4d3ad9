//! Access-log filter feeding the fan-out writer.

use super::chain::Filter;
use crate::fanout::FanoutWriter;
use std::sync::Arc;
use std::time::Instant;

/// Build a filter that forwards the request and then writes one log line
/// per request to `writer`.
///
/// The line is `<method> <path> <status> <micros>us\n`. The enqueue blocks
/// only when a sink queue is full; the actual sink IO happens on the
/// writer's worker threads, off the request path.
#[must_use]
pub fn access_log_filter(writer: Arc<FanoutWriter>) -> Filter {
    Filter::new("access_log", move |req, res, chain| {
        let start = Instant::now();
        let method = req.method.clone();
        let path = req.path.clone();
        chain.process(req, res);
        let line = format!(
            "{} {} {} {}us\n",
            method,
            path,
            res.status,
            start.elapsed().as_micros()
        );
        writer.write(line.as_bytes());
    })
}
