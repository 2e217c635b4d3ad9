//! Panic recovery filter.
//!
//! Placed earliest in a chain so it wraps everything downstream. Without it
//! a panic from a filter or the terminal handler propagates to the host
//! server's own handling.

use super::chain::{Filter, FilterChain};
use crate::error::panic_message;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::error;

/// Converts an uncaught panic from downstream filters or the terminal
/// handler into a 500 response, logging the payload and a captured
/// backtrace, and bumping a monotone panic counter.
#[derive(Default)]
pub struct RecoveryFilter {
    panics: Arc<AtomicU64>,
}

impl RecoveryFilter {
    /// Create a recovery filter with a zeroed panic counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total panics recovered so far.
    #[must_use]
    pub fn panic_count(&self) -> u64 {
        self.panics.load(Ordering::Relaxed)
    }

    /// Build the chain filter. The returned filter shares this value's
    /// panic counter, so the counter stays readable after wiring.
    #[must_use]
    pub fn filter(&self) -> Filter {
        let panics = self.panics.clone();
        Filter::new("recovery", move |req, res, chain: FilterChain| {
            let outcome = catch_unwind(AssertUnwindSafe(|| chain.process(req, res)));
            if let Err(payload) = outcome {
                panics.fetch_add(1, Ordering::Relaxed);
                let message = panic_message(payload.as_ref(), "handler panicked");
                let backtrace = std::backtrace::Backtrace::capture();
                error!(
                    path = %req.path,
                    method = %req.method,
                    panic_message = %message,
                    backtrace = %backtrace,
                    "Recovered panic from request pipeline"
                );
                res.set_json_error(500, "Internal Server Error");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ChainBuilder;
    use crate::message::{Request, Response};
    use http::Method;

    #[test]
    fn recovers_panic_and_counts() {
        let recovery = RecoveryFilter::new();
        let mut builder = ChainBuilder::new();
        builder.add(recovery.filter());
        let chain = builder.build(Arc::new(|_: &mut Request, _: &mut Response| {
            panic!("boom");
        }));

        let mut req = Request::new(Method::GET, "/explode");
        let mut res = Response::new();
        chain.process(&mut req, &mut res);
        assert_eq!(res.status, 500);
        assert_eq!(recovery.panic_count(), 1);
    }
}
