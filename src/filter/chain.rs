//! Ordered middleware pipeline with explicit continuation.
//!
//! A filter receives the request, the response sink, and the remaining
//! chain. Forwarding is never implicit: a filter that does not call
//! [`FilterChain::process`] terminates the request, which is the intended
//! mechanism for short-circuiting (auth rejection, preflight responses).

use crate::message::{Request, Response};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Terminal request handler wrapped at the end of every chain.
pub trait Handler: Send + Sync {
    /// Handle the request, writing into the response sink.
    fn handle(&self, req: &mut Request, res: &mut Response);
}

impl<F> Handler for F
where
    F: Fn(&mut Request, &mut Response) + Send + Sync,
{
    fn handle(&self, req: &mut Request, res: &mut Response) {
        self(req, res)
    }
}

/// A filter's handling function: (request, response sink, remaining chain).
pub type FilterFunc = Arc<dyn Fn(&mut Request, &mut Response, FilterChain) + Send + Sync>;

/// A named middleware unit. The name is unique within a chain and is used
/// for ordered insertion at wiring time.
#[derive(Clone)]
pub struct Filter {
    name: Arc<str>,
    func: FilterFunc,
}

impl Filter {
    /// Create a filter from a name and handling function.
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, FilterChain) + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            func: Arc::new(func),
        }
    }

    /// The filter's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").field("name", &self.name).finish()
    }
}

/// Wiring-time chain construction error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// `insert_before` named a filter that is not in the chain. Chains are
    /// built once at wiring time, so this is a programmer error, not a
    /// runtime condition.
    FilterNotFound {
        /// The missing filter name
        name: String,
    },
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::FilterNotFound { name } => {
                write!(f, "no filter named '{name}' in chain")
            }
        }
    }
}

impl std::error::Error for ChainError {}

/// Ordered filter list under construction.
///
/// `build` copies the current filters, so one base builder can be
/// specialized per sub-router without mutating shared state.
#[derive(Default, Clone)]
pub struct ChainBuilder {
    filters: Vec<Filter>,
}

impl ChainBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter to the end of the chain.
    pub fn add(&mut self, filter: Filter) -> &mut Self {
        debug!(filter_name = %filter.name(), position = self.filters.len(), "Filter appended");
        self.filters.push(filter);
        self
    }

    /// Splice a filter immediately before the named filter.
    ///
    /// O(n) over the current chain. Fails with [`ChainError::FilterNotFound`]
    /// when the name is absent, leaving the chain unmodified.
    pub fn insert_before(&mut self, target: &str, filter: Filter) -> Result<(), ChainError> {
        match self.filters.iter().position(|f| f.name() == target) {
            Some(idx) => {
                debug!(filter_name = %filter.name(), before = target, position = idx, "Filter inserted");
                self.filters.insert(idx, filter);
                Ok(())
            }
            None => Err(ChainError::FilterNotFound {
                name: target.to_string(),
            }),
        }
    }

    /// Names of the filters currently in the chain, in execution order.
    #[must_use]
    pub fn filter_names(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.name().to_string()).collect()
    }

    /// Snapshot the current filters and terminate them with `terminal`.
    #[must_use]
    pub fn build(&self, terminal: Arc<dyn Handler>) -> FilterChain {
        FilterChain {
            filters: self.filters.clone().into(),
            index: 0,
            terminal,
        }
    }
}

/// An executable chain: filters in order, then the terminal handler.
///
/// The chain value is cheap to clone (shared filter slice) and is consumed
/// by execution; each request gets its own traversal cursor, so no
/// synchronization happens inside the chain.
#[derive(Clone)]
pub struct FilterChain {
    filters: Arc<[Filter]>,
    index: usize,
    terminal: Arc<dyn Handler>,
}

impl FilterChain {
    /// Invoke the next element of the chain.
    ///
    /// Calls the filter at the cursor with the remainder of the chain, or
    /// the terminal handler once the filters are exhausted. A filter that
    /// never calls its continuation silently terminates the request.
    pub fn process(mut self, req: &mut Request, res: &mut Response) {
        if self.index < self.filters.len() {
            let filter = self.filters[self.index].clone();
            self.index += 1;
            (filter.func)(req, res, self);
        } else {
            self.terminal.handle(req, res);
        }
    }
}
