mod chain;
mod logging;
mod recovery;

pub use chain::{ChainBuilder, ChainError, Filter, FilterChain, FilterFunc, Handler};
pub use logging::access_log_filter;
pub use recovery::RecoveryFilter;
