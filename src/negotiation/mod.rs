mod provider;
mod registry;

pub use provider::{JsonProvider, Provider, YamlProvider};
pub use registry::{
    negotiate_readers, negotiate_writers, Candidates, ProviderMap, ProviderSource,
    RestrictedProviderMap, WILDCARD,
};
