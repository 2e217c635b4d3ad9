//! Provider registration and media-type lookup.
//!
//! Registration order is load-bearing twice over: buckets keep providers in
//! insertion order (first structurally-applicable one wins), and the
//! wildcard `*/*` resolves to the first non-empty bucket in registration
//! order, approximating "pick the default provider".

use super::provider::Provider;
use crate::error::ServiceError;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The wildcard media type.
pub const WILDCARD: &str = "*/*";

/// Providers resolved for one concrete media type, in registration order.
#[derive(Clone)]
pub struct Candidates {
    /// The concrete media type the candidates serve. Resolved even when the
    /// query was the wildcard or empty.
    pub media_type: String,
    /// Matching providers in registration order.
    pub providers: Vec<Arc<dyn Provider>>,
}

impl fmt::Debug for Candidates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidates")
            .field("media_type", &self.media_type)
            .field("providers", &self.providers.len())
            .finish()
    }
}

/// A source of reader/writer candidates keyed by media type.
///
/// Implemented by [`ProviderMap`] (the global engine) and
/// [`RestrictedProviderMap`] (a per-resource narrowed view).
pub trait ProviderSource {
    /// Providers registered for reading `media_type`, or `None` when the
    /// bucket is empty. Wildcard and empty queries resolve to the first
    /// non-empty bucket.
    fn readers(&self, media_type: &str) -> Option<Candidates>;

    /// Providers registered for writing `media_type`, same wildcard rules.
    fn writers(&self, media_type: &str) -> Option<Candidates>;
}

/// Registration-ordered buckets of providers, independent for reading and
/// writing.
#[derive(Default)]
pub struct ProviderMap {
    readers: Vec<(String, Vec<Arc<dyn Provider>>)>,
    writers: Vec<(String, Vec<Arc<dyn Provider>>)>,
}

fn add_to_buckets(
    buckets: &mut Vec<(String, Vec<Arc<dyn Provider>>)>,
    media_type: &str,
    provider: Arc<dyn Provider>,
) {
    match buckets.iter_mut().find(|(mt, _)| mt == media_type) {
        Some((_, list)) => list.push(provider),
        None => buckets.push((media_type.to_string(), vec![provider])),
    }
}

fn lookup(buckets: &[(String, Vec<Arc<dyn Provider>>)], media_type: &str) -> Option<Candidates> {
    if media_type.is_empty() || media_type == WILDCARD {
        // first non-empty bucket in registration order
        return buckets
            .iter()
            .find(|(_, list)| !list.is_empty())
            .map(|(mt, list)| Candidates {
                media_type: mt.clone(),
                providers: list.clone(),
            });
    }
    buckets
        .iter()
        .find(|(mt, list)| mt == media_type && !list.is_empty())
        .map(|(mt, list)| Candidates {
            media_type: mt.clone(),
            providers: list.clone(),
        })
}

impl ProviderMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under every MIME type it declares, for reading
    /// and writing independently.
    pub fn add_provider(&mut self, provider: Arc<dyn Provider>) {
        for mt in provider.consumes() {
            add_to_buckets(&mut self.readers, mt, provider.clone());
        }
        for mt in provider.produces() {
            add_to_buckets(&mut self.writers, mt, provider.clone());
        }
        debug!(
            consumes = ?provider.consumes(),
            produces = ?provider.produces(),
            "Provider registered"
        );
    }
}

impl ProviderSource for ProviderMap {
    fn readers(&self, media_type: &str) -> Option<Candidates> {
        lookup(&self.readers, media_type)
    }

    fn writers(&self, media_type: &str) -> Option<Candidates> {
        lookup(&self.writers, media_type)
    }
}

/// A view over a parent [`ProviderMap`] narrowed to explicit
/// `consumes`/`produces` allow-lists, used at the per-resource level.
///
/// Lookups fall through to the parent only for allowed types: a resource
/// declaring `produces: [text/html]` never sees writers for JSON even if
/// the global engine has a JSON provider. Wildcard queries walk the
/// allow-list in its declared order.
pub struct RestrictedProviderMap<'a> {
    parent: &'a ProviderMap,
    consumes: Option<&'a [&'a str]>,
    produces: Option<&'a [&'a str]>,
}

impl<'a> RestrictedProviderMap<'a> {
    /// Narrow `parent` to the given allow-lists. `None` leaves that
    /// direction unrestricted.
    #[must_use]
    pub fn new(
        parent: &'a ProviderMap,
        consumes: Option<&'a [&'a str]>,
        produces: Option<&'a [&'a str]>,
    ) -> Self {
        Self {
            parent,
            consumes,
            produces,
        }
    }

    fn restricted(
        parent_lookup: impl Fn(&str) -> Option<Candidates>,
        allowed: Option<&[&str]>,
        media_type: &str,
    ) -> Option<Candidates> {
        let Some(allowed) = allowed else {
            return parent_lookup(media_type);
        };
        if media_type.is_empty() || media_type == WILDCARD {
            return allowed.iter().find_map(|mt| parent_lookup(*mt));
        }
        if allowed.contains(&media_type) {
            parent_lookup(media_type)
        } else {
            None
        }
    }
}

impl ProviderSource for RestrictedProviderMap<'_> {
    fn readers(&self, media_type: &str) -> Option<Candidates> {
        Self::restricted(|mt| self.parent.readers(mt), self.consumes, media_type)
    }

    fn writers(&self, media_type: &str) -> Option<Candidates> {
        Self::restricted(|mt| self.parent.writers(mt), self.produces, media_type)
    }
}

/// Resolve the readers for an inbound `Content-Type` header.
///
/// Absent or empty content types fall back to the default bucket. Fails
/// with 415 semantics only when the request carries a body and no reader
/// exists.
pub fn negotiate_readers(
    source: &dyn ProviderSource,
    content_type: Option<&str>,
    has_body: bool,
) -> Result<Option<Candidates>, ServiceError> {
    let media_type = content_type.unwrap_or("");
    match source.readers(media_type) {
        Some(candidates) => Ok(Some(candidates)),
        None if has_body => Err(ServiceError::UnsupportedMediaType {
            media_type: media_type.to_string(),
        }),
        None => Ok(None),
    }
}

/// Resolve the writers for an inbound `Accept` header.
///
/// Splits on commas, strips `;`-delimited parameters, trims whitespace,
/// and takes the first listed type with at least one writer. No q-value
/// weighting: first match wins, an intentional simplification of RFC 7231
/// negotiation. An absent or blank header behaves as the wildcard.
pub fn negotiate_writers(
    source: &dyn ProviderSource,
    accept: Option<&str>,
) -> Result<Candidates, ServiceError> {
    let accept = match accept {
        Some(header) if !header.trim().is_empty() => header,
        _ => WILDCARD,
    };
    for candidate in accept.split(',') {
        let media_type = candidate.split(';').next().unwrap_or("").trim();
        if media_type.is_empty() {
            continue;
        }
        if let Some(candidates) = source.writers(media_type) {
            return Ok(candidates);
        }
    }
    Err(ServiceError::NotAcceptable {
        accept: accept.to_string(),
    })
}
