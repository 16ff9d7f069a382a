use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::{Filter, FilterContext, FilterKind, FilterStack};
use crate::management::{Feature, ConfigStore};

/// Servlet filters used when the caller does not supply a list.
pub fn default_servlet_filters() -> Vec<FilterKind> {
    vec![FilterKind::RequestTagging, FilterKind::Logging]
}

/// Ordered filter descriptors. Insertion order is execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterChain {
    kinds: Vec<FilterKind>,
}

impl FilterChain {
    pub fn new(kinds: Vec<FilterKind>) -> Self {
        Self { kinds }
    }

    pub fn push(&mut self, kind: FilterKind) {
        self.kinds.push(kind);
    }

    pub fn kinds(&self) -> &[FilterKind] {
        &self.kinds
    }

    pub fn contains(&self, kind: FilterKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Instantiate every descriptor against `ctx`.
    pub fn build(&self, ctx: &FilterContext) -> FilterStack {
        let filters: Vec<Arc<dyn Filter>> =
            self.kinds.iter().map(|kind| kind.instantiate(ctx)).collect();
        FilterStack::new(filters)
    }
}

impl From<Vec<FilterKind>> for FilterChain {
    fn from(kinds: Vec<FilterKind>) -> Self {
        Self::new(kinds)
    }
}

/// Assembles the two filter lists for a launch.
pub struct FilterChainBuilder;

impl FilterChainBuilder {
    /// Platform filters around the API.
    ///
    /// The baseline is fixed. CORS is appended after it when `features.cors.enabled` is
    /// set; the servlet filter override never affects this list.
    pub fn provider_chain(config: &ConfigStore) -> FilterChain {
        let mut chain = FilterChain::new(vec![
            FilterKind::RequestTagging,
            FilterKind::NoCache,
            FilterKind::HaHotCheck,
            FilterKind::EntitlementContext,
            FilterKind::CsrfToken,
        ]);
        if Feature::Cors.is_enabled(config) {
            chain.push(FilterKind::Cors);
        }
        debug!(filters = ?chain.kinds(), "Provider filter chain assembled");
        chain
    }

    /// Filters around every request: the caller's list when given, else the default.
    pub fn servlet_chain(overridden: Option<&[FilterKind]>) -> FilterChain {
        let chain = match overridden {
            Some(kinds) => FilterChain::new(kinds.to_vec()),
            None => FilterChain::new(default_servlet_filters()),
        };
        debug!(filters = ?chain.kinds(), overridden = overridden.is_some(), "Servlet filter chain assembled");
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::keys;

    #[test]
    fn test_default_servlet_order() {
        assert_eq!(
            FilterChainBuilder::servlet_chain(None).kinds(),
            &[FilterKind::RequestTagging, FilterKind::Logging]
        );
    }

    #[test]
    fn test_override_replaces_servlet_list() {
        let chain = FilterChainBuilder::servlet_chain(Some(&[FilterKind::Logging]));
        assert_eq!(chain.kinds(), &[FilterKind::Logging]);
        let empty = FilterChainBuilder::servlet_chain(Some(&[]));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_provider_chain_baseline_and_cors() {
        let config = ConfigStore::new();
        let chain = FilterChainBuilder::provider_chain(&config);
        assert_eq!(chain.len(), 5);
        assert!(!chain.contains(FilterKind::Cors));

        config.put(keys::FEATURE_CORS, "true");
        let chain = FilterChainBuilder::provider_chain(&config);
        assert_eq!(chain.kinds().last(), Some(&FilterKind::Cors));
        assert_eq!(chain.kinds()[4], FilterKind::CsrfToken);
    }
}
