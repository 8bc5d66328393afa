//! Router strategy: the core per-hop decision procedure.

use std::rc::Rc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ncap_core::{AuthCache, CacheKind, Decision, EventSink, Interest, SignatureVerifier};

use crate::shape::{DenialShaper, ResponseShaper};
use crate::traits::{ContentStore, Face, Packet};
use crate::validator::AccessValidator;

/// Per-strategy configuration, supplied by the embedding as plain data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Node label for events and logs.
    pub node: String,
    /// False-positive ceiling for both caches.
    pub cache_target_fpp: f64,
    /// Expected tag population for cache sizing.
    pub cache_expected_items: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            node: "router".into(),
            cache_target_fpp: 0.01,
            cache_expected_items: 1024,
        }
    }
}

impl StrategyConfig {
    #[must_use]
    pub fn named(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            ..Self::default()
        }
    }
}

/// Per-hop validation strategy run by every ordinary forwarding node.
///
/// Owns its caches exclusively; no component shares a cache across nodes.
pub struct RouterStrategy<V, R> {
    node: String,
    validator: AccessValidator<V>,
    positive: AuthCache,
    negative: AuthCache,
    shaper: DenialShaper,
    rng: R,
    sink: Rc<dyn EventSink>,
}

impl<V: SignatureVerifier, R: Rng> RouterStrategy<V, R> {
    #[must_use]
    pub fn new(config: &StrategyConfig, verifier: V, rng: R, sink: Rc<dyn EventSink>) -> Self {
        Self {
            node: config.node.clone(),
            validator: AccessValidator::new(verifier),
            positive: AuthCache::new(config.cache_target_fpp, config.cache_expected_items),
            negative: AuthCache::new(config.cache_target_fpp, config.cache_expected_items),
            shaper: DenialShaper,
            rng,
            sink,
        }
    }

    /// Handle an incoming Interest.
    ///
    /// A content-store hit runs the decision procedure and answers
    /// downstream; a miss is forwarded upstream unmodified (the only
    /// defined miss behavior).
    pub fn on_interest(
        &mut self,
        interest: &Interest,
        store: &dyn ContentStore,
        downstream: &mut dyn Face,
        upstream: &mut dyn Face,
    ) {
        let Some(mut data) = store.find(interest) else {
            upstream.send(Packet::Interest(interest.clone()));
            return;
        };

        let evictions_before = self.positive.evictions();
        let decision = self
            .validator
            .evaluate(interest, &mut data, &mut self.positive, &mut self.rng);
        if self.positive.evictions() > evictions_before {
            self.sink
                .on_cache_eviction(&self.node, CacheKind::Positive, &self.positive.stats());
        }

        debug!(
            node = %self.node,
            name = %interest.name,
            decision = %decision,
            "content-store hit validated"
        );
        self.sink.on_decision(&self.node, &interest.name, &decision);

        let response = match decision {
            Decision::Satisfied { .. } => self.shaper.satisfy(data),
            Decision::Denied { reason } => self.shaper.deny(&data, reason),
        };
        downstream.send(Packet::Data(response));
    }

    #[must_use]
    pub const fn positive_cache(&self) -> &AuthCache {
        &self.positive
    }

    pub fn positive_cache_mut(&mut self) -> &mut AuthCache {
        &mut self.positive
    }

    #[must_use]
    pub const fn negative_cache(&self) -> &AuthCache {
        &self.negative
    }

    pub fn negative_cache_mut(&mut self) -> &mut AuthCache {
        &mut self.negative
    }
}
