//! Edge strategy: the trust-boundary specialization.
//!
//! Runs the same core decision list as `RouterStrategy` with boundary
//! pre/post processing: strict route-hash binding on ingress (the only
//! place route hashes are meaningful to check), computation of the
//! `AuthValidityProbability` hint from cache state, and conversion of every
//! denial into an explicit Nack so protected content never crosses the
//! boundary.

use std::rc::Rc;

use rand::Rng;
use tracing::{debug, warn};

use ncap_core::{
    AuthCache, CacheKind, ContentKind, Data, Decision, DenyReason, EventSink, Interest,
    SignatureVerifier, MAX_PROB,
};

use crate::router::StrategyConfig;
use crate::shape::{nack_for_interest, NackShaper, ResponseShaper};
use crate::traits::{ContentStore, Face, Packet, PendingInterest, PendingRequests};
use crate::validator::AccessValidator;

/// Trust-boundary strategy run at edge nodes.
pub struct EdgeStrategy<V, R> {
    node: String,
    validator: AccessValidator<V>,
    positive: AuthCache,
    negative: AuthCache,
    shaper: NackShaper,
    rng: R,
    sink: Rc<dyn EventSink>,
}

impl<V: SignatureVerifier, R: Rng> EdgeStrategy<V, R> {
    #[must_use]
    pub fn new(config: &StrategyConfig, verifier: V, rng: R, sink: Rc<dyn EventSink>) -> Self {
        Self {
            node: config.node.clone(),
            validator: AccessValidator::new(verifier),
            positive: AuthCache::new(config.cache_target_fpp, config.cache_expected_items),
            negative: AuthCache::new(config.cache_target_fpp, config.cache_expected_items),
            shaper: NackShaper,
            rng,
            sink,
        }
    }

    /// Hint value derived from the positive cache: near-certain trust,
    /// discounted by the cache's own false-positive rate.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn positive_cache_prob(&self) -> u32 {
        ((1.0 - self.positive.effective_fpp()) * f64::from(MAX_PROB)).round() as u32
    }

    /// Handle an Interest entering the boundary.
    pub fn on_interest(
        &mut self,
        interest: &Interest,
        store: &dyn ContentStore,
        downstream: &mut dyn Face,
        upstream: &mut dyn Face,
    ) {
        let mut interest = interest.clone();

        if let Some(tag) = interest.auth_tag.clone() {
            // Strict route-hash binding: only meaningful here, once the
            // request has fully traversed the entry segment.
            if tag.route_hash() != interest.entry_route() {
                warn!(
                    node = %self.node,
                    name = %interest.name,
                    tag_route = tag.route_hash(),
                    entry_route = interest.entry_route(),
                    "route-hash binding violated at boundary"
                );
                self.sink.on_nack(
                    &self.node,
                    &interest.name,
                    Some(DenyReason::RouteHashMismatch),
                );
                downstream.send(Packet::Data(nack_for_interest(
                    &interest,
                    DenyReason::RouteHashMismatch,
                )));
                return;
            }

            if tag.access_level() > 0 {
                let prob = if self.contains_positive(&tag) {
                    self.positive_cache_prob()
                } else if self.contains_negative(&tag) {
                    // A tag previously denied gets one direct check; success
                    // promotes it out of the negative cache.
                    if self.validator.verifier().verify(tag.signature()) {
                        self.positive.insert(&tag);
                        MAX_PROB
                    } else {
                        self.sink.on_nack(
                            &self.node,
                            &interest.name,
                            Some(DenyReason::BadSignature),
                        );
                        downstream.send(Packet::Data(nack_for_interest(
                            &interest,
                            DenyReason::BadSignature,
                        )));
                        return;
                    }
                } else {
                    // Neither cache: no information, downstream of this hint
                    // must verify from scratch.
                    0
                };
                interest.auth_validity_prob = prob;
                debug!(node = %self.node, name = %interest.name, prob, "attached validity probability");
            }
        }

        // Delegate to the base decision list.
        let Some(mut data) = store.find(&interest) else {
            upstream.send(Packet::Interest(interest));
            return;
        };

        let evictions_before = self.positive.evictions();
        let decision =
            self.validator
                .evaluate(&interest, &mut data, &mut self.positive, &mut self.rng);
        if self.positive.evictions() > evictions_before {
            self.sink
                .on_cache_eviction(&self.node, CacheKind::Positive, &self.positive.stats());
        }
        self.sink.on_decision(&self.node, &interest.name, &decision);

        let response = match decision {
            Decision::Satisfied { .. } => self.shaper.satisfy(data),
            Decision::Denied { reason } => {
                self.sink.on_nack(&self.node, &interest.name, Some(reason));
                self.shaper.deny(&data, reason)
            }
        };
        downstream.send(Packet::Data(response));
    }

    /// Handle a response arriving from upstream, fanning it out to every
    /// deaggregated downstream requester.
    ///
    /// Denials are converted to explicit Nacks (never silently dropped)
    /// and the offending tag enters the negative cache; accepted responses
    /// enter the positive cache. Both insertions honor the no-recache
    /// marker.
    pub fn on_response(
        &mut self,
        data: &Data,
        pending: &mut dyn PendingRequests,
        downstream: &mut dyn Face,
    ) {
        let waiting = pending.drain_related(&data.name);
        let denied = matches!(data.kind, ContentKind::AuthDenial | ContentKind::Nack);

        for entry in waiting {
            if denied {
                self.relay_denial(data, &entry, downstream);
            } else {
                self.fan_out(data, &entry, downstream);
            }
        }
    }

    fn relay_denial(&mut self, data: &Data, entry: &PendingInterest, downstream: &mut dyn Face) {
        if !data.no_recache {
            if let Some(tag) = &entry.interest.auth_tag {
                self.negative.insert(tag);
            }
        }
        self.sink.on_nack(&self.node, &data.name, None);
        // Convert to an explicit Nack, preserving the upstream reason bytes.
        let nack = Data {
            name: data.name.clone(),
            kind: ContentKind::Nack,
            content: data.content.clone(),
            access_level: data.access_level,
            no_recache: data.no_recache,
            route_tracker: entry.interest.route_tracker,
            signature: data.signature.clone(),
        };
        downstream.send(Packet::Data(nack));
    }

    fn fan_out(&mut self, data: &Data, entry: &PendingInterest, downstream: &mut dyn Face) {
        match Self::revalidate(&entry.interest, data) {
            Ok(()) => {
                if !data.no_recache {
                    if let Some(tag) = &entry.interest.auth_tag {
                        self.positive.insert(tag);
                    }
                }
                let mut out = data.clone();
                // Each requester's Data carries the tracker its own
                // Interest carried.
                out.route_tracker = entry.interest.route_tracker;
                downstream.send(Packet::Data(out));
            }
            Err(reason) => {
                if !data.no_recache {
                    if let Some(tag) = &entry.interest.auth_tag {
                        self.negative.insert(tag);
                    }
                }
                self.sink.on_nack(&self.node, &data.name, Some(reason));
                let mut nack = self.shaper.deny(data, reason);
                nack.route_tracker = entry.interest.route_tracker;
                downstream.send(Packet::Data(nack));
            }
        }
    }

    /// Each deaggregated requester independently re-validates the access
    /// level and route binding before receiving the shared Data.
    fn revalidate(interest: &Interest, data: &Data) -> Result<(), DenyReason> {
        if data.access_level == 0 {
            return Ok(());
        }
        let Some(tag) = &interest.auth_tag else {
            return Err(DenyReason::MissingAuth);
        };
        if data.access_level > tag.access_level() {
            return Err(DenyReason::InsufficientAccessLevel);
        }
        if tag.route_hash() != interest.entry_route() {
            return Err(DenyReason::RouteHashMismatch);
        }
        Ok(())
    }

    fn contains_positive(&mut self, tag: &ncap_core::AuthTag) -> bool {
        let before = self.positive.evictions();
        let hit = self.positive.contains(tag);
        if self.positive.evictions() > before {
            self.sink
                .on_cache_eviction(&self.node, CacheKind::Positive, &self.positive.stats());
        }
        hit
    }

    fn contains_negative(&mut self, tag: &ncap_core::AuthTag) -> bool {
        let before = self.negative.evictions();
        let hit = self.negative.contains(tag);
        if self.negative.evictions() > before {
            self.sink
                .on_cache_eviction(&self.node, CacheKind::Negative, &self.negative.stats());
        }
        hit
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
