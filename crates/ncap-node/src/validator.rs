//! The per-hop validation decision procedure.
//!
//! Run by every forwarding node against content already resident in the
//! local store. The steps are ordered and the first terminal wins; the
//! procedure always ends in exactly one of satisfied/denied.

use rand::Rng;

use ncap_core::{
    AcceptPath, AuthCache, Data, Decision, DenyReason, Interest, SignatureVerifier, MAX_PROB,
};

/// The ordered decision list shared by router and edge strategies.
#[derive(Debug, Clone)]
pub struct AccessValidator<V> {
    verifier: V,
}

impl<V: SignatureVerifier> AccessValidator<V> {
    pub const fn new(verifier: V) -> Self {
        Self { verifier }
    }

    pub const fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Evaluate an Interest against locally cached Data.
    ///
    /// Side effects: may set `data.no_recache` (step 5) and insert the tag
    /// into the positive cache (step 8). Cache insertion is the only
    /// persistent state change.
    pub fn evaluate<R: Rng>(
        &self,
        interest: &Interest,
        data: &mut Data,
        positive: &mut AuthCache,
        rng: &mut R,
    ) -> Decision {
        // 1. Public content bypasses access control entirely.
        if data.access_level == 0 {
            return Decision::Satisfied {
                via: AcceptPath::PublicContent,
            };
        }

        // 2. Protected content requires a tag.
        let Some(tag) = &interest.auth_tag else {
            return Decision::Denied {
                reason: DenyReason::MissingAuth,
            };
        };

        // 3. The tag must grant at least the content's level.
        if data.access_level > tag.access_level() {
            return Decision::Denied {
                reason: DenyReason::InsufficientAccessLevel,
            };
        }

        // 4. Tag issuer and response signer must agree.
        match (tag.issuer_locator(), data.key_locator()) {
            (Some(issuer), Some(signer)) if issuer == signer => {}
            _ => {
                return Decision::Denied {
                    reason: DenyReason::KeyLocatorMismatch,
                };
            }
        }

        let prob = interest.auth_validity_prob;
        if prob > 0 {
            // 5. A node trusting this hint must not let its own trust
            //    propagate further downstream as cached fact.
            data.no_recache = true;

            // 6. Trust-propagation short-circuit: the hint is the sender's
            //    confidence, computed upstream from cache FPP.
            if rng.gen_range(0..MAX_PROB) < prob {
                return Decision::Satisfied {
                    via: AcceptPath::ProbabilisticTrust,
                };
            }

            // 7. Cache-assisted trust.
            if positive.contains(tag) {
                return Decision::Satisfied {
                    via: AcceptPath::CachedTrust,
                };
            }
        }

        // 8. Fall back to the signature-validity predicate.
        if self.verifier.verify(tag.signature()) {
            positive.insert(tag);
            Decision::Satisfied {
                via: AcceptPath::SignatureCheck,
            }
        } else {
            Decision::Denied {
                reason: DenyReason::BadSignature,
            }
        }
    }
}
