//! Totality of the per-hop decision procedure.
//!
//! Runs the validator across the full combination space of inputs and
//! checks that it always terminates in exactly one terminal, matching the
//! ordered decision list.

use rand::rngs::StdRng;
use rand::SeedableRng;

use ncap_core::{
    AcceptPath, AuthCache, AuthTag, Decision, DenyReason, KeyLocator, Name, SentinelVerifier,
    MAX_PROB,
};
use ncap_node::AccessValidator;
use ncap_testkit::fixtures;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagCase {
    Absent,
    Level(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyLocCase {
    Match,
    Mismatch,
}

fn build_tag(level: u32, keyloc: KeyLocCase, sig_valid: bool) -> AuthTag {
    let mut tag = fixtures::tag(level, 0);
    let mut signature = if sig_valid {
        fixtures::valid_signature()
    } else {
        fixtures::invalid_signature()
    };
    if keyloc == KeyLocCase::Mismatch {
        signature.info.key_locator = Some(KeyLocator(Name::parse("/producers/other").unwrap()));
    }
    tag.set_signature(signature);
    tag
}

/// Reference oracle: the ordered decision list, written independently of
/// the implementation's control flow. `prob` is restricted to {0, MAX_PROB}
/// so step 6 is deterministic.
fn expected(
    data_level: u32,
    tag: TagCase,
    keyloc: KeyLocCase,
    prob: u32,
    cached: bool,
    sig_valid: bool,
) -> Decision {
    if data_level == 0 {
        return Decision::Satisfied {
            via: AcceptPath::PublicContent,
        };
    }
    let TagCase::Level(tag_level) = tag else {
        return Decision::Denied {
            reason: DenyReason::MissingAuth,
        };
    };
    if data_level > tag_level {
        return Decision::Denied {
            reason: DenyReason::InsufficientAccessLevel,
        };
    }
    if keyloc == KeyLocCase::Mismatch {
        return Decision::Denied {
            reason: DenyReason::KeyLocatorMismatch,
        };
    }
    if prob == MAX_PROB {
        return Decision::Satisfied {
            via: AcceptPath::ProbabilisticTrust,
        };
    }
    if prob > 0 && cached {
        return Decision::Satisfied {
            via: AcceptPath::CachedTrust,
        };
    }
    if sig_valid {
        Decision::Satisfied {
            via: AcceptPath::SignatureCheck,
        }
    } else {
        Decision::Denied {
            reason: DenyReason::BadSignature,
        }
    }
}

#[test]
fn every_combination_reaches_exactly_one_terminal() {
    let validator = AccessValidator::new(SentinelVerifier);
    let mut rng = StdRng::seed_from_u64(7);

    let mut combinations = 0usize;
    for data_level in [0u32, 2] {
        for tag_case in [TagCase::Absent, TagCase::Level(1), TagCase::Level(3)] {
            for keyloc in [KeyLocCase::Match, KeyLocCase::Mismatch] {
                for prob in [0, MAX_PROB] {
                    for cached in [false, true] {
                        for sig_valid in [false, true] {
                            combinations += 1;

                            let mut data = fixtures::protected_data("/videos/intro", data_level);
                            let mut interest = fixtures::interest("/videos/intro");
                            interest.auth_validity_prob = prob;

                            let mut positive = AuthCache::new(0.01, 64);
                            if let TagCase::Level(level) = tag_case {
                                let tag = build_tag(level, keyloc, sig_valid);
                                if cached {
                                    positive.insert(&tag);
                                }
                                interest.auth_tag = Some(tag);
                            }

                            let decision = validator.evaluate(
                                &interest,
                                &mut data,
                                &mut positive,
                                &mut rng,
                            );
                            let want = expected(
                                data_level, tag_case, keyloc, prob, cached, sig_valid,
                            );
                            assert_eq!(
                                decision, want,
                                "combo: data_level={data_level} tag={tag_case:?} \
                                 keyloc={keyloc:?} prob={prob} cached={cached} \
                                 sig_valid={sig_valid}"
                            );
                        }
                    }
                }
            }
        }
    }
    assert_eq!(combinations, 2 * 3 * 2 * 2 * 2 * 2);
}

#[test]
fn hint_marks_response_no_recache() {
    let validator = AccessValidator::new(SentinelVerifier);
    let mut rng = StdRng::seed_from_u64(1);
    let mut positive = AuthCache::new(0.01, 64);

    // With a hint, the response is marked before any terminal is reached,
    // even a denial.
    let mut data = fixtures::protected_data("/videos/intro", 2);
    let tag = build_tag(3, KeyLocCase::Match, false);
    let mut interest = fixtures::interest("/videos/intro").with_tag(tag);
    interest.auth_validity_prob = 1;
    let _ = validator.evaluate(&interest, &mut data, &mut positive, &mut rng);
    assert!(data.no_recache);

    // Without a hint the marker stays clear.
    let mut data = fixtures::protected_data("/videos/intro", 2);
    let tag = build_tag(3, KeyLocCase::Match, true);
    let interest = fixtures::interest("/videos/intro").with_tag(tag);
    let _ = validator.evaluate(&interest, &mut data, &mut positive, &mut rng);
    assert!(!data.no_recache);
}

#[test]
fn signature_success_populates_positive_cache() {
    let validator = AccessValidator::new(SentinelVerifier);
    let mut rng = StdRng::seed_from_u64(2);
    let mut positive = AuthCache::new(0.01, 64);

    let tag = build_tag(2, KeyLocCase::Match, true);
    let mut data = fixtures::protected_data("/videos/intro", 2);
    let interest = fixtures::interest("/videos/intro").with_tag(tag.clone());

    let decision = validator.evaluate(&interest, &mut data, &mut positive, &mut rng);
    assert_eq!(
        decision,
        Decision::Satisfied {
            via: AcceptPath::SignatureCheck
        }
    );
    assert!(positive.contains(&tag));
}

#[test]
fn bad_signature_does_not_populate_cache() {
    let validator = AccessValidator::new(SentinelVerifier);
    let mut rng = StdRng::seed_from_u64(3);
    let mut positive = AuthCache::new(0.01, 64);

    let tag = build_tag(2, KeyLocCase::Match, false);
    let mut data = fixtures::protected_data("/videos/intro", 2);
    let interest = fixtures::interest("/videos/intro").with_tag(tag.clone());

    let decision = validator.evaluate(&interest, &mut data, &mut positive, &mut rng);
    assert_eq!(
        decision,
        Decision::Denied {
            reason: DenyReason::BadSignature
        }
    );
    assert!(!positive.contains(&tag));
}

#[test]
fn cache_hit_short_circuits_signature_check() {
    // A tag with a bad signature but resident in the positive cache is
    // accepted whenever the hint is non-zero and the draw does not land
    // first; it must never be denied for its signature.
    let validator = AccessValidator::new(SentinelVerifier);
    let mut positive = AuthCache::new(0.01, 64);
    let tag = build_tag(2, KeyLocCase::Match, false);
    positive.insert(&tag);

    let mut cached_accepts = 0usize;
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut data = fixtures::protected_data("/videos/intro", 2);
        let mut interest = fixtures::interest("/videos/intro").with_tag(tag.clone());
        interest.auth_validity_prob = 1;

        let decision = validator.evaluate(&interest, &mut data, &mut positive, &mut rng);
        match decision {
            Decision::Satisfied {
                via: AcceptPath::CachedTrust,
            } => cached_accepts += 1,
            Decision::Satisfied {
                via: AcceptPath::ProbabilisticTrust,
            } => {}
            other => panic!("unexpected decision {other:?}"),
        }
    }
    // With prob = 1/10000 the draw essentially never lands.
    assert!(cached_accepts >= 190, "cached accepts: {cached_accepts}");
}

#[test]
fn max_prob_accepts_without_cache_or_signature() {
    let validator = AccessValidator::new(SentinelVerifier);
    let mut rng = StdRng::seed_from_u64(4);
    let mut positive = AuthCache::new(0.01, 64);

    // Invalid signature, empty cache: only the hint can accept this.
    let tag = build_tag(2, KeyLocCase::Match, false);
    let mut data = fixtures::protected_data("/videos/intro", 2);
    let mut interest = fixtures::interest("/videos/intro").with_tag(tag);
    interest.auth_validity_prob = MAX_PROB;

    let decision = validator.evaluate(&interest, &mut data, &mut positive, &mut rng);
    assert_eq!(
        decision,
        Decision::Satisfied {
            via: AcceptPath::ProbabilisticTrust
        }
    );
}
