//! Approximate-membership caches over encoded tags.
//!
//! An `AuthCache` answers "have I accepted/denied this tag before" without
//! storing tags, using a bloom filter over tag digests. False positives are
//! possible by design; there is deliberately no per-item deletion, which is
//! what forces the self-eviction policy: when the measured false-positive
//! probability exceeds the configured ceiling, the whole cache is cleared,
//! trading a burst of false negatives for restored precision.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tag::AuthTag;

/// Domain separator for bloom hash derivation.
const CACHE_HASH_DOMAIN_SEPARATOR: &[u8] = b"NCAP-CACHE-V1";

/// Bit-array membership structure with BLAKE3-seeded hashing.
///
/// Sized from `(expected_items, target_fpp)` using the standard optima:
/// `m = -n*ln(p) / ln(2)^2`, `k = (m/n) * ln(2)`.
#[derive(Debug, Clone)]
struct BloomFilter {
    bits: Vec<u64>,
    num_hashes: u8,
    num_bits: usize,
}

impl BloomFilter {
    #[allow(clippy::cast_precision_loss)]
    fn sized_for(expected_items: usize, target_fpp: f64) -> Self {
        let ln2 = std::f64::consts::LN_2;
        let n = expected_items.max(1) as f64;
        let p = target_fpp.clamp(0.0001, 0.5);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let m = ((-n * p.ln() / (ln2 * ln2)).ceil() as usize).max(64);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let k = (((m as f64 / n) * ln2).ceil() as u8).clamp(1, 16);

        let num_bits = m.div_ceil(64) * 64;
        Self {
            bits: vec![0u64; num_bits / 64],
            num_hashes: k,
            num_bits,
        }
    }

    fn index(item: &[u8], seed: u8, num_bits: usize) -> usize {
        let mut hasher = blake3::Hasher::new();
        hasher.update(CACHE_HASH_DOMAIN_SEPARATOR);
        hasher.update(&[seed]);
        hasher.update(item);
        let hash = hasher.finalize();
        let b = hash.as_bytes();
        let word = u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]);
        #[allow(clippy::cast_possible_truncation)]
        let index = (word % num_bits as u64) as usize;
        index
    }

    fn insert(&mut self, item: &[u8]) {
        for seed in 0..self.num_hashes {
            let index = Self::index(item, seed, self.num_bits);
            self.bits[index / 64] |= 1u64 << (index % 64);
        }
    }

    fn might_contain(&self, item: &[u8]) -> bool {
        (0..self.num_hashes).all(|seed| {
            let index = Self::index(item, seed, self.num_bits);
            self.bits[index / 64] & (1u64 << (index % 64)) != 0
        })
    }

    fn clear(&mut self) {
        self.bits.fill(0);
    }
}

/// Point-in-time cache observability snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total `insert` calls since the last eviction.
    pub inserted: u64,
    /// Number of self-evictions over the cache lifetime.
    pub evictions: u64,
    /// Measured false-positive probability at snapshot time.
    pub effective_fpp: f64,
}

/// Approximate-membership cache over encoded tags with a false-positive
/// ceiling.
///
/// `insert` is idempotent-safe: inserting a tag twice leaves membership
/// observably unchanged, though each call counts toward saturation.
#[derive(Debug, Clone)]
pub struct AuthCache {
    bloom: BloomFilter,
    target_fpp: f64,
    inserted: u64,
    evictions: u64,
}

impl AuthCache {
    /// Construct an empty cache sized for `expected_items` at `target_fpp`.
    #[must_use]
    pub fn new(target_fpp: f64, expected_items: usize) -> Self {
        Self {
            bloom: BloomFilter::sized_for(expected_items, target_fpp),
            target_fpp,
            inserted: 0,
            evictions: 0,
        }
    }

    /// Record the tag as a member.
    pub fn insert(&mut self, tag: &AuthTag) {
        self.bloom.insert(tag.digest().as_ref());
        self.inserted += 1;
    }

    /// Membership test with saturation-driven self-eviction.
    ///
    /// If the measured false-positive probability exceeds the configured
    /// ceiling, the cache clears itself before answering; previously
    /// inserted tags then read as absent until re-inserted.
    pub fn contains(&mut self, tag: &AuthTag) -> bool {
        if self.effective_fpp() > self.target_fpp {
            debug!(
                inserted = self.inserted,
                fpp = self.effective_fpp(),
                ceiling = self.target_fpp,
                "auth cache self-eviction"
            );
            self.bloom.clear();
            self.inserted = 0;
            self.evictions += 1;
        }
        self.bloom.might_contain(tag.digest().as_ref())
    }

    /// Measured false-positive probability: `(1 - e^(-kn/m))^k` for the
    /// current insertion count.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn effective_fpp(&self) -> f64 {
        let k = f64::from(self.bloom.num_hashes);
        let n = self.inserted as f64;
        let m = self.bloom.num_bits as f64;
        (1.0 - (-k * n / m).exp()).powf(k)
    }

    /// Configured false-positive ceiling.
    #[must_use]
    pub const fn target_fpp(&self) -> f64 {
        self.target_fpp
    }

    /// Number of self-evictions over the cache lifetime.
    #[must_use]
    pub const fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Observability snapshot.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            inserted: self.inserted,
            evictions: self.evictions,
            effective_fpp: self.effective_fpp(),
        }
    }
}
