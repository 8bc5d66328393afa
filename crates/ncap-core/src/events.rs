//! Observer interface for protocol events.
//!
//! Strategies and applications receive an `EventSink` at construction; the
//! core holds no ambient global state, and tests substitute a capturing
//! sink. All methods default to no-ops so sinks implement only what they
//! observe.

use crate::cache::CacheStats;
use crate::name::Name;
use crate::outcome::{Decision, DenyReason};
use crate::tag::{AuthTag, KeyLocator};

/// Which of a node's two caches an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Tags believed valid.
    Positive,
    /// Tags believed invalid/denied.
    Negative,
}

/// Sink for protocol-level events.
pub trait EventSink {
    /// A per-hop decision procedure reached a terminal outcome.
    fn on_decision(&self, node: &str, name: &Name, decision: &Decision) {
        let _ = (node, name, decision);
    }

    /// A cache cleared itself after exceeding its false-positive ceiling.
    fn on_cache_eviction(&self, node: &str, kind: CacheKind, stats: &CacheStats) {
        let _ = (node, kind, stats);
    }

    /// A trust boundary emitted an explicit negative acknowledgement.
    ///
    /// `reason` is `None` when the boundary is relaying an upstream denial
    /// whose cause it does not know.
    fn on_nack(&self, node: &str, name: &Name, reason: Option<DenyReason>) {
        let _ = (node, name, reason);
    }

    /// A producer issued a fresh tag.
    fn on_tag_issued(&self, consumer: &KeyLocator, tag: &AuthTag) {
        let _ = (consumer, tag);
    }

    /// A consumer's acquisition state machine stored a granted tag.
    fn on_tag_acquired(&self, node: &str, tag: &AuthTag) {
        let _ = (node, tag);
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {}
