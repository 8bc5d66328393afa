//! Event sink that records everything it observes.

use std::cell::RefCell;

use ncap_core::{AuthTag, CacheKind, CacheStats, Decision, DenyReason, EventSink, KeyLocator, Name};

/// A recorded protocol event.
#[derive(Debug, Clone)]
pub enum CapturedEvent {
    Decision {
        node: String,
        name: Name,
        decision: Decision,
    },
    CacheEviction {
        node: String,
        kind: CacheKind,
        stats: CacheStats,
    },
    Nack {
        node: String,
        name: Name,
        reason: Option<DenyReason>,
    },
    TagIssued {
        consumer: KeyLocator,
    },
    TagAcquired {
        node: String,
    },
}

/// Sink that appends every event to an inspectable log.
#[derive(Debug, Default)]
pub struct CapturingSink {
    events: RefCell<Vec<CapturedEvent>>,
}

impl CapturingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.borrow().clone()
    }

    /// All recorded decisions, in order.
    #[must_use]
    pub fn decisions(&self) -> Vec<Decision> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                CapturedEvent::Decision { decision, .. } => Some(*decision),
                _ => None,
            })
            .collect()
    }

    /// All recorded Nack reasons, in order.
    #[must_use]
    pub fn nack_reasons(&self) -> Vec<Option<DenyReason>> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                CapturedEvent::Nack { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect()
    }

    /// Number of cache evictions observed.
    #[must_use]
    pub fn eviction_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, CapturedEvent::CacheEviction { .. }))
            .count()
    }

    /// Number of tags issued.
    #[must_use]
    pub fn issued_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, CapturedEvent::TagIssued { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl EventSink for CapturingSink {
    fn on_decision(&self, node: &str, name: &Name, decision: &Decision) {
        self.events.borrow_mut().push(CapturedEvent::Decision {
            node: node.to_owned(),
            name: name.clone(),
            decision: *decision,
        });
    }

    fn on_cache_eviction(&self, node: &str, kind: CacheKind, stats: &CacheStats) {
        self.events.borrow_mut().push(CapturedEvent::CacheEviction {
            node: node.to_owned(),
            kind,
            stats: *stats,
        });
    }

    fn on_nack(&self, node: &str, name: &Name, reason: Option<DenyReason>) {
        self.events.borrow_mut().push(CapturedEvent::Nack {
            node: node.to_owned(),
            name: name.clone(),
            reason,
        });
    }

    fn on_tag_issued(&self, consumer: &KeyLocator, _tag: &AuthTag) {
        self.events.borrow_mut().push(CapturedEvent::TagIssued {
            consumer: consumer.clone(),
        });
    }

    fn on_tag_acquired(&self, node: &str, _tag: &AuthTag) {
        self.events.borrow_mut().push(CapturedEvent::TagAcquired {
            node: node.to_owned(),
        });
    }
}
