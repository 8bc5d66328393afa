//! Response shaping hooks.
//!
//! How a terminal outcome is materialized into the outgoing Data differs by
//! node role: ordinary routers mark denials with the denial content type,
//! trust boundaries convert them to explicit negative acknowledgements.

use ncap_core::{ContentKind, Data, DenyReason, Interest, Signature, SignatureInfo};

/// Materializes satisfied/denied outcomes into outgoing Data.
pub trait ResponseShaper {
    /// Shape a satisfied outcome (default: forward the Data unchanged).
    fn satisfy(&self, data: Data) -> Data {
        data
    }

    /// Shape a denied outcome for the given reason.
    fn deny(&self, data: &Data, reason: DenyReason) -> Data;
}

fn rejected(data: &Data, kind: ContentKind, reason: DenyReason) -> Data {
    Data {
        name: data.name.clone(),
        kind,
        // The rejection replaces the payload; the stable reason code is all
        // that is carried.
        content: reason.as_str().as_bytes().to_vec(),
        access_level: data.access_level,
        no_recache: data.no_recache,
        route_tracker: data.route_tracker,
        signature: data.signature.clone(),
    }
}

/// Ordinary-router shaping: denials carry the denial content type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenialShaper;

impl ResponseShaper for DenialShaper {
    fn deny(&self, data: &Data, reason: DenyReason) -> Data {
        rejected(data, ContentKind::AuthDenial, reason)
    }
}

/// Trust-boundary shaping: denials become explicit Nacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NackShaper;

impl ResponseShaper for NackShaper {
    fn deny(&self, data: &Data, reason: DenyReason) -> Data {
        rejected(data, ContentKind::Nack, reason)
    }
}

/// Build a Nack terminating an Interest that never produced Data (the
/// edge's strict route-hash and negative-cache terminals).
#[must_use]
pub fn nack_for_interest(interest: &Interest, reason: DenyReason) -> Data {
    Data {
        name: interest.name.clone(),
        kind: ContentKind::Nack,
        content: reason.as_str().as_bytes().to_vec(),
        access_level: 0,
        no_recache: false,
        route_tracker: interest.route_tracker,
        signature: Signature {
            info: SignatureInfo {
                key_locator: None,
                validity: None,
            },
            value: Vec::new(),
        },
    }
}
