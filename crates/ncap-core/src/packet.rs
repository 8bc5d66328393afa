//! Interest/Data packet extensions.
//!
//! The transport envelope (framing, forwarding, faces) is external; these
//! types model the fields the access-control core reads and writes on each
//! packet. The `AuthTag` and `RouteTracker` payloads have canonical TLV
//! forms; the remaining extensions ride the envelope directly.

use uuid::Uuid;

use ncap_wire::{TlvReader, TlvType, TlvWriter, WireError};

use crate::name::Name;
use crate::route::RouteTracker;
use crate::tag::{AuthTag, KeyLocator, Signature};

/// Fixed-point scale for `AuthValidityProbability`: a hint of `MAX_PROB`
/// means the sender is certain the tag is valid.
pub const MAX_PROB: u32 = 10_000;

/// Content request (or auth request) flowing consumer → producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interest {
    pub name: Name,
    /// Per-request nonce; deaggregated requesters are distinguished by it.
    pub nonce: Uuid,
    /// Capability token attached by the consumer (absent on public fetches
    /// and auth requests).
    pub auth_tag: Option<AuthTag>,
    /// Opaque request metadata (auth-request parameters).
    pub payload: Option<Vec<u8>>,
    /// Trust hint set by an upstream boundary; 0 means "no information".
    /// Outside the signed portion.
    pub auth_validity_prob: u32,
    /// Path-integrity accumulator, updated by every forwarding hop.
    pub route_tracker: Option<RouteTracker>,
}

impl Interest {
    #[must_use]
    pub fn new(name: Name) -> Self {
        Self {
            name,
            nonce: Uuid::new_v4(),
            auth_tag: None,
            payload: None,
            auth_validity_prob: 0,
            route_tracker: None,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: AuthTag) -> Self {
        self.auth_tag = Some(tag);
        self
    }

    #[must_use]
    pub fn with_tracker(mut self, tracker: RouteTracker) -> Self {
        self.route_tracker = Some(tracker);
        self
    }

    /// Entry-segment route hash accumulated so far (0 when no tracker is
    /// attached).
    #[must_use]
    pub fn entry_route(&self) -> u64 {
        self.route_tracker
            .as_ref()
            .map_or(0, RouteTracker::entry_route)
    }
}

/// Discriminates what a Data packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Ordinary content payload.
    Blob,
    /// Response to an auth request: content is an encoded `AuthTag`.
    AuthGrant,
    /// Authorization denial; content is empty, name is the denied request's.
    AuthDenial,
    /// Explicit negative acknowledgement from a trust boundary.
    Nack,
}

/// Response flowing producer → consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    pub name: Name,
    pub kind: ContentKind,
    pub content: Vec<u8>,
    /// Protection tier of the carried content (0 = public). Inside the
    /// signed portion.
    pub access_level: u32,
    /// Suppresses downstream positive caching of a probabilistically
    /// accepted tag. Zero-length marker, outside the signed portion.
    pub no_recache: bool,
    /// Copied from the Interest by the responder.
    pub route_tracker: Option<RouteTracker>,
    pub signature: Signature,
}

impl Data {
    /// Key locator of the response signer, if present.
    #[must_use]
    pub const fn key_locator(&self) -> Option<&KeyLocator> {
        self.signature.info.key_locator.as_ref()
    }
}

/// Auth-request metadata carried in an Interest payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    /// Key locator of the requesting consumer.
    pub consumer_locator: KeyLocator,
    /// Access level being requested.
    pub access_level: u32,
}

impl AuthRequest {
    /// Encode as an Interest payload.
    ///
    /// # Errors
    /// Returns a `WireError` if the locator exceeds the TLV length field.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut writer = TlvWriter::new();
        writer.nested(TlvType::Payload, |inner| {
            self.consumer_locator
                .0
                .write_tlv(inner, TlvType::KeyLocator)?;
            inner.u32(TlvType::AccessLevel, self.access_level)
        })?;
        Ok(writer.into_vec())
    }

    /// Decode from an Interest payload.
    ///
    /// # Errors
    /// Returns a `WireError` if the payload is not a well-formed auth
    /// request.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut outer = TlvReader::new(bytes);
        let body = outer.expect(TlvType::Payload)?;
        outer.finish()?;

        let mut reader = TlvReader::new(body);
        let consumer_locator = KeyLocator(Name::read_tlv(reader.expect(TlvType::KeyLocator)?)?);
        let access_level = reader.expect_u32(TlvType::AccessLevel)?;
        reader.finish()?;

        Ok(Self {
            consumer_locator,
            access_level,
        })
    }
}
