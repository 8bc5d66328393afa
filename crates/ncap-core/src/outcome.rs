//! Protocol-level validation outcomes.
//!
//! Denials are values, not exceptional control transfer: every reason maps
//! deterministically to an explicit rejection response sent back to the
//! requester. Wire decode failures are a distinct class (`WireError`) and
//! must never be folded into this taxonomy — an undecodable packet cannot
//! have its authenticity evaluated at all.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable denial reason codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Protected content requested without an auth tag.
    MissingAuth,
    /// Tag grants a lower level than the content requires.
    InsufficientAccessLevel,
    /// Tag is outside its validity window.
    ExpiredTag,
    /// Tag prefix does not cover the requested name.
    PrefixMismatch,
    /// Tag issuer and response signer key locators differ (or are absent).
    KeyLocatorMismatch,
    /// Tag route hash does not match the accumulated entry route.
    RouteHashMismatch,
    /// Signature-validity predicate rejected the tag.
    BadSignature,
}

impl DenyReason {
    /// Stable dotted reason code for logs and receipts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingAuth => "auth.missing_tag",
            Self::InsufficientAccessLevel => "auth.insufficient_level",
            Self::ExpiredTag => "auth.expired_tag",
            Self::PrefixMismatch => "auth.prefix_mismatch",
            Self::KeyLocatorMismatch => "auth.keyloc_mismatch",
            Self::RouteHashMismatch => "auth.route_mismatch",
            Self::BadSignature => "auth.bad_signature",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a satisfied outcome was reached (observability only; does not alter
/// the response).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptPath {
    /// Public content bypass (`access_level == 0`).
    PublicContent,
    /// Random draw fell below the inbound validity probability.
    ProbabilisticTrust,
    /// Positive-cache hit under a non-zero validity probability.
    CachedTrust,
    /// Full signature-validity predicate evaluation.
    SignatureCheck,
    /// Producer-side authoritative validation (level, expiry, prefix,
    /// signer and route bindings).
    Authoritative,
}

impl AcceptPath {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PublicContent => "accept.public",
            Self::ProbabilisticTrust => "accept.probabilistic",
            Self::CachedTrust => "accept.cached",
            Self::SignatureCheck => "accept.signature",
            Self::Authoritative => "accept.authoritative",
        }
    }
}

impl fmt::Display for AcceptPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal outcome of the per-hop decision procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Decision {
    Satisfied { via: AcceptPath },
    Denied { reason: DenyReason },
}

impl Decision {
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied { .. })
    }

    #[must_use]
    pub const fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::Satisfied { .. } => None,
            Self::Denied { reason } => Some(*reason),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Satisfied { via } => write!(f, "satisfied({via})"),
            Self::Denied { reason } => write!(f, "denied({reason})"),
        }
    }
}
