//! Producer: authoritative validation and tag issuance.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ncap_core::{
    AcceptPath, AuthCache, AuthRequest, AuthTag, Clock, ContentKind, Data, Decision, DenyReason,
    EventSink, Interest, KeyLocator, Name, Signature, SignatureInfo, ValidityPeriod, WireError,
    SENTINEL_VALID_BYTE,
};

use crate::traits::{Face, Packet};
use crate::util::{duration_millis, to_chrono};

/// Producer configuration, supplied by the embedding as plain data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Node label for events and logs.
    pub node: String,
    /// Prefix this producer serves (and scopes issued tags to).
    pub prefix: Name,
    /// Name component under `prefix` that designates auth requests.
    pub auth_component: String,
    /// This producer's signing key locator.
    pub key_locator: KeyLocator,
    /// Issued-tag lifetime (policy constant, not a protocol invariant).
    #[serde(with = "duration_millis")]
    pub tag_validity: Duration,
    /// Activation backdate so a fresh tag is immediately usable despite
    /// clock skew (policy constant).
    #[serde(with = "duration_millis")]
    pub activation_backdate: Duration,
    /// False-positive ceiling for the accepted-tag cache.
    pub cache_target_fpp: f64,
    /// Expected tag population for cache sizing.
    pub cache_expected_items: usize,
}

impl ProducerConfig {
    /// Policy defaults: one-day tags, ten-second backdate.
    #[must_use]
    pub fn new(prefix: Name, key_locator: KeyLocator) -> Self {
        Self {
            node: "producer".into(),
            prefix,
            auth_component: "auth".into(),
            key_locator,
            tag_validity: Duration::from_secs(24 * 60 * 60),
            activation_backdate: Duration::from_secs(10),
            cache_target_fpp: 0.01,
            cache_expected_items: 1024,
        }
    }
}

/// A published content object.
#[derive(Debug, Clone)]
struct ContentEntry {
    content: Vec<u8>,
    access_level: u32,
}

/// Authoritative origin for a prefix: issues tags on request and validates
/// them before releasing protected content.
pub struct Producer {
    config: ProducerConfig,
    auth_name: Name,
    catalog: HashMap<Name, ContentEntry>,
    /// Tags already validated in full; repeat requests skip the checks
    /// fixed at issuance (signer and route bindings). Level, expiry, and
    /// prefix are request-dependent and always re-checked.
    accepted: AuthCache,
    clock: Rc<dyn Clock>,
    sink: Rc<dyn EventSink>,
}

impl Producer {
    /// # Errors
    /// Returns a `NameError` if `auth_component` is not a canonical name
    /// component.
    pub fn new(
        config: ProducerConfig,
        clock: Rc<dyn Clock>,
        sink: Rc<dyn EventSink>,
    ) -> Result<Self, ncap_core::NameError> {
        let auth_name = config.prefix.child(&config.auth_component)?;
        let accepted = AuthCache::new(config.cache_target_fpp, config.cache_expected_items);
        Ok(Self {
            config,
            auth_name,
            catalog: HashMap::new(),
            accepted,
            clock,
            sink,
        })
    }

    /// Publish a content object under this producer's prefix.
    pub fn publish(&mut self, name: Name, content: Vec<u8>, access_level: u32) {
        self.catalog.insert(
            name,
            ContentEntry {
                content,
                access_level,
            },
        );
    }

    /// Handle an incoming Interest (auth request or content request).
    ///
    /// # Errors
    /// Returns a `WireError` when an auth request payload cannot be
    /// decoded — a decode failure, not an authorization failure.
    pub fn on_interest(
        &mut self,
        interest: &Interest,
        face: &mut dyn Face,
    ) -> Result<(), WireError> {
        if interest.name == self.auth_name {
            return self.issue_tag(interest, face);
        }
        self.serve_content(interest, face);
        Ok(())
    }

    /// Auth-request handling is independent of content validation: always
    /// issue a fresh tag bound to the requester's current route hash and
    /// the requested access level.
    fn issue_tag(&mut self, interest: &Interest, face: &mut dyn Face) -> Result<(), WireError> {
        let payload = interest.payload.as_deref().ok_or(WireError::Truncated {
            need: ncap_core::TLV_HEADER_LEN,
            have: 0,
        })?;
        let request = AuthRequest::decode(payload)?;

        let now = self.clock.now();
        let tag = AuthTag::new(
            self.config.prefix.clone(),
            request.access_level,
            interest.entry_route(),
            request.consumer_locator.clone(),
            Signature {
                info: SignatureInfo {
                    key_locator: Some(self.config.key_locator.clone()),
                    validity: Some(ValidityPeriod {
                        not_before: now - to_chrono(self.config.activation_backdate),
                        not_after: now + to_chrono(self.config.tag_validity),
                    }),
                },
                value: vec![SENTINEL_VALID_BYTE],
            },
        );

        info!(
            node = %self.config.node,
            consumer = %request.consumer_locator,
            access_level = request.access_level,
            route_hash = tag.route_hash(),
            "issued auth tag"
        );
        self.sink.on_tag_issued(&request.consumer_locator, &tag);

        face.send(Packet::Data(Data {
            name: interest.name.clone(),
            kind: ContentKind::AuthGrant,
            content: tag.encoded().to_vec(),
            access_level: 0,
            no_recache: false,
            route_tracker: interest.route_tracker,
            signature: self.response_signature(),
        }));
        Ok(())
    }

    fn serve_content(&mut self, interest: &Interest, face: &mut dyn Face) {
        let Some(entry) = self.catalog.get(&interest.name).cloned() else {
            // Nothing published under this name; the pending interest
            // expires upstream.
            return;
        };

        let decision = if entry.access_level == 0 {
            Decision::Satisfied {
                via: AcceptPath::PublicContent,
            }
        } else {
            match self.validate(interest, entry.access_level) {
                Ok(via) => Decision::Satisfied { via },
                Err(reason) => Decision::Denied { reason },
            }
        };

        debug!(
            node = %self.config.node,
            name = %interest.name,
            decision = %decision,
            "content request validated"
        );
        self.sink
            .on_decision(&self.config.node, &interest.name, &decision);

        let response = match decision {
            Decision::Satisfied { .. } => Data {
                name: interest.name.clone(),
                kind: ContentKind::Blob,
                content: entry.content,
                access_level: entry.access_level,
                no_recache: false,
                route_tracker: interest.route_tracker,
                signature: self.response_signature(),
            },
            // The rejection carries the would-be response's name in place
            // of the payload.
            Decision::Denied { reason } => Data {
                name: interest.name.clone(),
                kind: ContentKind::AuthDenial,
                content: reason.as_str().as_bytes().to_vec(),
                access_level: entry.access_level,
                no_recache: false,
                route_tracker: interest.route_tracker,
                signature: self.response_signature(),
            },
        };
        face.send(Packet::Data(response));
    }

    /// The authoritative check, in order: tag present, level sufficient,
    /// not expired, prefix scope, signer binding, route binding.
    fn validate(&mut self, interest: &Interest, required: u32) -> Result<AcceptPath, DenyReason> {
        let Some(tag) = &interest.auth_tag else {
            return Err(DenyReason::MissingAuth);
        };
        if required > tag.access_level() {
            return Err(DenyReason::InsufficientAccessLevel);
        }
        let now = self.clock.now();
        if tag.is_expired(now) {
            return Err(DenyReason::ExpiredTag);
        }
        if !tag.prefix().is_prefix_of(&interest.name) {
            return Err(DenyReason::PrefixMismatch);
        }

        if self.accepted.contains(tag) {
            return Ok(AcceptPath::CachedTrust);
        }

        if tag.issuer_locator() != Some(&self.config.key_locator) {
            return Err(DenyReason::KeyLocatorMismatch);
        }
        if tag.route_hash() != interest.entry_route() {
            return Err(DenyReason::RouteHashMismatch);
        }

        self.accepted.insert(tag);
        Ok(AcceptPath::Authoritative)
    }

    fn response_signature(&self) -> Signature {
        Signature {
            info: SignatureInfo {
                key_locator: Some(self.config.key_locator.clone()),
                validity: None,
            },
            value: vec![SENTINEL_VALID_BYTE],
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Name auth requests are addressed to.
    #[must_use]
    pub const fn auth_name(&self) -> &Name {
        &self.auth_name
    }
}
