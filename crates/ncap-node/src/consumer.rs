//! Consumer tag acquisition.
//!
//! State machine over `{no-tag, pending, ready, expired}`: the first
//! content-send attempt without a live tag issues an auth request and arms
//! a timeout; content Interests are held while pending and flushed when a
//! grant arrives; a stored tag that expires re-enters acquisition on the
//! next send attempt.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ncap_core::{
    AuthRequest, AuthTag, Clock, ContentKind, Data, EventSink, Interest, KeyLocator, Name,
    NameError, RouteTracker, Scheduler, Signature, TimerHandle, ValidityPeriod, WireError,
};

use crate::traits::{Face, Packet};
use crate::util::duration_millis;

/// Injected fault modes for exercising every denial path without a
/// distinct consumer type per combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultMode {
    /// Attach the granted tag unmodified.
    #[default]
    None,
    /// Send protected requests without any tag.
    NoTag,
    /// Zero the first signature byte.
    BadSignature,
    /// Shift the validity window into the past.
    Expired,
    /// Corrupt the route-hash binding.
    BadRoute,
    /// Replace the authorized prefix.
    BadPrefix,
    /// Replace the issuer key locator.
    BadKeyLocator,
}

/// Consumer configuration, supplied by the embedding as plain data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Node label for events and logs.
    pub node: String,
    /// This consumer's key locator (carried in auth requests).
    pub locator: KeyLocator,
    /// Producer prefix tags are requested under.
    pub producer_prefix: Name,
    /// Name component under the prefix that designates auth requests.
    pub auth_component: String,
    /// Access level to request.
    pub access_level: u32,
    /// Auth-request timeout before acquisition may be retried.
    #[serde(with = "duration_millis")]
    pub auth_timeout: Duration,
    /// Fault injection applied to outgoing tags.
    pub fault_mode: FaultMode,
}

impl ConsumerConfig {
    #[must_use]
    pub fn new(locator: KeyLocator, producer_prefix: Name, access_level: u32) -> Self {
        Self {
            node: "consumer".into(),
            locator,
            producer_prefix,
            auth_component: "auth".into(),
            access_level,
            auth_timeout: Duration::from_millis(500),
            fault_mode: FaultMode::None,
        }
    }
}

/// Observable acquisition state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    NoTag,
    Pending,
    Ready,
}

enum TagState {
    NoTag,
    Pending { timer: TimerHandle },
    Ready { tag: AuthTag },
}

struct Shared {
    state: TagState,
    held: VecDeque<Name>,
}

/// Consumer application: acquires tags and attaches the most recently
/// granted one to content requests.
pub struct Consumer {
    config: ConsumerConfig,
    auth_name: Name,
    auth_payload: Vec<u8>,
    shared: Rc<RefCell<Shared>>,
    clock: Rc<dyn Clock>,
    sink: Rc<dyn EventSink>,
}

impl Consumer {
    /// # Errors
    /// Returns a `ConsumerBuildError` if the auth component is not a
    /// canonical name component or the locator does not encode.
    pub fn new(
        config: ConsumerConfig,
        clock: Rc<dyn Clock>,
        sink: Rc<dyn EventSink>,
    ) -> Result<Self, ConsumerBuildError> {
        let auth_name = config.producer_prefix.child(&config.auth_component)?;
        let auth_payload = AuthRequest {
            consumer_locator: config.locator.clone(),
            access_level: config.access_level,
        }
        .encode()?;
        Ok(Self {
            config,
            auth_name,
            auth_payload,
            shared: Rc::new(RefCell::new(Shared {
                state: TagState::NoTag,
                held: VecDeque::new(),
            })),
            clock,
            sink,
        })
    }

    /// Attempt to send a content request.
    ///
    /// With a live tag the Interest goes out immediately; otherwise the
    /// name is held and acquisition is started (or left running).
    pub fn request(
        &mut self,
        name: Name,
        face: &mut dyn Face,
        scheduler: &mut dyn Scheduler,
    ) {
        let now = self.clock.now();
        let live_tag = {
            let mut shared = self.shared.borrow_mut();
            match &shared.state {
                TagState::Ready { tag } => {
                    if tag.is_expired(now) {
                        // ready → expired: unusable; re-enter acquisition.
                        shared.state = TagState::NoTag;
                        None
                    } else {
                        Some(tag.clone())
                    }
                }
                _ => None,
            }
        };

        if let Some(tag) = live_tag {
            self.send_content(name, &tag, face);
            return;
        }

        let start_acquisition = {
            let mut shared = self.shared.borrow_mut();
            shared.held.push_back(name);
            matches!(shared.state, TagState::NoTag)
        };
        if start_acquisition {
            self.begin_acquisition(face, scheduler);
        }
    }

    /// Handle an incoming Data packet.
    ///
    /// # Errors
    /// Returns a `WireError` if an auth grant carries an undecodable tag.
    pub fn on_data(
        &mut self,
        data: &Data,
        face: &mut dyn Face,
        scheduler: &mut dyn Scheduler,
    ) -> Result<(), WireError> {
        if data.name != self.auth_name {
            // Content responses (including denials) are the application's
            // concern; acquisition only tracks the auth exchange.
            return Ok(());
        }

        match data.kind {
            ContentKind::AuthGrant => {
                let tag = AuthTag::decode(&data.content)?;
                debug!(
                    node = %self.config.node,
                    access_level = tag.access_level(),
                    route_hash = tag.route_hash(),
                    "auth tag granted"
                );
                self.sink.on_tag_acquired(&self.config.node, &tag);
                let flush: Vec<Name> = {
                    let mut shared = self.shared.borrow_mut();
                    if let TagState::Pending { timer } = &shared.state {
                        scheduler.cancel(*timer);
                    }
                    shared.state = TagState::Ready { tag: tag.clone() };
                    shared.held.drain(..).collect()
                };
                for name in flush {
                    self.send_content(name, &tag, face);
                }
                Ok(())
            }
            ContentKind::AuthDenial | ContentKind::Nack => {
                let mut shared = self.shared.borrow_mut();
                if let TagState::Pending { timer } = &shared.state {
                    scheduler.cancel(*timer);
                    shared.state = TagState::NoTag;
                }
                Ok(())
            }
            ContentKind::Blob => Ok(()),
        }
    }

    fn begin_acquisition(&self, face: &mut dyn Face, scheduler: &mut dyn Scheduler) {
        let mut interest = Interest::new(self.auth_name.clone());
        interest.payload = Some(self.auth_payload.clone());
        interest.route_tracker = Some(RouteTracker::new());
        face.send(Packet::Interest(interest));

        // On timeout the pending flag clears; the next send attempt
        // retries acquisition.
        let shared = Rc::clone(&self.shared);
        let timer = scheduler.after(
            self.config.auth_timeout,
            Box::new(move || {
                let mut shared = shared.borrow_mut();
                if matches!(shared.state, TagState::Pending { .. }) {
                    shared.state = TagState::NoTag;
                }
            }),
        );
        self.shared.borrow_mut().state = TagState::Pending { timer };
        debug!(node = %self.config.node, "auth acquisition started");
    }

    fn send_content(&self, name: Name, tag: &AuthTag, face: &mut dyn Face) {
        let mut interest = Interest::new(name).with_tracker(RouteTracker::new());
        interest.auth_tag = self.faulted(tag);
        face.send(Packet::Interest(interest));
    }

    /// Apply the configured fault mode to an outgoing tag copy.
    fn faulted(&self, tag: &AuthTag) -> Option<AuthTag> {
        let mut tag = tag.clone();
        match self.config.fault_mode {
            FaultMode::None => {}
            FaultMode::NoTag => return None,
            FaultMode::BadSignature => {
                let mut signature = tag.signature().clone();
                if let Some(first) = signature.value.first_mut() {
                    *first = 0;
                } else {
                    signature.value.push(0);
                }
                tag.set_signature(signature);
            }
            FaultMode::Expired => {
                let now = self.clock.now();
                tag.set_validity(Some(ValidityPeriod {
                    not_before: now - chrono::Duration::hours(2),
                    not_after: now - chrono::Duration::hours(1),
                }));
            }
            FaultMode::BadRoute => {
                tag.set_route_hash(tag.route_hash() ^ 0x5a5a_5a5a);
            }
            FaultMode::BadPrefix => {
                tag.set_prefix(Name::parse("/elsewhere").expect("static name is canonical"));
            }
            FaultMode::BadKeyLocator => {
                let mut signature = tag.signature().clone();
                signature.info.key_locator = Some(KeyLocator(
                    Name::parse("/intruders/mallory").expect("static name is canonical"),
                ));
                tag.set_signature(signature);
            }
        }
        Some(tag)
    }

    /// Current acquisition state (for embedding and tests).
    #[must_use]
    pub fn state(&self) -> AcquisitionState {
        match self.shared.borrow().state {
            TagState::NoTag => AcquisitionState::NoTag,
            TagState::Pending { .. } => AcquisitionState::Pending,
            TagState::Ready { .. } => AcquisitionState::Ready,
        }
    }

    /// The currently stored tag, if any.
    #[must_use]
    pub fn current_tag(&self) -> Option<AuthTag> {
        match &self.shared.borrow().state {
            TagState::Ready { tag } => Some(tag.clone()),
            _ => None,
        }
    }

    /// Number of content requests held while acquisition is pending.
    #[must_use]
    pub fn held_len(&self) -> usize {
        self.shared.borrow().held.len()
    }

    #[must_use]
    pub const fn config(&self) -> &ConsumerConfig {
        &self.config
    }
}

/// Construction failures for `Consumer`.
#[derive(Debug, thiserror::Error)]
pub enum ConsumerBuildError {
    #[error(transparent)]
    Name(#[from] NameError),

    #[error(transparent)]
    Wire(#[from] WireError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_mode_serde_snake_case() {
        let json = serde_json::to_string(&FaultMode::BadKeyLocator).unwrap();
        assert_eq!(json, "\"bad_key_locator\"");
    }
}
