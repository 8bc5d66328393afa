//! Builders for common protocol values.

use chrono::{DateTime, Duration, Utc};

use ncap_core::{
    AuthTag, ContentKind, Data, Interest, KeyLocator, Name, RouteTracker, Signature,
    SignatureInfo, ValidityPeriod, SENTINEL_VALID_BYTE,
};

/// The fixture producer's prefix.
///
/// # Panics
/// Never: the literal is canonical.
#[must_use]
pub fn prefix() -> Name {
    Name::parse("/videos").expect("static name is canonical")
}

/// The fixture producer's key locator.
///
/// # Panics
/// Never: the literal is canonical.
#[must_use]
pub fn producer_locator() -> KeyLocator {
    KeyLocator(Name::parse("/producers/video-server").expect("static name is canonical"))
}

/// The fixture consumer's key locator.
///
/// # Panics
/// Never: the literal is canonical.
#[must_use]
pub fn consumer_locator() -> KeyLocator {
    KeyLocator(Name::parse("/consumers/alice").expect("static name is canonical"))
}

/// A sentinel-valid signature from the fixture producer, with no validity
/// window (never expires).
#[must_use]
pub fn valid_signature() -> Signature {
    Signature {
        info: SignatureInfo {
            key_locator: Some(producer_locator()),
            validity: None,
        },
        value: vec![SENTINEL_VALID_BYTE],
    }
}

/// A sentinel-invalid signature (first byte zero) from the fixture
/// producer.
#[must_use]
pub fn invalid_signature() -> Signature {
    Signature {
        value: vec![0x00],
        ..valid_signature()
    }
}

/// A tag under the fixture prefix with the given level and route binding;
/// never expires.
#[must_use]
pub fn tag(access_level: u32, route_hash: u64) -> AuthTag {
    AuthTag::new(
        prefix(),
        access_level,
        route_hash,
        consumer_locator(),
        valid_signature(),
    )
}

/// A tag valid for one day around `now`.
#[must_use]
pub fn tag_valid_around(now: DateTime<Utc>, access_level: u32, route_hash: u64) -> AuthTag {
    let mut tag = tag(access_level, route_hash);
    tag.set_validity(Some(ValidityPeriod {
        not_before: now - Duration::seconds(10),
        not_after: now + Duration::days(1),
    }));
    tag
}

/// Protected Data signed by the fixture producer.
///
/// # Panics
/// Never: the literal is canonical.
#[must_use]
pub fn protected_data(name: &str, access_level: u32) -> Data {
    Data {
        name: Name::parse(name).expect("fixture name is canonical"),
        kind: ContentKind::Blob,
        content: b"payload".to_vec(),
        access_level,
        no_recache: false,
        route_tracker: None,
        signature: valid_signature(),
    }
}

/// A plain Interest for `name`.
///
/// # Panics
/// Never: the literal is canonical.
#[must_use]
pub fn interest(name: &str) -> Interest {
    Interest::new(Name::parse(name).expect("fixture name is canonical"))
}

/// An Interest carrying `tag` and a tracker whose entry segment has
/// accumulated `entry_route`.
#[must_use]
pub fn interest_with_tag(name: &str, tag: AuthTag, entry_route: u64) -> Interest {
    let mut tracker = RouteTracker::new();
    tracker.update(entry_route);
    interest(name).with_tag(tag).with_tracker(tracker)
}
