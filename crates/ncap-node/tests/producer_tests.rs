//! Producer behavior: authoritative validation and tag issuance.

use std::rc::Rc;
use std::time::Duration;

use ncap_core::{
    AuthRequest, AuthTag, Clock, ContentKind, DenyReason, Interest, KeyLocator, Name,
    RouteTracker,
};
use ncap_node::{Packet, Producer, ProducerConfig};
use ncap_testkit::{fixtures, CapturingSink, CollectingFace, ManualClock};

fn producer(clock: Rc<ManualClock>, sink: Rc<CapturingSink>) -> Producer {
    let config = ProducerConfig::new(fixtures::prefix(), fixtures::producer_locator());
    let mut producer = Producer::new(config, clock, sink).unwrap();
    producer.publish(
        Name::parse("/videos/intro").unwrap(),
        b"payload".to_vec(),
        2,
    );
    producer.publish(Name::parse("/videos/trailer").unwrap(), b"teaser".to_vec(), 0);
    producer
}

fn issued_tag(producer: &mut Producer, route: u64, access_level: u32) -> AuthTag {
    let mut face = CollectingFace::new();
    let mut interest = Interest::new(producer.auth_name().clone());
    interest.payload = Some(
        AuthRequest {
            consumer_locator: fixtures::consumer_locator(),
            access_level,
        }
        .encode()
        .unwrap(),
    );
    let mut tracker = RouteTracker::new();
    tracker.update(route);
    interest.route_tracker = Some(tracker);

    producer.on_interest(&interest, &mut face).unwrap();
    let grant = face.only_data();
    assert_eq!(grant.kind, ContentKind::AuthGrant);
    AuthTag::decode(&grant.content).unwrap()
}

fn content_request(tag: AuthTag, route: u64) -> Interest {
    let mut tracker = RouteTracker::new();
    tracker.update(route);
    Interest::new(Name::parse("/videos/intro").unwrap())
        .with_tag(tag)
        .with_tracker(tracker)
}

// ─────────────────────────────────────────────────────────────────────────────
// Issuance
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn issues_tag_bound_to_route_and_level() {
    let clock = Rc::new(ManualClock::new());
    let sink = Rc::new(CapturingSink::new());
    let mut producer = producer(Rc::clone(&clock), Rc::clone(&sink));

    let tag = issued_tag(&mut producer, 42, 3);

    assert_eq!(tag.access_level(), 3);
    assert_eq!(tag.route_hash(), 42);
    assert_eq!(tag.prefix(), &fixtures::prefix());
    assert_eq!(tag.consumer_locator(), &fixtures::consumer_locator());
    assert_eq!(tag.issuer_locator(), Some(&fixtures::producer_locator()));
    assert_eq!(sink.issued_count(), 1);

    // Activation slightly in the past, expiration one day out.
    let now = clock.now();
    let validity = tag.signature().info.validity.unwrap();
    assert!(validity.not_before < now);
    assert_eq!(validity.not_after, now + chrono::Duration::days(1));
    assert!(!tag.is_expired(now));
}

#[test]
fn auth_request_without_payload_is_a_decode_error() {
    let clock = Rc::new(ManualClock::new());
    let sink = Rc::new(CapturingSink::new());
    let mut producer = producer(clock, sink);
    let mut face = CollectingFace::new();

    let interest = Interest::new(producer.auth_name().clone());
    let result = producer.on_interest(&interest, &mut face);

    assert!(result.is_err(), "malformed requests are decode errors, not denials");
    assert!(face.sent.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Content validation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn sufficient_tag_releases_protected_content() {
    let clock = Rc::new(ManualClock::new());
    let sink = Rc::new(CapturingSink::new());
    let mut producer = producer(clock, sink);

    // Tag level 3 against target level 2, everything else matching.
    let tag = issued_tag(&mut producer, 5, 3);
    let mut face = CollectingFace::new();
    producer
        .on_interest(&content_request(tag, 5), &mut face)
        .unwrap();

    let data = face.only_data();
    assert_eq!(data.kind, ContentKind::Blob);
    assert_eq!(data.content, b"payload");
    assert_eq!(data.access_level, 2);
}

#[test]
fn insufficient_tag_is_denied() {
    let clock = Rc::new(ManualClock::new());
    let sink = Rc::new(CapturingSink::new());
    let mut producer = producer(clock, sink);

    let tag = issued_tag(&mut producer, 5, 1);
    let mut face = CollectingFace::new();
    producer
        .on_interest(&content_request(tag, 5), &mut face)
        .unwrap();

    let data = face.only_data();
    assert_eq!(data.kind, ContentKind::AuthDenial);
    assert_eq!(data.name, Name::parse("/videos/intro").unwrap());
    assert_eq!(
        data.content,
        DenyReason::InsufficientAccessLevel.as_str().as_bytes()
    );
}

#[test]
fn missing_tag_is_denied_for_protected_content() {
    let clock = Rc::new(ManualClock::new());
    let sink = Rc::new(CapturingSink::new());
    let mut producer = producer(clock, sink);
    let mut face = CollectingFace::new();

    producer
        .on_interest(&Interest::new(Name::parse("/videos/intro").unwrap()), &mut face)
        .unwrap();

    let data = face.only_data();
    assert_eq!(data.kind, ContentKind::AuthDenial);
    assert_eq!(data.content, DenyReason::MissingAuth.as_str().as_bytes());
}

#[test]
fn public_content_served_without_tag() {
    let clock = Rc::new(ManualClock::new());
    let sink = Rc::new(CapturingSink::new());
    let mut producer = producer(clock, sink);
    let mut face = CollectingFace::new();

    producer
        .on_interest(
            &Interest::new(Name::parse("/videos/trailer").unwrap()),
            &mut face,
        )
        .unwrap();

    let data = face.only_data();
    assert_eq!(data.kind, ContentKind::Blob);
    assert_eq!(data.content, b"teaser");
}

#[test]
fn expired_tag_is_denied() {
    let clock = Rc::new(ManualClock::new());
    let sink = Rc::new(CapturingSink::new());
    let mut producer = producer(Rc::clone(&clock), sink);

    let tag = issued_tag(&mut producer, 5, 3);
    clock.advance(Duration::from_secs(2 * 24 * 60 * 60));

    let mut face = CollectingFace::new();
    producer
        .on_interest(&content_request(tag, 5), &mut face)
        .unwrap();

    assert_eq!(
        face.only_data().content,
        DenyReason::ExpiredTag.as_str().as_bytes()
    );
}

#[test]
fn out_of_scope_prefix_is_denied() {
    let clock = Rc::new(ManualClock::new());
    let sink = Rc::new(CapturingSink::new());
    let mut producer = producer(clock, sink);

    let mut tag = issued_tag(&mut producer, 5, 3);
    tag.set_prefix(Name::parse("/elsewhere").unwrap());

    let mut face = CollectingFace::new();
    producer
        .on_interest(&content_request(tag, 5), &mut face)
        .unwrap();

    assert_eq!(
        face.only_data().content,
        DenyReason::PrefixMismatch.as_str().as_bytes()
    );
}

#[test]
fn foreign_issuer_is_denied() {
    let clock = Rc::new(ManualClock::new());
    let sink = Rc::new(CapturingSink::new());
    let mut producer = producer(clock, sink);

    let mut tag = issued_tag(&mut producer, 5, 3);
    let mut signature = tag.signature().clone();
    signature.info.key_locator = Some(KeyLocator(Name::parse("/producers/other").unwrap()));
    tag.set_signature(signature);

    let mut face = CollectingFace::new();
    producer
        .on_interest(&content_request(tag, 5), &mut face)
        .unwrap();

    assert_eq!(
        face.only_data().content,
        DenyReason::KeyLocatorMismatch.as_str().as_bytes()
    );
}

#[test]
fn wrong_route_binding_is_denied() {
    let clock = Rc::new(ManualClock::new());
    let sink = Rc::new(CapturingSink::new());
    let mut producer = producer(clock, sink);

    let tag = issued_tag(&mut producer, 5, 3);
    let mut face = CollectingFace::new();
    // Request arrives over a different path than the tag was bound to.
    producer
        .on_interest(&content_request(tag, 9), &mut face)
        .unwrap();

    assert_eq!(
        face.only_data().content,
        DenyReason::RouteHashMismatch.as_str().as_bytes()
    );
}

#[test]
fn response_carries_the_interests_tracker() {
    let clock = Rc::new(ManualClock::new());
    let sink = Rc::new(CapturingSink::new());
    let mut producer = producer(clock, sink);

    let tag = issued_tag(&mut producer, 5, 3);
    let interest = content_request(tag, 5);
    let mut face = CollectingFace::new();
    producer.on_interest(&interest, &mut face).unwrap();

    assert_eq!(face.only_data().route_tracker, interest.route_tracker);
}

#[test]
fn accepted_tag_is_cached_for_repeat_requests() {
    let clock = Rc::new(ManualClock::new());
    let sink = Rc::new(CapturingSink::new());
    let mut producer = producer(clock, sink);

    let tag = issued_tag(&mut producer, 5, 3);

    let mut face = CollectingFace::new();
    producer
        .on_interest(&content_request(tag.clone(), 5), &mut face)
        .unwrap();
    assert_eq!(face.only_data().kind, ContentKind::Blob);

    // Second request with the same accepted tag is served again (cache
    // fast path), and the request-dependent checks still apply: a lower
    // target would still be served, a different name under the prefix too.
    face.clear();
    producer
        .on_interest(&content_request(tag, 5), &mut face)
        .unwrap();
    assert_eq!(face.only_data().kind, ContentKind::Blob);
}
