//! AuthTag capability tokens.
//!
//! An `AuthTag` is a signed, prefix-scoped, time-bounded token granting an
//! access level, issued by a producer and bound to a specific network path
//! via its route hash. The canonical wire form is cached on first use and
//! invalidated by every mutating setter; equality is defined over the
//! encoded bytes.

use std::cell::OnceCell;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

use ncap_wire::{TlvReader, TlvType, TlvWriter, WireError};

use crate::name::Name;

/// Domain separator for tag digests.
const TAG_DIGEST_DOMAIN_SEPARATOR: &[u8] = b"NCAP-AUTHTAG-V1";

/// Defensive upper bound on an encoded tag.
pub const MAX_AUTH_TAG_WIRE_LEN: usize = 4096;

/// Identifies the holder of a signing/verification key by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct KeyLocator(pub Name);

impl KeyLocator {
    #[must_use]
    pub const fn name(&self) -> &Name {
        &self.0
    }
}

impl fmt::Display for KeyLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signature validity window (absolute activation/expiration instants).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityPeriod {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl ValidityPeriod {
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.not_before && at <= self.not_after
    }

    fn write_tlv(&self, writer: &mut TlvWriter) -> Result<(), WireError> {
        writer.nested(TlvType::ValidityPeriod, |inner| {
            inner.u64(
                TlvType::ActivationTime,
                timestamp_to_millis(self.not_before),
            )?;
            inner.u64(TlvType::ExpirationTime, timestamp_to_millis(self.not_after))
        })
    }

    fn read_tlv(body: &[u8]) -> Result<Self, WireError> {
        let mut reader = TlvReader::new(body);
        let not_before = millis_to_timestamp(reader.expect_u64(TlvType::ActivationTime)?);
        let not_after = millis_to_timestamp(reader.expect_u64(TlvType::ExpirationTime)?);
        reader.finish()?;
        Ok(Self {
            not_before,
            not_after,
        })
    }
}

#[allow(clippy::cast_sign_loss)]
fn timestamp_to_millis(at: DateTime<Utc>) -> u64 {
    at.timestamp_millis().max(0) as u64
}

fn millis_to_timestamp(millis: u64) -> DateTime<Utc> {
    let clamped = i64::try_from(millis).unwrap_or(i64::MAX);
    Utc.timestamp_millis_opt(clamped)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Signature metadata: signer identity plus optional validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    /// Key locator of the signer (absent on unsigned/degenerate packets).
    pub key_locator: Option<KeyLocator>,
    /// Validity window; a signature without one never expires.
    pub validity: Option<ValidityPeriod>,
}

impl SignatureInfo {
    fn write_tlv(&self, writer: &mut TlvWriter) -> Result<(), WireError> {
        writer.nested(TlvType::SignatureInfo, |inner| {
            if let Some(key_locator) = &self.key_locator {
                key_locator.0.write_tlv(inner, TlvType::KeyLocator)?;
            }
            if let Some(validity) = &self.validity {
                validity.write_tlv(inner)?;
            }
            Ok(())
        })
    }

    fn read_tlv(body: &[u8]) -> Result<Self, WireError> {
        let mut reader = TlvReader::new(body);
        let key_locator = reader
            .optional(TlvType::KeyLocator)?
            .map(Name::read_tlv)
            .transpose()?
            .map(KeyLocator);
        let validity = reader
            .optional(TlvType::ValidityPeriod)?
            .map(ValidityPeriod::read_tlv)
            .transpose()?;
        reader.finish()?;
        Ok(Self {
            key_locator,
            validity,
        })
    }
}

/// A signature: metadata plus opaque signature bytes.
///
/// The simulation's validity predicate inspects only the first byte of
/// `value` (see `SentinelVerifier`); everything else treats the bytes as
/// opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub info: SignatureInfo,
    pub value: Vec<u8>,
}

/// 32-byte digest of a tag's canonical encoding (cache key material).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagDigest([u8; 32]);

impl TagDigest {
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for TagDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TagDigest").field(&hex::encode(self.0)).finish()
    }
}

impl AsRef<[u8]> for TagDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Capability token granting `access_level` under `prefix`, bound to a
/// route hash and to the consumer it was issued to.
///
/// Immutable once attached to an Interest; intermediate routers never
/// mutate a tag.
#[derive(Debug, Clone)]
pub struct AuthTag {
    prefix: Name,
    access_level: u32,
    route_hash: u64,
    consumer_locator: KeyLocator,
    signature: Signature,
    // Canonical wire form, computed lazily and dropped by every setter.
    wire: OnceCell<Vec<u8>>,
}

impl AuthTag {
    #[must_use]
    pub fn new(
        prefix: Name,
        access_level: u32,
        route_hash: u64,
        consumer_locator: KeyLocator,
        signature: Signature,
    ) -> Self {
        Self {
            prefix,
            access_level,
            route_hash,
            consumer_locator,
            signature,
            wire: OnceCell::new(),
        }
    }

    #[must_use]
    pub const fn prefix(&self) -> &Name {
        &self.prefix
    }

    #[must_use]
    pub const fn access_level(&self) -> u32 {
        self.access_level
    }

    #[must_use]
    pub const fn route_hash(&self) -> u64 {
        self.route_hash
    }

    #[must_use]
    pub const fn consumer_locator(&self) -> &KeyLocator {
        &self.consumer_locator
    }

    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Key locator of the tag's issuer, if the signature carries one.
    #[must_use]
    pub const fn issuer_locator(&self) -> Option<&KeyLocator> {
        self.signature.info.key_locator.as_ref()
    }

    pub fn set_prefix(&mut self, prefix: Name) {
        self.prefix = prefix;
        self.wire.take();
    }

    pub fn set_access_level(&mut self, access_level: u32) {
        self.access_level = access_level;
        self.wire.take();
    }

    pub fn set_route_hash(&mut self, route_hash: u64) {
        self.route_hash = route_hash;
        self.wire.take();
    }

    pub fn set_consumer_locator(&mut self, consumer_locator: KeyLocator) {
        self.consumer_locator = consumer_locator;
        self.wire.take();
    }

    pub fn set_signature(&mut self, signature: Signature) {
        self.signature = signature;
        self.wire.take();
    }

    pub fn set_validity(&mut self, validity: Option<ValidityPeriod>) {
        self.signature.info.validity = validity;
        self.wire.take();
    }

    /// Whether the tag is outside its validity window at `now`.
    ///
    /// A tag with no parseable validity period never expires.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.signature
            .info
            .validity
            .is_some_and(|validity| !validity.contains(now))
    }

    /// Canonical wire encoding (cached).
    ///
    /// # Panics
    /// Panics if a field exceeds the TLV u16 length field; bounded by
    /// `MAX_AUTH_TAG_WIRE_LEN` for every tag this crate constructs.
    #[must_use]
    pub fn encoded(&self) -> &[u8] {
        self.wire.get_or_init(|| {
            let mut writer = TlvWriter::new();
            self.write_tlv(&mut writer)
                .expect("tag fields fit the TLV length field");
            writer.into_vec()
        })
    }

    /// BLAKE3 digest of the canonical encoding (cache key material).
    #[must_use]
    pub fn digest(&self) -> TagDigest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(TAG_DIGEST_DOMAIN_SEPARATOR);
        hasher.update(self.encoded());
        TagDigest(*hasher.finalize().as_bytes())
    }

    fn write_tlv(&self, writer: &mut TlvWriter) -> Result<(), WireError> {
        writer.nested(TlvType::AuthTag, |inner| {
            self.prefix.write_tlv(inner, TlvType::Prefix)?;
            inner.u32(TlvType::AccessLevel, self.access_level)?;
            inner.u64(TlvType::RouteHash, self.route_hash)?;
            self.consumer_locator
                .0
                .write_tlv(inner, TlvType::KeyLocator)?;
            self.signature.info.write_tlv(inner)?;
            inner.bytes(TlvType::SignatureValue, &self.signature.value)
        })
    }

    /// Decode a tag from its canonical wire form.
    ///
    /// # Errors
    /// Returns a `WireError` if the buffer is not a well-formed tag. Decode
    /// failures must not be treated as authorization failures.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() > MAX_AUTH_TAG_WIRE_LEN {
            return Err(WireError::PayloadTooLarge {
                len: bytes.len(),
                max: MAX_AUTH_TAG_WIRE_LEN,
            });
        }
        let mut outer = TlvReader::new(bytes);
        let body = outer.expect(TlvType::AuthTag)?;
        outer.finish()?;

        let mut reader = TlvReader::new(body);
        let prefix = Name::read_tlv(reader.expect(TlvType::Prefix)?)?;
        let access_level = reader.expect_u32(TlvType::AccessLevel)?;
        let route_hash = reader.expect_u64(TlvType::RouteHash)?;
        let consumer_locator = KeyLocator(Name::read_tlv(reader.expect(TlvType::KeyLocator)?)?);
        let info = SignatureInfo::read_tlv(reader.expect(TlvType::SignatureInfo)?)?;
        let value = reader.expect(TlvType::SignatureValue)?.to_vec();
        reader.finish()?;

        Ok(Self::new(
            prefix,
            access_level,
            route_hash,
            consumer_locator,
            Signature { info, value },
        ))
    }
}

impl PartialEq for AuthTag {
    fn eq(&self, other: &Self) -> bool {
        self.encoded() == other.encoded()
    }
}

impl Eq for AuthTag {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn locator(uri: &str) -> KeyLocator {
        KeyLocator(Name::parse(uri).unwrap())
    }

    fn validity(now: DateTime<Utc>) -> ValidityPeriod {
        ValidityPeriod {
            not_before: now - Duration::seconds(10),
            not_after: now + Duration::days(1),
        }
    }

    fn tag(now: DateTime<Utc>) -> AuthTag {
        AuthTag::new(
            Name::parse("/videos").unwrap(),
            3,
            0xabcd_ef01,
            locator("/consumers/alice"),
            Signature {
                info: SignatureInfo {
                    key_locator: Some(locator("/producers/video-server")),
                    validity: Some(validity(now)),
                },
                value: vec![0x01, 0x22, 0x33],
            },
        )
    }

    #[test]
    fn encode_decode_roundtrip_fieldwise() {
        let now = Utc::now();
        let original = tag(now);
        let decoded = AuthTag::decode(&original.encoded().to_vec()).unwrap();

        assert_eq!(decoded.prefix(), original.prefix());
        assert_eq!(decoded.access_level(), original.access_level());
        assert_eq!(decoded.route_hash(), original.route_hash());
        assert_eq!(decoded.consumer_locator(), original.consumer_locator());
        assert_eq!(decoded.signature(), original.signature());
        assert_eq!(decoded, original);
    }

    #[test]
    fn equality_is_encoded_bytes_equality() {
        let now = Utc::now();
        let a = tag(now);
        let mut b = tag(now);
        assert_eq!(a, b);

        b.set_route_hash(b.route_hash() ^ 1);
        assert_ne!(a, b);
    }

    #[test]
    fn setters_invalidate_cached_encoding() {
        let now = Utc::now();
        let mut tag = tag(now);
        let before = tag.encoded().to_vec();
        let digest_before = tag.digest();

        tag.set_access_level(7);

        assert_ne!(tag.encoded(), &before[..]);
        assert_ne!(tag.digest(), digest_before);

        // Decoding the fresh encoding reflects the mutation.
        let decoded = AuthTag::decode(&tag.encoded().to_vec()).unwrap();
        assert_eq!(decoded.access_level(), 7);
    }

    #[test]
    fn expiration_window_is_inclusive() {
        let now = Utc::now();
        let mut tag = tag(now);
        let window = validity(now);

        assert!(!tag.is_expired(window.not_before));
        assert!(!tag.is_expired(now));
        assert!(!tag.is_expired(window.not_after));
        assert!(tag.is_expired(window.not_before - Duration::milliseconds(1)));
        assert!(tag.is_expired(window.not_after + Duration::milliseconds(1)));

        // Without a validity period the tag never expires.
        tag.set_validity(None);
        assert!(!tag.is_expired(now + Duration::days(10_000)));
    }

    #[test]
    fn missing_validity_survives_roundtrip() {
        let now = Utc::now();
        let mut tag = tag(now);
        tag.set_validity(None);

        let decoded = AuthTag::decode(&tag.encoded().to_vec()).unwrap();
        assert!(decoded.signature().info.validity.is_none());
        assert!(!decoded.is_expired(now + Duration::days(365)));
    }

    #[test]
    fn oversized_buffer_rejected() {
        let bytes = vec![0u8; MAX_AUTH_TAG_WIRE_LEN + 1];
        assert!(matches!(
            AuthTag::decode(&bytes),
            Err(WireError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn digest_is_stable_and_domain_separated() {
        let now = Utc::now();
        let tag = tag(now);
        assert_eq!(tag.digest(), tag.digest());

        // Digest differs from a plain hash of the encoding.
        let plain = blake3::hash(tag.encoded());
        assert_ne!(tag.digest().as_bytes(), plain.as_bytes());
    }
}
