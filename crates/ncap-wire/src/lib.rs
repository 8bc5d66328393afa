//! NCAP canonical TLV encoding (type octet, little-endian u16 length, value).
//!
//! This crate is the byte-level foundation for every NCAP wire structure:
//! - `TlvType` registry for the fields carried on Interest/Data envelopes
//! - `TlvWriter` for deterministic encoding (fixed-width LE scalars)
//! - `TlvReader` for strict decoding with a precise error taxonomy
//!
//! Decode failures are a distinct class from authorization failures: a
//! packet that cannot be decoded cannot have its authenticity evaluated at
//! all, so `WireError` never maps onto a protocol denial.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use thiserror::Error;

/// Fixed TLV header length in bytes (type octet + u16 length).
pub const TLV_HEADER_LEN: usize = 3;

/// Maximum value length a single TLV can carry (u16 length field).
pub const MAX_TLV_VALUE_LEN: usize = u16::MAX as usize;

/// TLV type registry (NORMATIVE).
///
/// Values below 0x20 are reserved for the name subsystem; 0x2x for the
/// `AuthTag` structure, 0x3x for `RouteTracker`, 0x4x for loose packet
/// extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TlvType {
    Name = 0x07,
    NameComponent = 0x08,

    AuthTag = 0x20,
    Prefix = 0x21,
    AccessLevel = 0x22,
    RouteHash = 0x23,
    KeyLocator = 0x24,
    SignatureInfo = 0x25,
    SignatureValue = 0x26,
    ValidityPeriod = 0x27,
    ActivationTime = 0x28,
    ExpirationTime = 0x29,

    RouteTracker = 0x30,
    CurrentNetwork = 0x31,
    EntryRoute = 0x32,
    InternetRoute = 0x33,
    ExitRoute = 0x34,

    AuthValidityProbability = 0x40,
    NoReCacheFlag = 0x41,
    Payload = 0x42,
}

impl TlvType {
    /// Map a raw type octet back to a known TLV type.
    #[must_use]
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0x07 => Some(Self::Name),
            0x08 => Some(Self::NameComponent),
            0x20 => Some(Self::AuthTag),
            0x21 => Some(Self::Prefix),
            0x22 => Some(Self::AccessLevel),
            0x23 => Some(Self::RouteHash),
            0x24 => Some(Self::KeyLocator),
            0x25 => Some(Self::SignatureInfo),
            0x26 => Some(Self::SignatureValue),
            0x27 => Some(Self::ValidityPeriod),
            0x28 => Some(Self::ActivationTime),
            0x29 => Some(Self::ExpirationTime),
            0x30 => Some(Self::RouteTracker),
            0x31 => Some(Self::CurrentNetwork),
            0x32 => Some(Self::EntryRoute),
            0x33 => Some(Self::InternetRoute),
            0x34 => Some(Self::ExitRoute),
            0x40 => Some(Self::AuthValidityProbability),
            0x41 => Some(Self::NoReCacheFlag),
            0x42 => Some(Self::Payload),
            _ => None,
        }
    }
}

/// TLV decode/encode errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// The buffer ends before a complete TLV header could be read.
    #[error("truncated TLV header (need {need} bytes, have {have})")]
    Truncated { need: usize, have: usize },

    /// The declared value length runs past the end of the buffer.
    #[error("TLV length mismatch (declared {declared}, remaining {remaining})")]
    LengthMismatch { declared: usize, remaining: usize },

    /// An unknown type octet was encountered where a known one is required.
    #[error("unknown TLV type 0x{got:02x}")]
    UnknownType { got: u8 },

    /// A different TLV type was found than the structure requires.
    #[error("unexpected TLV type (expected {expected:?}, got 0x{got:02x})")]
    UnexpectedType { expected: TlvType, got: u8 },

    /// A fixed-width scalar value had the wrong length.
    #[error("invalid scalar width for {ty:?} (expected {expected} bytes, got {got})")]
    InvalidScalarWidth {
        ty: TlvType,
        expected: usize,
        got: usize,
    },

    /// Bytes remain after the last field of a closed structure.
    #[error("trailing bytes after TLV structure ({remaining} bytes)")]
    TrailingBytes { remaining: usize },

    /// A value decoded structurally but is outside its domain.
    #[error("invalid value for {ty:?} (got {got})")]
    InvalidValue { ty: TlvType, got: u64 },

    /// A value is too large for the u16 length field.
    #[error("TLV value too large ({len} bytes > {max} bytes)")]
    PayloadTooLarge { len: usize, max: usize },
}

/// Deterministic TLV writer.
///
/// Scalars are fixed-width little-endian; nested structures are built with
/// [`TlvWriter::nested`] so their length prefix is always exact.
#[derive(Debug, Default)]
pub struct TlvWriter {
    buf: Vec<u8>,
}

impl TlvWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Consume the writer, returning the encoded bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    /// Append a TLV with an arbitrary byte value.
    ///
    /// # Errors
    /// Returns `WireError::PayloadTooLarge` if the value exceeds the u16
    /// length field.
    pub fn bytes(&mut self, ty: TlvType, value: &[u8]) -> Result<(), WireError> {
        let len = u16::try_from(value.len()).map_err(|_| WireError::PayloadTooLarge {
            len: value.len(),
            max: MAX_TLV_VALUE_LEN,
        })?;
        self.buf.push(ty as u8);
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(value);
        Ok(())
    }

    /// Append a u8 scalar TLV.
    ///
    /// # Errors
    /// Infallible in practice; kept uniform with the other writers.
    pub fn u8(&mut self, ty: TlvType, value: u8) -> Result<(), WireError> {
        self.bytes(ty, &[value])
    }

    /// Append a u32 scalar TLV (little-endian).
    ///
    /// # Errors
    /// Infallible in practice; kept uniform with the other writers.
    pub fn u32(&mut self, ty: TlvType, value: u32) -> Result<(), WireError> {
        self.bytes(ty, &value.to_le_bytes())
    }

    /// Append a u64 scalar TLV (little-endian).
    ///
    /// # Errors
    /// Infallible in practice; kept uniform with the other writers.
    pub fn u64(&mut self, ty: TlvType, value: u64) -> Result<(), WireError> {
        self.bytes(ty, &value.to_le_bytes())
    }

    /// Append a zero-length marker TLV.
    ///
    /// # Errors
    /// Infallible in practice; kept uniform with the other writers.
    pub fn flag(&mut self, ty: TlvType) -> Result<(), WireError> {
        self.bytes(ty, &[])
    }

    /// Append a nested TLV structure built by `f`.
    ///
    /// # Errors
    /// Propagates errors from `f` and from the enclosing length check.
    pub fn nested(
        &mut self,
        ty: TlvType,
        f: impl FnOnce(&mut Self) -> Result<(), WireError>,
    ) -> Result<(), WireError> {
        let mut inner = Self::new();
        f(&mut inner)?;
        self.bytes(ty, &inner.buf)
    }
}

/// Strict TLV reader over a byte slice.
///
/// Readers consume fields in declaration order; optional fields are probed
/// with [`TlvReader::optional`]. [`TlvReader::finish`] enforces that a closed
/// structure has no trailing bytes.
#[derive(Debug)]
pub struct TlvReader<'a> {
    buf: &'a [u8],
}

impl<'a> TlvReader<'a> {
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Peek at the next type octet without consuming it.
    ///
    /// Returns `Ok(None)` at end of input.
    ///
    /// # Errors
    /// Returns `WireError::UnknownType` for an unregistered type octet.
    pub fn peek(&self) -> Result<Option<TlvType>, WireError> {
        let Some(&raw) = self.buf.first() else {
            return Ok(None);
        };
        TlvType::from_u8(raw)
            .map(Some)
            .ok_or(WireError::UnknownType { got: raw })
    }

    fn header(&self) -> Result<(u8, usize), WireError> {
        if self.buf.len() < TLV_HEADER_LEN {
            return Err(WireError::Truncated {
                need: TLV_HEADER_LEN,
                have: self.buf.len(),
            });
        }
        let declared = usize::from(u16::from_le_bytes([self.buf[1], self.buf[2]]));
        let remaining = self.buf.len() - TLV_HEADER_LEN;
        if declared > remaining {
            return Err(WireError::LengthMismatch {
                declared,
                remaining,
            });
        }
        Ok((self.buf[0], declared))
    }

    /// Consume the next TLV, which must have type `ty`, returning its value.
    ///
    /// # Errors
    /// Returns a `WireError` if the buffer is truncated or the type differs.
    pub fn expect(&mut self, ty: TlvType) -> Result<&'a [u8], WireError> {
        let (raw, len) = self.header()?;
        if raw != ty as u8 {
            return Err(WireError::UnexpectedType { expected: ty, got: raw });
        }
        let value = &self.buf[TLV_HEADER_LEN..TLV_HEADER_LEN + len];
        self.buf = &self.buf[TLV_HEADER_LEN + len..];
        Ok(value)
    }

    /// Consume the next TLV if it has type `ty`; leave the reader untouched
    /// otherwise.
    ///
    /// # Errors
    /// Returns a `WireError` if a present header is truncated.
    pub fn optional(&mut self, ty: TlvType) -> Result<Option<&'a [u8]>, WireError> {
        if self.buf.is_empty() || self.buf[0] != ty as u8 {
            return Ok(None);
        }
        self.expect(ty).map(Some)
    }

    /// Consume a u8 scalar TLV of type `ty`.
    ///
    /// # Errors
    /// Returns a `WireError` on truncation, type or width mismatch.
    pub fn expect_u8(&mut self, ty: TlvType) -> Result<u8, WireError> {
        let value = self.expect(ty)?;
        match value {
            [b] => Ok(*b),
            _ => Err(WireError::InvalidScalarWidth {
                ty,
                expected: 1,
                got: value.len(),
            }),
        }
    }

    /// Consume a u32 scalar TLV of type `ty`.
    ///
    /// # Errors
    /// Returns a `WireError` on truncation, type or width mismatch.
    pub fn expect_u32(&mut self, ty: TlvType) -> Result<u32, WireError> {
        let value = self.expect(ty)?;
        let bytes: [u8; 4] = value
            .try_into()
            .map_err(|_| WireError::InvalidScalarWidth {
                ty,
                expected: 4,
                got: value.len(),
            })?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Consume a u64 scalar TLV of type `ty`.
    ///
    /// # Errors
    /// Returns a `WireError` on truncation, type or width mismatch.
    pub fn expect_u64(&mut self, ty: TlvType) -> Result<u64, WireError> {
        let value = self.expect(ty)?;
        let bytes: [u8; 8] = value
            .try_into()
            .map_err(|_| WireError::InvalidScalarWidth {
                ty,
                expected: 8,
                got: value.len(),
            })?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Consume an optional zero-length marker TLV, returning its presence.
    ///
    /// # Errors
    /// Returns `WireError::InvalidScalarWidth` if the marker carries a value.
    pub fn flag(&mut self, ty: TlvType) -> Result<bool, WireError> {
        match self.optional(ty)? {
            None => Ok(false),
            Some([]) => Ok(true),
            Some(value) => Err(WireError::InvalidScalarWidth {
                ty,
                expected: 0,
                got: value.len(),
            }),
        }
    }

    /// Assert that the structure is fully consumed.
    ///
    /// # Errors
    /// Returns `WireError::TrailingBytes` if bytes remain.
    pub const fn finish(&self) -> Result<(), WireError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(WireError::TrailingBytes {
                remaining: self.buf.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_roundtrip() {
        let mut w = TlvWriter::new();
        w.u32(TlvType::AccessLevel, 3).unwrap();
        w.u64(TlvType::RouteHash, 0xdead_beef_cafe).unwrap();
        w.u32(TlvType::AuthValidityProbability, 9_900).unwrap();
        let bytes = w.into_vec();

        let mut r = TlvReader::new(&bytes);
        assert_eq!(r.expect_u32(TlvType::AccessLevel).unwrap(), 3);
        assert_eq!(r.expect_u64(TlvType::RouteHash).unwrap(), 0xdead_beef_cafe);
        assert_eq!(r.expect_u32(TlvType::AuthValidityProbability).unwrap(), 9_900);
        r.finish().unwrap();
    }

    #[test]
    fn nested_roundtrip() {
        let mut w = TlvWriter::new();
        w.nested(TlvType::RouteTracker, |inner| {
            inner.u8(TlvType::CurrentNetwork, 1)?;
            inner.u64(TlvType::EntryRoute, 42)
        })
        .unwrap();
        let bytes = w.into_vec();

        let mut r = TlvReader::new(&bytes);
        let body = r.expect(TlvType::RouteTracker).unwrap();
        r.finish().unwrap();

        let mut inner = TlvReader::new(body);
        assert_eq!(inner.expect_u8(TlvType::CurrentNetwork).unwrap(), 1);
        assert_eq!(inner.expect_u64(TlvType::EntryRoute).unwrap(), 42);
        inner.finish().unwrap();
    }

    #[test]
    fn flag_presence() {
        let mut w = TlvWriter::new();
        w.flag(TlvType::NoReCacheFlag).unwrap();
        let bytes = w.into_vec();

        let mut r = TlvReader::new(&bytes);
        assert!(r.flag(TlvType::NoReCacheFlag).unwrap());
        r.finish().unwrap();

        let mut r = TlvReader::new(&[]);
        assert!(!r.flag(TlvType::NoReCacheFlag).unwrap());
    }

    #[test]
    fn truncated_header() {
        let mut r = TlvReader::new(&[0x22, 0x04]);
        assert_eq!(
            r.expect_u32(TlvType::AccessLevel),
            Err(WireError::Truncated { need: 3, have: 2 })
        );
    }

    #[test]
    fn declared_length_past_end() {
        // AccessLevel claiming 4 bytes with only 2 present.
        let mut r = TlvReader::new(&[0x22, 0x04, 0x00, 0xaa, 0xbb]);
        assert_eq!(
            r.expect(TlvType::AccessLevel),
            Err(WireError::LengthMismatch {
                declared: 4,
                remaining: 2
            })
        );
    }

    #[test]
    fn unexpected_type() {
        let mut w = TlvWriter::new();
        w.u32(TlvType::AccessLevel, 1).unwrap();
        let bytes = w.into_vec();

        let mut r = TlvReader::new(&bytes);
        assert_eq!(
            r.expect_u64(TlvType::RouteHash),
            Err(WireError::UnexpectedType {
                expected: TlvType::RouteHash,
                got: 0x22
            })
        );
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut w = TlvWriter::new();
        w.u8(TlvType::CurrentNetwork, 0).unwrap();
        w.u8(TlvType::CurrentNetwork, 1).unwrap();
        let bytes = w.into_vec();

        let mut r = TlvReader::new(&bytes);
        r.expect_u8(TlvType::CurrentNetwork).unwrap();
        assert_eq!(r.finish(), Err(WireError::TrailingBytes { remaining: 4 }));
    }

    #[test]
    fn unknown_type_peek() {
        let r = TlvReader::new(&[0xff, 0x00, 0x00]);
        assert_eq!(r.peek(), Err(WireError::UnknownType { got: 0xff }));
    }

    #[test]
    fn wrong_scalar_width() {
        let mut w = TlvWriter::new();
        w.bytes(TlvType::AccessLevel, &[1, 2]).unwrap();
        let bytes = w.into_vec();

        let mut r = TlvReader::new(&bytes);
        assert_eq!(
            r.expect_u32(TlvType::AccessLevel),
            Err(WireError::InvalidScalarWidth {
                ty: TlvType::AccessLevel,
                expected: 4,
                got: 2
            })
        );
    }
}
