//! Per-packet path-integrity accumulators.
//!
//! A `RouteTracker` rides on every top-level request and absorbs the link
//! identifier of each hop into one of three independent XOR accumulators,
//! selected by the segment the packet is currently traversing. Route-hash
//! bindings are only meaningful to compare at a trust boundary, once a
//! request has fully traversed one segment.

use ncap_wire::{TlvReader, TlvType, TlvWriter, WireError};

/// The network segment a packet is currently traversing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum NetworkSegment {
    /// Consumer-side access network.
    #[default]
    Entry = 0,
    /// Transit between trust boundaries.
    Internet = 1,
    /// Producer-side network.
    Exit = 2,
}

impl NetworkSegment {
    /// Map a raw wire octet back to a segment.
    #[must_use]
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Entry),
            1 => Some(Self::Internet),
            2 => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Path-integrity accumulator carried on Interest and Data packets.
///
/// A Data returned in response to an Interest must carry the same tracker
/// value the Interest carried, so the accumulated hashes reflect the full
/// round trip as observed by the responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteTracker {
    current: NetworkSegment,
    entry_route: u64,
    internet_route: u64,
    exit_route: u64,
}

impl RouteTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current_network(&self) -> NetworkSegment {
        self.current
    }

    #[must_use]
    pub const fn entry_route(&self) -> u64 {
        self.entry_route
    }

    #[must_use]
    pub const fn internet_route(&self) -> u64 {
        self.internet_route
    }

    #[must_use]
    pub const fn exit_route(&self) -> u64 {
        self.exit_route
    }

    /// Select which accumulator subsequent `update` calls feed.
    pub fn enter(&mut self, segment: NetworkSegment) {
        self.current = segment;
    }

    /// XOR `link_id` into the accumulator selected by the current segment.
    pub fn update(&mut self, link_id: u64) {
        match self.current {
            NetworkSegment::Entry => self.entry_route ^= link_id,
            NetworkSegment::Internet => self.internet_route ^= link_id,
            NetworkSegment::Exit => self.exit_route ^= link_id,
        }
    }

    /// Canonical wire encoding.
    ///
    /// # Errors
    /// Propagates `WireError` from the writer (infallible for fixed-width
    /// fields).
    pub fn write_tlv(&self, writer: &mut TlvWriter) -> Result<(), WireError> {
        writer.nested(TlvType::RouteTracker, |inner| {
            inner.u8(TlvType::CurrentNetwork, self.current as u8)?;
            inner.u64(TlvType::EntryRoute, self.entry_route)?;
            inner.u64(TlvType::InternetRoute, self.internet_route)?;
            inner.u64(TlvType::ExitRoute, self.exit_route)
        })
    }

    /// Encode to a standalone byte vector.
    ///
    /// # Panics
    /// Never: all tracker fields are fixed-width.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = TlvWriter::new();
        self.write_tlv(&mut writer)
            .expect("fixed-width tracker fields always fit");
        writer.into_vec()
    }

    /// Decode a tracker from its canonical wire form.
    ///
    /// # Errors
    /// Returns a `WireError` if the buffer is not a well-formed tracker.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut outer = TlvReader::new(bytes);
        let body = outer.expect(TlvType::RouteTracker)?;
        outer.finish()?;

        let mut reader = TlvReader::new(body);
        let raw_segment = reader.expect_u8(TlvType::CurrentNetwork)?;
        let current = NetworkSegment::from_u8(raw_segment).ok_or(WireError::InvalidValue {
            ty: TlvType::CurrentNetwork,
            got: u64::from(raw_segment),
        })?;
        let entry_route = reader.expect_u64(TlvType::EntryRoute)?;
        let internet_route = reader.expect_u64(TlvType::InternetRoute)?;
        let exit_route = reader.expect_u64(TlvType::ExitRoute)?;
        reader.finish()?;

        Ok(Self {
            current,
            entry_route,
            internet_route,
            exit_route,
        })
    }
}
