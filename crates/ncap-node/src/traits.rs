//! Collaborator interfaces supplied by the embedding.
//!
//! The forwarding plane (faces, content store, pending-interest table) is
//! out of scope for this core; strategies reach it only through these
//! seams, so tests can substitute in-memory implementations.

use ncap_core::{Data, Interest, Name};

/// A packet crossing a face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Interest(Interest),
    Data(Data),
}

impl Packet {
    #[must_use]
    pub const fn name(&self) -> &Name {
        match self {
            Self::Interest(interest) => &interest.name,
            Self::Data(data) => &data.name,
        }
    }
}

/// Transport seam: a face packets are sent out of.
pub trait Face {
    fn send(&mut self, packet: Packet);
}

/// Forwarding-plane content store.
pub trait ContentStore {
    /// Look up cached Data satisfying the Interest (exact-name match).
    fn find(&self, interest: &Interest) -> Option<Data>;
}

/// A downstream request waiting on an upstream response.
#[derive(Debug, Clone)]
pub struct PendingInterest {
    pub interest: Interest,
}

/// Deaggregation seam: pending downstream requests merged en route.
pub trait PendingRequests {
    /// Remove and return every pending request related to `name`.
    fn drain_related(&mut self, name: &Name) -> Vec<PendingInterest>;
}
