//! NCAP Core - data model and caches for the Named Content Access Protocol.
//!
//! This crate provides the capability-token data model (`AuthTag`), the
//! per-packet path-integrity accumulator (`RouteTracker`), the bloom-backed
//! approximate membership cache (`AuthCache`), the protocol outcome
//! taxonomy, and the capability traits (clock, scheduler, event sink,
//! signature predicate) the node strategies are built against.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod cache;
mod events;
mod name;
mod outcome;
mod packet;
mod route;
mod tag;
mod time;
mod verify;

pub use cache::*;
pub use events::*;
pub use name::*;
pub use outcome::*;
pub use packet::*;
pub use route::*;
pub use tag::*;
pub use time::*;
pub use verify::*;

// Re-export commonly used external types
pub use chrono::{DateTime, Utc};
pub use ncap_wire::{TlvReader, TlvType, TlvWriter, WireError, TLV_HEADER_LEN};
pub use uuid::Uuid;
