//! Deterministic time control and in-memory collaborators.

use std::cell::Cell;
use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use ncap_core::{Clock, Data, Interest, Name, Scheduler, TimerCallback, TimerHandle};
use ncap_node::{ContentStore, Face, Packet, PendingInterest, PendingRequests};

/// Clock whose "now" only moves when the test advances it.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    /// Start at a fixed, readable epoch.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Cell::new(Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid epoch")),
        }
    }

    #[must_use]
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn advance(&self, delta: Duration) {
        let millis = i64::try_from(delta.as_millis()).unwrap_or(i64::MAX);
        self.now
            .set(self.now.get() + chrono::Duration::milliseconds(millis));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Scheduler that fires callbacks only when the test advances simulated
/// time. Due callbacks fire in (due time, submission order).
#[derive(Default)]
pub struct ManualScheduler {
    now_ms: u64,
    next_id: u64,
    timers: Vec<(u64, TimerHandle, TimerCallback)>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Advance simulated time, firing every timer that becomes due.
    pub fn advance(&mut self, delta: Duration) {
        self.now_ms += u64::try_from(delta.as_millis()).unwrap_or(u64::MAX);
        loop {
            let due = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, (fire_at, _, _))| *fire_at <= self.now_ms)
                .min_by_key(|(index, (fire_at, _, _))| (*fire_at, *index))
                .map(|(index, _)| index);
            let Some(index) = due else { break };
            let (_, _, callback) = self.timers.remove(index);
            callback();
        }
    }
}

impl Scheduler for ManualScheduler {
    fn after(&mut self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let fire_at = self.now_ms + u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.timers.push((fire_at, handle, callback));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.timers.retain(|(_, armed, _)| *armed != handle);
    }
}

/// Face that records every packet sent through it.
#[derive(Debug, Default)]
pub struct CollectingFace {
    pub sent: Vec<Packet>,
}

impl CollectingFace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interests sent so far, in order.
    #[must_use]
    pub fn interests(&self) -> Vec<&Interest> {
        self.sent
            .iter()
            .filter_map(|packet| match packet {
                Packet::Interest(interest) => Some(interest),
                Packet::Data(_) => None,
            })
            .collect()
    }

    /// Data packets sent so far, in order.
    #[must_use]
    pub fn data(&self) -> Vec<&Data> {
        self.sent
            .iter()
            .filter_map(|packet| match packet {
                Packet::Data(data) => Some(data),
                Packet::Interest(_) => None,
            })
            .collect()
    }

    /// The single Data packet this face must have sent.
    ///
    /// # Panics
    /// Panics if the face did not send exactly one Data packet.
    #[must_use]
    pub fn only_data(&self) -> &Data {
        let data = self.data();
        assert_eq!(data.len(), 1, "expected exactly one Data, got {}", data.len());
        data[0]
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl Face for CollectingFace {
    fn send(&mut self, packet: Packet) {
        self.sent.push(packet);
    }
}

/// Exact-name-match content store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    entries: HashMap<Name, Data>,
}

impl MemoryContentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, data: Data) {
        self.entries.insert(data.name.clone(), data);
    }
}

impl ContentStore for MemoryContentStore {
    fn find(&self, interest: &Interest) -> Option<Data> {
        self.entries.get(&interest.name).cloned()
    }
}

/// Pending-request table for deaggregation tests.
#[derive(Debug, Default)]
pub struct MemoryPending {
    entries: Vec<PendingInterest>,
}

impl MemoryPending {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interest: Interest) {
        self.entries.push(PendingInterest { interest });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PendingRequests for MemoryPending {
    fn drain_related(&mut self, name: &Name) -> Vec<PendingInterest> {
        let mut related = Vec::new();
        self.entries.retain(|entry| {
            if entry.interest.name == *name {
                related.push(entry.clone());
                false
            } else {
                true
            }
        });
        related
    }
}
