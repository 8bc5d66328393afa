//! Clock and scheduler capabilities.
//!
//! The core performs no blocking and owns no timeline; all time-driven
//! behavior goes through these traits so the embedding (a discrete-event
//! simulation or a real runtime) controls "now" and timer firing.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Opaque handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Continuation scheduled to run after a delay.
pub type TimerCallback = Box<dyn FnOnce()>;

/// Deferred-execution capability with cancellable handles.
///
/// Callbacks for a given submitter fire in submission order at their due
/// time; a cancelled handle never fires.
pub trait Scheduler {
    fn after(&mut self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    fn cancel(&mut self, handle: TimerHandle);
}
