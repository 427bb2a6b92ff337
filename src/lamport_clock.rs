//! A `(id, time)` logical clock with monotonic bump, used to order entries
//! causally before the deterministic tie-break in [`crate::comparator`] kicks in.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The clock `id` is the author's public key bytes, so that two concurrent
/// writers with the same `time` still compare deterministically by identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LamportClock {
    id: Vec<u8>,
    time: u64,
}

impl LamportClock {
    /// Constructs a clock at `time` zero for `id`.
    pub fn new(id: &[u8]) -> LamportClock {
        LamportClock {
            id: id.to_vec(),
            time: 0,
        }
    }

    /// Returns a copy of this clock with `time` set explicitly.
    pub fn set_time(mut self, time: u64) -> LamportClock {
        self.time = time;
        self
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// Advances the clock by one tick, for local events with no remote input.
    pub fn tick(&mut self) {
        self.time += 1;
    }

    /// Adopts `other`'s time if it is ahead of ours (does not bump past it).
    pub fn merge(&mut self, other: &LamportClock) {
        if self.time < other.time {
            self.time = other.time;
        }
    }
}

impl PartialEq for LamportClock {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl Eq for LamportClock {}

impl Ord for LamportClock {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => self.id.cmp(&other.id),
            ord => ord,
        }
    }
}

impl PartialOrd for LamportClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
