use std::hash::Hasher;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::{EventKind, EventRecord};
use crate::provinces::ProvinceOwnershipLedger;
use crate::relations::RelationMatrix;

/// Complete simulation-relevant state at one point in time.
///
/// Values are never edited after being published to a [`crate::WorldStateStore`];
/// transitions clone the prior state, mutate the clone and publish it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub turn: u64,
    pub day: u64,
    pub seed: u64,
    #[serde(default)]
    pub provinces: ProvinceOwnershipLedger,
    #[serde(default)]
    pub relations: RelationMatrix,
    #[serde(default)]
    pub event_log: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldStateError {
    #[error("turn must be at least 1, found {0}")]
    TurnOutOfRange(u64),
    #[error("day must be at least 1, found {0}")]
    DayOutOfRange(u64),
    #[error("relation matrix contains a non-finite score")]
    NonFiniteRelation,
}

impl WorldState {
    /// Game-start state: turn 1, day 1, empty ledgers.
    pub fn new(seed: u64) -> Self {
        Self {
            turn: 1,
            day: 1,
            seed,
            provinces: ProvinceOwnershipLedger::new(),
            relations: RelationMatrix::new(),
            event_log: Vec::new(),
        }
    }

    /// Game-start state seeded from the system clock.
    pub fn fresh() -> Self {
        Self::new(time_seed())
    }

    /// Append an event stamped with the current turn and day.
    pub fn record(&mut self, kind: EventKind) {
        self.event_log.push(EventRecord {
            turn: self.turn,
            day: self.day,
            kind,
        });
    }

    pub fn validate(&self) -> Result<(), WorldStateError> {
        if self.turn < 1 {
            return Err(WorldStateError::TurnOutOfRange(self.turn));
        }
        if self.day < 1 {
            return Err(WorldStateError::DayOutOfRange(self.day));
        }
        if !self.relations.all_finite() {
            return Err(WorldStateError::NonFiniteRelation);
        }
        Ok(())
    }

    /// Deterministic FNV-1a digest of counters, seed, ownership and relations.
    ///
    /// Equal states always digest equally across runs and platforms; the event log only
    /// contributes its length.
    pub fn digest(&self) -> u64 {
        let mut hasher = Fnv1a::default();
        hasher.write_u64(self.turn);
        hasher.write_u64(self.day);
        hasher.write_u64(self.seed);
        hasher.write_u64(self.provinces.len() as u64);
        for (province, owner) in self.provinces.iter() {
            hasher.write_str_prefixed(province.as_str());
            hasher.write_str_prefixed(owner.as_str());
        }
        hasher.write_u64(self.relations.len() as u64);
        for (from, to, value) in self.relations.iter() {
            hasher.write_str_prefixed(from.as_str());
            hasher.write_str_prefixed(to.as_str());
            hasher.write_u32(value.to_bits());
        }
        hasher.write_u64(self.event_log.len() as u64);
        hasher.finish()
    }
}

fn time_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default();
    // splitmix64 finalizer so nearby start times give unrelated seeds
    let mut z = nanos.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

struct Fnv1a {
    state: u64,
}

impl Fnv1a {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn write_str_prefixed(&mut self, value: &str) {
        self.write_u64(value.len() as u64);
        self.write(value.as_bytes());
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Hasher for Fnv1a {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }

    fn write_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    fn write_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }
}
