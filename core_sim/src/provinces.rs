use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sim_runtime::ProvinceData;

use crate::ids::{FactionId, ProvinceId};

/// Result of assigning a province owner. `None` means unclaimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerChange {
    pub previous: Option<FactionId>,
    pub current: Option<FactionId>,
}

impl OwnerChange {
    pub fn is_noop(&self) -> bool {
        self.previous == self.current
    }
}

/// Which faction controls each province.
///
/// Unclaimed provinces are simply absent; empty owners are dropped on insert and on
/// deserialization so the two spellings of "unclaimed" never coexist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ProvinceId, FactionId>", into = "BTreeMap<ProvinceId, FactionId>")]
pub struct ProvinceOwnershipLedger {
    owners: BTreeMap<ProvinceId, FactionId>,
}

impl ProvinceOwnershipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner_of(&self, province: &str) -> Option<&FactionId> {
        self.owners.get(province)
    }

    /// Assign `faction` to `province`; an empty faction releases the province.
    pub fn set_owner(&mut self, province: ProvinceId, faction: FactionId) -> OwnerChange {
        let previous = if faction.is_empty() {
            self.owners.remove(province.as_str())
        } else {
            self.owners.insert(province, faction.clone())
        };
        let current = (!faction.is_empty()).then_some(faction);
        OwnerChange { previous, current }
    }

    pub fn provinces_of<'a>(
        &'a self,
        faction: &'a str,
    ) -> impl Iterator<Item = &'a ProvinceId> + 'a {
        self.owners
            .iter()
            .filter(move |(_, owner)| owner.as_str() == faction)
            .map(|(province, _)| province)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProvinceId, &FactionId)> {
        self.owners.iter()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl From<BTreeMap<ProvinceId, FactionId>> for ProvinceOwnershipLedger {
    fn from(mut owners: BTreeMap<ProvinceId, FactionId>) -> Self {
        owners.retain(|_, owner| !owner.is_empty());
        Self { owners }
    }
}

impl From<ProvinceOwnershipLedger> for BTreeMap<ProvinceId, FactionId> {
    fn from(ledger: ProvinceOwnershipLedger) -> Self {
        ledger.owners
    }
}

/// Presentation-side province records: names, map positions and the current selection.
///
/// This is not part of the world state; it mirrors what the map view registered so
/// pointer input can be resolved to a province without touching simulation data.
#[derive(Debug, Clone, Default)]
pub struct ProvinceRegistry {
    provinces: BTreeMap<ProvinceId, ProvinceData>,
}

impl ProvinceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a province record, returning the previous one.
    pub fn register(&mut self, data: ProvinceData) -> Option<ProvinceData> {
        let id = ProvinceId::new(data.id.clone());
        self.provinces.insert(id, data)
    }

    pub fn unregister(&mut self, province: &str) -> Option<ProvinceData> {
        self.provinces.remove(province)
    }

    pub fn get(&self, province: &str) -> Option<&ProvinceData> {
        self.provinces.get(province)
    }

    /// Make `province` the only selected entry. Returns false for unknown provinces,
    /// leaving the existing selection untouched.
    pub fn select(&mut self, province: &str) -> bool {
        if !self.provinces.contains_key(province) {
            return false;
        }
        for (id, data) in self.provinces.iter_mut() {
            data.selected = id.as_str() == province;
        }
        true
    }

    pub fn clear_selection(&mut self) {
        for data in self.provinces.values_mut() {
            data.selected = false;
        }
    }

    pub fn selected(&self) -> Option<&ProvinceData> {
        self.provinces.values().find(|data| data.selected)
    }

    /// Closest registered province to `point`, if any lies within `radius`.
    pub fn nearest(&self, point: (f32, f32), radius: f32) -> Option<&ProvinceData> {
        let radius_sq = radius * radius;
        self.provinces
            .values()
            .map(|data| {
                let dx = data.position.0 - point.0;
                let dy = data.position.1 - point.1;
                (dx * dx + dy * dy, data)
            })
            .filter(|(distance_sq, _)| *distance_sq <= radius_sq)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, data)| data)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProvinceData> {
        self.provinces.values()
    }

    pub fn len(&self) -> usize {
        self.provinces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty()
    }
}
