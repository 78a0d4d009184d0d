use serde::{Deserialize, Serialize};
use sim_runtime::IntentKind;

use crate::ids::{FactionId, ProvinceId};
use crate::outcome::IntentEffect;

/// One entry in the world's append-only event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub turn: u64,
    pub day: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    IntentResolved {
        index: usize,
        intent: IntentKind,
        initiator: FactionId,
        target: FactionId,
        effect: IntentEffect,
    },
    TurnAdvanced {
        hooks: Vec<String>,
    },
    ProvinceOwnerChanged {
        province: ProvinceId,
        previous: Option<FactionId>,
        current: Option<FactionId>,
    },
    RelationSet {
        from: FactionId,
        to: FactionId,
        previous: f32,
        value: f32,
    },
    GameLoaded {
        version: String,
    },
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::IntentResolved { .. } => "intent_resolved",
            EventKind::TurnAdvanced { .. } => "turn_advanced",
            EventKind::ProvinceOwnerChanged { .. } => "province_owner_changed",
            EventKind::RelationSet { .. } => "relation_set",
            EventKind::GameLoaded { .. } => "game_loaded",
        }
    }
}
