use std::path::PathBuf;

use crate::NegotiationReport;

/// Commands accepted by the simulation host.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, PartialEq)]
pub enum CommandPayload {
    Turn {
        steps: u32,
    },
    ApplyReport {
        report: NegotiationReport,
    },
    PreviewReport {
        report: NegotiationReport,
    },
    /// Query the owner when `faction` is `None`, otherwise assign it. An empty
    /// faction releases the province.
    ProvinceOwner {
        province: String,
        faction: Option<String>,
    },
    Relation {
        from: String,
        to: String,
        value: Option<f32>,
    },
    Save {
        path: PathBuf,
    },
    Load {
        path: PathBuf,
    },
    State,
}

impl CommandPayload {
    /// Protocol verb, for logging.
    pub fn verb(&self) -> &'static str {
        match self {
            CommandPayload::Turn { .. } => "turn",
            CommandPayload::ApplyReport { .. } => "report",
            CommandPayload::PreviewReport { .. } => "preview",
            CommandPayload::ProvinceOwner { .. } => "owner",
            CommandPayload::Relation { .. } => "relation",
            CommandPayload::Save { .. } => "save",
            CommandPayload::Load { .. } => "load",
            CommandPayload::State => "state",
        }
    }

    /// Whether the command changes the canonical world state.
    pub fn is_mutation(&self) -> bool {
        match self {
            CommandPayload::Turn { .. }
            | CommandPayload::ApplyReport { .. }
            | CommandPayload::Load { .. } => true,
            CommandPayload::ProvinceOwner { faction, .. } => faction.is_some(),
            CommandPayload::Relation { value, .. } => value.is_some(),
            CommandPayload::PreviewReport { .. }
            | CommandPayload::Save { .. }
            | CommandPayload::State => false,
        }
    }
}
