//! Authoritative simulation core for the Concord turn-based strategy prototype.
//!
//! A [`SimulationSession`] owns the canonical [`WorldState`]: province ownership,
//! directed faction relations and the turn/day counters. State only changes through
//! [`OutcomeEngine`] (diplomatic reports), [`TurnScheduler`] (turn advance) and the
//! session's direct setters, each of which builds a successor state and installs it in
//! the [`WorldStateStore`] in one step.

mod commands;
pub mod config;
mod events;
mod ids;
mod outcome;
mod persistence;
mod provinces;
mod relations;
mod scheduler;
mod session;
mod store;
mod world;

pub use commands::execute_command;
pub use config::{
    load_simulation_config, load_simulation_config_from_env, ConfigError, ConfigMetadata,
    NotificationConfig, PersistenceConfig, ServerConfig, SimulationConfig, TurnConfig,
};
pub use events::{EventKind, EventRecord};
pub use ids::{FactionId, ProvinceId};
pub use outcome::{
    IntentEffect, IntentIssue, IntentResolution, OutcomeApplication, OutcomeEngine,
    OutcomePolicy,
};
pub use persistence::{PersistenceError, PersistenceGateway, SaveBlob};
pub use provinces::{OwnerChange, ProvinceOwnershipLedger, ProvinceRegistry};
pub use relations::{RelationEntry, RelationMatrix};
pub use scheduler::{RelationDecay, TurnContext, TurnHook, TurnScheduler};
pub use session::{SessionError, SessionStatus, SimulationSession};
pub use store::{WorldNotification, WorldStateStore};
pub use world::{WorldState, WorldStateError};
