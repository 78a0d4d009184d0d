use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use serde_json::Value;
use sim_runtime::{NegotiationReport, ProvinceData};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::events::EventKind;
use crate::ids::{FactionId, ProvinceId};
use crate::outcome::{OutcomeApplication, OutcomeEngine};
use crate::persistence::{PersistenceError, PersistenceGateway, SaveBlob};
use crate::provinces::{OwnerChange, ProvinceRegistry};
use crate::scheduler::{TurnHook, TurnScheduler};
use crate::store::{WorldNotification, WorldStateStore};
use crate::world::WorldState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    ShutDown,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("simulation session has been shut down")]
    ShutDown,
    #[error("relation value must be finite, got {0}")]
    NonFiniteRelation(f32),
    #[error("relation needs both factions, got '{from}' -> '{to}'")]
    MissingFaction { from: FactionId, to: FactionId },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Explicitly constructed owner of one running simulation.
///
/// The session is the store's only writer. Every mutation clones the current state,
/// builds its successor and installs it before any subscriber is notified. Reader
/// handles obtained through [`store`](Self::store) may be used from any thread.
#[derive(Debug)]
pub struct SimulationSession {
    config: SimulationConfig,
    store: WorldStateStore,
    engine: OutcomeEngine,
    scheduler: TurnScheduler,
    gateway: PersistenceGateway,
    registry: ProvinceRegistry,
    status: SessionStatus,
}

impl SimulationSession {
    /// Start a new game: turn 1, day 1, empty ledgers.
    pub fn init(config: SimulationConfig) -> Self {
        let state = match config.seed {
            Some(seed) => WorldState::new(seed),
            None => WorldState::fresh(),
        };
        Self::with_state(config, state)
    }

    /// Resume from an existing state, e.g. one read back through [`PersistenceGateway`].
    pub fn with_state(config: SimulationConfig, state: WorldState) -> Self {
        info!(
            target: "concord::session",
            seed = state.seed,
            turn = state.turn,
            day = state.day,
            "session.initialized"
        );
        Self {
            store: WorldStateStore::new(state, config.notifications.channel_capacity),
            engine: OutcomeEngine::new(config.outcome.clone()),
            scheduler: TurnScheduler::from_config(&config.turn),
            gateway: PersistenceGateway::new(config.persistence.save_version.clone()),
            registry: ProvinceRegistry::new(),
            status: SessionStatus::Active,
            config,
        }
    }

    pub fn shutdown(&mut self) {
        if self.status == SessionStatus::ShutDown {
            return;
        }
        self.status = SessionStatus::ShutDown;
        let state = self.store.current();
        info!(
            target: "concord::session",
            turn = state.turn,
            digest = state.digest(),
            "session.shutdown"
        );
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Reader handle sharing this session's canonical state.
    pub fn store(&self) -> WorldStateStore {
        self.store.clone()
    }

    pub fn subscribe(&self) -> Receiver<WorldNotification> {
        self.store.subscribe()
    }

    pub fn current_state(&self) -> Arc<WorldState> {
        self.store.current()
    }

    pub fn register_turn_hook<H>(&mut self, hook: H)
    where
        H: TurnHook + 'static,
    {
        self.scheduler.register(hook);
    }

    pub fn province_owner(&self, province: &str) -> Option<FactionId> {
        self.store.current().provinces.owner_of(province).cloned()
    }

    /// Assign `province` to `faction`; an empty faction unclaims it. No-ops leave the
    /// state and the event log untouched and notify nobody.
    pub fn set_province_owner(
        &mut self,
        province: impl Into<ProvinceId>,
        faction: impl Into<FactionId>,
    ) -> Result<OwnerChange, SessionError> {
        self.ensure_active()?;
        let province = province.into();
        let mut next = (*self.store.current()).clone();
        let change = next.provinces.set_owner(province.clone(), faction.into());
        if change.is_noop() {
            return Ok(change);
        }

        next.record(EventKind::ProvinceOwnerChanged {
            province: province.clone(),
            previous: change.previous.clone(),
            current: change.current.clone(),
        });
        self.install(next);
        self.store.publish(WorldNotification::ProvinceOwnerChanged {
            province,
            previous: change.previous.clone(),
            current: change.current.clone(),
        });
        Ok(change)
    }

    pub fn relation(&self, from: &str, to: &str) -> f32 {
        self.store
            .current()
            .relations
            .relation(&FactionId::new(from), &FactionId::new(to))
    }

    /// Overwrite the `from -> to` relation, returning the previous stored value.
    pub fn set_relation(
        &mut self,
        from: impl Into<FactionId>,
        to: impl Into<FactionId>,
        value: f32,
    ) -> Result<Option<f32>, SessionError> {
        self.ensure_active()?;
        if !value.is_finite() {
            return Err(SessionError::NonFiniteRelation(value));
        }
        let (from, to) = (from.into(), to.into());
        if from.is_empty() || to.is_empty() {
            return Err(SessionError::MissingFaction { from, to });
        }
        let mut next = (*self.store.current()).clone();
        let previous = next.relations.set_relation(from.clone(), to.clone(), value);
        next.record(EventKind::RelationSet {
            from,
            to,
            previous: previous.unwrap_or(0.0),
            value,
        });
        self.install(next);
        Ok(previous)
    }

    pub fn advance_turn(&mut self) -> Result<Arc<WorldState>, SessionError> {
        self.ensure_active()?;
        let next = self.scheduler.advance(&self.store.current());
        let (turn, day) = (next.turn, next.day);
        let installed = self.install(next);
        self.store
            .publish(WorldNotification::TurnAdvanced { turn, day });
        Ok(installed)
    }

    /// Apply a negotiation report to the canonical state and publish the result.
    pub fn apply_report(
        &mut self,
        report: NegotiationReport,
    ) -> Result<OutcomeApplication, SessionError> {
        self.ensure_active()?;
        let application = self.engine.resolve(&self.store.current(), &report);
        self.install(application.state.clone());
        self.store
            .publish(WorldNotification::OutcomeApplied(Arc::new(report)));
        Ok(application)
    }

    /// What `report` would do to the current state. Nothing is installed or published.
    pub fn preview_report(&self, report: &NegotiationReport) -> OutcomeApplication {
        self.engine.resolve(&self.store.current(), report)
    }

    pub fn save_game(&self) -> SaveBlob {
        self.gateway.save(&self.store.current())
    }

    pub fn save_game_to(&self, path: &Path) -> Result<SaveBlob, SessionError> {
        Ok(self.gateway.save_to_path(&self.store.current(), path)?)
    }

    /// Replace the canonical state with the blob's. Returns false, leaving the live state
    /// untouched, when the blob is rejected.
    pub fn load_game(&mut self, blob: &Value) -> bool {
        match self.try_load_game(blob) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    target: "concord::session",
                    error = %err,
                    "session.load_rejected"
                );
                false
            }
        }
    }

    pub fn try_load_game(&mut self, blob: &Value) -> Result<(), SessionError> {
        self.ensure_active()?;
        let state = self.gateway.load_value(blob)?;
        let version = blob
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.install_loaded(state, version);
        Ok(())
    }

    pub fn load_game_from(&mut self, path: &Path) -> Result<(), SessionError> {
        self.ensure_active()?;
        let state = self.gateway.load_from_path(path)?;
        let version = self.gateway.version().to_string();
        self.install_loaded(state, version);
        Ok(())
    }

    pub fn register_province(&mut self, data: ProvinceData) -> Option<ProvinceData> {
        self.registry.register(data)
    }

    pub fn unregister_province(&mut self, province: &str) -> Option<ProvinceData> {
        self.registry.unregister(province)
    }

    pub fn province_data(&self, province: &str) -> Option<&ProvinceData> {
        self.registry.get(province)
    }

    pub fn select_province(&mut self, province: &str) -> bool {
        self.registry.select(province)
    }

    pub fn clear_selection(&mut self) {
        self.registry.clear_selection();
    }

    pub fn selected_province(&self) -> Option<&ProvinceData> {
        self.registry.selected()
    }

    pub fn province_at(&self, point: (f32, f32), radius: f32) -> Option<&ProvinceData> {
        self.registry.nearest(point, radius)
    }

    pub fn provinces(&self) -> &ProvinceRegistry {
        &self.registry
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::Active => Ok(()),
            SessionStatus::ShutDown => Err(SessionError::ShutDown),
        }
    }

    fn install_loaded(&mut self, mut state: WorldState, version: String) {
        state.record(EventKind::GameLoaded { version });
        let turn = state.turn;
        self.install(state);
        self.store.publish(WorldNotification::GameLoaded { turn });
        info!(target: "concord::session", turn, "session.game_loaded");
    }

    fn install(&self, state: WorldState) -> Arc<WorldState> {
        let installed = self.store.replace(state);
        self.store
            .publish(WorldNotification::StateChanged(Arc::clone(&installed)));
        installed
    }
}
