use std::fmt;

use rand::{rngs::SmallRng, SeedableRng};
use tracing::{debug, info};

use crate::config::TurnConfig;
use crate::events::EventKind;
use crate::world::WorldState;

/// Per-turn data handed to every [`TurnHook`].
#[derive(Debug, Clone, Copy)]
pub struct TurnContext {
    pub turn: u64,
    pub day: u64,
    seed: u64,
}

impl TurnContext {
    /// Deterministic generator for this turn. Hooks pass distinct `stream` values so
    /// they do not draw from the same sequence.
    pub fn rng(&self, stream: u64) -> SmallRng {
        let mixed = self.seed
            ^ self.turn.wrapping_mul(0x9e37_79b9_7f4a_7c15)
            ^ stream.wrapping_mul(0xd6e8_feb8_6659_fd93);
        SmallRng::seed_from_u64(mixed)
    }
}

/// Periodic, non-diplomatic processing run after the turn counter advances.
pub trait TurnHook: Send + Sync {
    fn name(&self) -> &str;
    fn on_turn(&self, state: &mut WorldState, ctx: &TurnContext);
}

/// Pulls every relation toward neutral by a fixed amount per turn, never past zero.
#[derive(Debug, Clone, Copy)]
pub struct RelationDecay {
    per_turn: f32,
}

impl RelationDecay {
    pub fn new(per_turn: f32) -> Self {
        Self {
            per_turn: per_turn.abs(),
        }
    }
}

impl TurnHook for RelationDecay {
    fn name(&self) -> &str {
        "relation_decay"
    }

    fn on_turn(&self, state: &mut WorldState, _ctx: &TurnContext) {
        for value in state.relations.values_mut() {
            if *value > 0.0 {
                *value = (*value - self.per_turn).max(0.0);
            } else if *value < 0.0 {
                *value = (*value + self.per_turn).min(0.0);
            }
        }
    }
}

pub struct TurnScheduler {
    days_per_turn: u64,
    hooks: Vec<Box<dyn TurnHook>>,
}

impl Default for TurnScheduler {
    fn default() -> Self {
        Self::new(1)
    }
}

impl fmt::Debug for TurnScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnScheduler")
            .field("days_per_turn", &self.days_per_turn)
            .field("hooks", &self.hook_names())
            .finish()
    }
}

impl TurnScheduler {
    pub fn new(days_per_turn: u64) -> Self {
        Self {
            days_per_turn: days_per_turn.max(1),
            hooks: Vec::new(),
        }
    }

    pub fn from_config(config: &TurnConfig) -> Self {
        let mut scheduler = Self::new(config.days_per_turn);
        if config.relation_decay_per_turn > 0.0 {
            scheduler.register(RelationDecay::new(config.relation_decay_per_turn));
        }
        scheduler
    }

    /// Hooks run in registration order.
    pub fn register<H>(&mut self, hook: H)
    where
        H: TurnHook + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|hook| hook.name()).collect()
    }

    pub fn days_per_turn(&self) -> u64 {
        self.days_per_turn
    }

    /// Produce the next-turn state from `state`, leaving `state` untouched.
    pub fn advance(&self, state: &WorldState) -> WorldState {
        let mut next = state.clone();
        next.turn = next.turn.saturating_add(1);
        next.day = next.day.saturating_add(self.days_per_turn);

        let ctx = TurnContext {
            turn: next.turn,
            day: next.day,
            seed: next.seed,
        };
        for hook in &self.hooks {
            hook.on_turn(&mut next, &ctx);
            debug!(
                target: "concord::scheduler",
                hook = hook.name(),
                turn = ctx.turn,
                "turn.hook_completed"
            );
        }

        let hooks = self
            .hook_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        next.record(EventKind::TurnAdvanced { hooks });

        info!(
            target: "concord::scheduler",
            turn = next.turn,
            day = next.day,
            digest = next.digest(),
            "turn.completed"
        );
        next
    }
}
