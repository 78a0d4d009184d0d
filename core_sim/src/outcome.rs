//! Applies negotiation reports to world state.
//!
//! [`OutcomeEngine::resolve`] is a pure function of its inputs: it clones the prior
//! state, dispatches every intent in report order to its handler, advances the turn
//! counter once and hands back the new state together with a per-intent account of
//! what happened. Bad entries never abort a report; they resolve to
//! [`IntentEffect::Skipped`] and the remaining intents still apply.

use serde::{Deserialize, Serialize};
use sim_runtime::{Intent, IntentKind, Justification, NegotiationReport, Severity};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events::EventKind;
use crate::ids::FactionId;
use crate::relations::RelationMatrix;
use crate::world::WorldState;

/// Tunable constants of the base diplomatic policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomePolicy {
    /// Proposals whose summary contains this keyword (case-insensitive) improve relations.
    pub trade_keyword: String,
    pub trade_relation_bonus: f32,
    pub concession_relation_bonus: f32,
    /// Value a high-severity ultimatum writes over the existing relation.
    pub ultimatum_hostile_relation: f32,
    /// Counter-offers above this confidence are flagged as significant.
    pub counter_offer_significance: f32,
}

impl Default for OutcomePolicy {
    fn default() -> Self {
        Self {
            trade_keyword: "trade".to_string(),
            trade_relation_bonus: 10.0,
            concession_relation_bonus: 20.0,
            ultimatum_hostile_relation: -50.0,
            counter_offer_significance: 0.7,
        }
    }
}

/// Why an intent was passed over without touching state.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum IntentIssue {
    #[error("intent is missing {field}")]
    MalformedIntent { field: String },
    #[error("intent type is not recognised")]
    UnknownIntentType,
}

/// What resolving a single intent did to the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum IntentEffect {
    RelationAdjusted { delta: f32, value: f32 },
    RelationOverwritten { previous: f32, value: f32 },
    /// Marked significant without a state change (counter-offers above the threshold).
    Flagged { confidence: f32 },
    NoChange,
    Skipped { issue: IntentIssue },
}

impl IntentEffect {
    pub fn changed_state(&self) -> bool {
        matches!(
            self,
            IntentEffect::RelationAdjusted { .. } | IntentEffect::RelationOverwritten { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntentResolution {
    pub index: usize,
    pub kind: IntentKind,
    pub initiator: FactionId,
    pub target: FactionId,
    /// The report carried no justification at this index; the default was used.
    pub justification_defaulted: bool,
    pub effect: IntentEffect,
}

/// New state plus the per-intent account that produced it.
#[derive(Debug, Clone)]
pub struct OutcomeApplication {
    pub state: WorldState,
    pub resolutions: Vec<IntentResolution>,
}

impl OutcomeApplication {
    pub fn state_changes(&self) -> usize {
        self.resolutions
            .iter()
            .filter(|resolution| resolution.effect.changed_state())
            .count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &IntentResolution> {
        self.resolutions
            .iter()
            .filter(|resolution| matches!(resolution.effect, IntentEffect::Skipped { .. }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutcomeEngine {
    policy: OutcomePolicy,
}

impl OutcomeEngine {
    pub fn new(policy: OutcomePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &OutcomePolicy {
        &self.policy
    }

    /// Apply `report` to `prior`, returning the successor state. `prior` is left as is.
    pub fn apply(&self, prior: &WorldState, report: &NegotiationReport) -> WorldState {
        self.resolve(prior, report).state
    }

    pub fn resolve(&self, prior: &WorldState, report: &NegotiationReport) -> OutcomeApplication {
        let mut state = prior.clone();

        if report.is_flagged_unsafe() {
            warn!(
                target: "concord::engine",
                session = report.session_id.as_deref().unwrap_or("-"),
                initiator = report.initiator_id().unwrap_or("-"),
                counterpart = report.counterpart_id().unwrap_or("-"),
                "outcome.content_flagged_unsafe"
            );
        }
        if report.justifications.len() > report.intents.len() {
            debug!(
                target: "concord::engine",
                intents = report.intents.len(),
                justifications = report.justifications.len(),
                "outcome.extra_justifications_ignored"
            );
        }

        let fallback = Justification::default();
        let mut resolutions = Vec::with_capacity(report.intents.len());

        for (index, intent) in report.intents.iter().enumerate() {
            let (justification, justification_defaulted) = match report.justification_for(index)
            {
                Some(justification) => (justification, false),
                None => (&fallback, true),
            };

            let effect = self.resolve_intent(&mut state.relations, intent, justification);
            let resolution = IntentResolution {
                index,
                kind: intent.kind(),
                initiator: FactionId::new(intent.initiator()),
                target: FactionId::new(intent.target()),
                justification_defaulted,
                effect,
            };

            match &resolution.effect {
                IntentEffect::Skipped { issue } => warn!(
                    target: "concord::engine",
                    index,
                    intent = resolution.kind.as_str(),
                    %issue,
                    "intent.skipped"
                ),
                effect => debug!(
                    target: "concord::engine",
                    index,
                    intent = resolution.kind.as_str(),
                    initiator = %resolution.initiator,
                    target_faction = %resolution.target,
                    justification_defaulted,
                    ?effect,
                    "intent.resolved"
                ),
            }

            state.record(EventKind::IntentResolved {
                index,
                intent: resolution.kind,
                initiator: resolution.initiator.clone(),
                target: resolution.target.clone(),
                effect: resolution.effect.clone(),
            });
            resolutions.push(resolution);
        }

        state.turn = state.turn.saturating_add(1);

        let application = OutcomeApplication { state, resolutions };
        info!(
            target: "concord::engine",
            turn = application.state.turn,
            intents = report.intents.len(),
            state_changes = application.state_changes(),
            digest = application.state.digest(),
            "outcome.applied"
        );
        application
    }

    fn resolve_intent(
        &self,
        relations: &mut RelationMatrix,
        intent: &Intent,
        justification: &Justification,
    ) -> IntentEffect {
        match intent {
            Intent::Proposal(_) => {
                if !intent.summary_mentions(&self.policy.trade_keyword) {
                    return IntentEffect::NoChange;
                }
                self.adjust(relations, intent, self.policy.trade_relation_bonus)
            }
            Intent::CounterOffer(_) => {
                let confidence = justification.confidence();
                if confidence > self.policy.counter_offer_significance {
                    IntentEffect::Flagged { confidence }
                } else {
                    IntentEffect::NoChange
                }
            }
            Intent::Ultimatum(_) => {
                if justification.severity != Severity::High {
                    return IntentEffect::NoChange;
                }
                self.overwrite(relations, intent, self.policy.ultimatum_hostile_relation)
            }
            Intent::Concession(_) => {
                self.adjust(relations, intent, self.policy.concession_relation_bonus)
            }
            Intent::SmallTalk(_) => IntentEffect::NoChange,
            Intent::Unknown => IntentEffect::Skipped {
                issue: IntentIssue::UnknownIntentType,
            },
        }
    }

    fn adjust(&self, relations: &mut RelationMatrix, intent: &Intent, delta: f32) -> IntentEffect {
        match relation_parties(intent) {
            Ok((from, to)) => {
                let value = relations.adjust_relation(from, to, delta);
                IntentEffect::RelationAdjusted { delta, value }
            }
            Err(issue) => IntentEffect::Skipped { issue },
        }
    }

    fn overwrite(
        &self,
        relations: &mut RelationMatrix,
        intent: &Intent,
        value: f32,
    ) -> IntentEffect {
        match relation_parties(intent) {
            Ok((from, to)) => {
                let previous = relations.relation(&from, &to);
                relations.set_relation(from, to, value);
                IntentEffect::RelationOverwritten { previous, value }
            }
            Err(issue) => IntentEffect::Skipped { issue },
        }
    }
}

fn relation_parties(intent: &Intent) -> Result<(FactionId, FactionId), IntentIssue> {
    let initiator = FactionId::new(intent.initiator());
    if initiator.is_empty() {
        return Err(IntentIssue::MalformedIntent {
            field: "initiator_faction".to_string(),
        });
    }
    let target = FactionId::new(intent.target());
    if target.is_empty() {
        return Err(IntentIssue::MalformedIntent {
            field: "target_faction".to_string(),
        });
    }
    Ok((initiator, target))
}
