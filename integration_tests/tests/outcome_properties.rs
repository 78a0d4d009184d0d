mod common;

use core_sim::{FactionId, IntentEffect, IntentIssue, OutcomeEngine, OutcomePolicy, WorldState};
use sim_runtime::{Intent, IntentKind, Justification, NegotiationReport, Severity};

fn id(value: &str) -> FactionId {
    FactionId::new(value)
}

fn engine() -> OutcomeEngine {
    OutcomeEngine::new(OutcomePolicy::default())
}

#[test]
fn fixture_report_resolves_every_intent() -> anyhow::Result<()> {
    let report = common::river_summit()?;
    let prior = WorldState::new(2024);
    let application = engine().resolve(&prior, &report);

    let kinds: Vec<_> = application.resolutions.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            IntentKind::Proposal,
            IntentKind::Concession,
            IntentKind::Ultimatum,
            IntentKind::CounterOffer,
            IntentKind::SmallTalk,
            IntentKind::Proposal,
            IntentKind::Unknown,
        ]
    );

    let state = &application.state;
    assert_eq!(state.turn, 2);
    assert_eq!(state.day, 1);
    assert_eq!(state.relations.relation(&id("red"), &id("blue")), 10.0);
    assert_eq!(state.relations.relation(&id("blue"), &id("red")), 20.0);
    assert_eq!(state.relations.relation(&id("red"), &id("green")), -50.0);
    assert_eq!(state.relations.len(), 3);
    assert_eq!(state.event_log.len(), report.intents.len());

    assert!(matches!(
        application.resolutions[3].effect,
        IntentEffect::Flagged { .. }
    ));
    assert_eq!(
        application.resolutions[5].effect,
        IntentEffect::Skipped {
            issue: IntentIssue::MalformedIntent {
                field: "target_faction".to_string()
            }
        }
    );
    assert_eq!(
        application.resolutions[6].effect,
        IntentEffect::Skipped {
            issue: IntentIssue::UnknownIntentType
        }
    );
    assert!(application.resolutions[5].justification_defaulted);
    assert!(!application.resolutions[4].justification_defaulted);
    Ok(())
}

#[test]
fn prior_state_is_never_mutated() -> anyhow::Result<()> {
    let report = common::river_summit()?;
    let mut prior = WorldState::new(1);
    prior
        .relations
        .set_relation(id("red"), id("blue"), 5.0);
    let snapshot = prior.clone();

    let next = engine().apply(&prior, &report);
    assert_eq!(prior, snapshot);
    assert_ne!(next, snapshot);
    Ok(())
}

#[test]
fn empty_report_only_advances_the_turn() {
    let prior = WorldState::new(9);
    let next = engine().apply(&prior, &NegotiationReport::default());
    assert_eq!(next.turn, prior.turn + 1);
    assert_eq!(next.day, prior.day);
    assert_eq!(next.provinces, prior.provinces);
    assert_eq!(next.relations, prior.relations);
}

#[test]
fn trade_proposals_accumulate() {
    let report = NegotiationReport::new(
        vec![
            Intent::proposal("a", "b", "trade furs"),
            Intent::proposal("a", "b", "more TRADE"),
            Intent::proposal("a", "b", "a marriage"),
        ],
        Vec::new(),
    );
    let next = engine().apply(&WorldState::new(1), &report);
    assert_eq!(next.relations.relation(&id("a"), &id("b")), 20.0);
    assert_eq!(next.relations.relation(&id("b"), &id("a")), 0.0);
}

#[test]
fn ultimatum_overwrites_instead_of_adding() {
    let mut prior = WorldState::new(1);
    prior.relations.set_relation(id("a"), id("b"), 35.0);
    let report = NegotiationReport::new(
        vec![
            Intent::ultimatum("a", "b", "surrender the fort"),
            Intent::concession("a", "b", "but keep the tribute"),
        ],
        vec![
            Justification::new(0.9, Severity::High),
            Justification::default(),
        ],
    );
    let next = engine().apply(&prior, &report);
    assert_eq!(next.relations.relation(&id("a"), &id("b")), -30.0);
}

#[test]
fn low_severity_ultimatum_changes_nothing() {
    let report = NegotiationReport::new(
        vec![Intent::ultimatum("a", "b", "or else")],
        vec![Justification::new(1.0, Severity::Medium)],
    );
    let next = engine().apply(&WorldState::new(1), &report);
    assert!(next.relations.is_empty());
}

#[test]
fn counter_offer_threshold_is_strict() {
    let report = NegotiationReport::new(
        vec![
            Intent::counter_offer("a", "b", "exactly at threshold"),
            Intent::counter_offer("a", "b", "above threshold"),
        ],
        vec![
            Justification::new(0.7, Severity::Low),
            Justification::new(0.71, Severity::Low),
        ],
    );
    let application = engine().resolve(&WorldState::new(1), &report);
    assert_eq!(application.resolutions[0].effect, IntentEffect::NoChange);
    assert!(matches!(
        application.resolutions[1].effect,
        IntentEffect::Flagged { .. }
    ));
    assert!(application.state.relations.is_empty());
}

#[test]
fn malformed_intent_does_not_abort_the_batch() {
    let report = NegotiationReport::new(
        vec![
            Intent::concession("", "b", "nobody concedes"),
            Intent::concession("a", "b", "we concede"),
        ],
        Vec::new(),
    );
    let application = engine().resolve(&WorldState::new(1), &report);
    assert_eq!(application.skipped().count(), 1);
    assert_eq!(
        application.state.relations.relation(&id("a"), &id("b")),
        20.0
    );
}

#[test]
fn custom_policy_changes_constants() {
    let policy = OutcomePolicy {
        trade_keyword: "spice".to_string(),
        trade_relation_bonus: 3.0,
        ..OutcomePolicy::default()
    };
    let report = NegotiationReport::new(
        vec![
            Intent::proposal("a", "b", "spice routes"),
            Intent::proposal("a", "b", "trade routes"),
        ],
        Vec::new(),
    );
    let next = OutcomeEngine::new(policy).apply(&WorldState::new(1), &report);
    assert_eq!(next.relations.relation(&id("a"), &id("b")), 3.0);
}

#[test]
fn null_faction_in_one_intent_keeps_the_rest_of_the_report() -> anyhow::Result<()> {
    let report = NegotiationReport::from_json_str(
        r#"{"intents": [
            {"type": "concession", "initiator_faction": "a", "target_faction": null},
            {"type": "concession", "initiator_faction": "a", "target_faction": "b"}
        ]}"#,
    )?;
    let application = engine().resolve(&WorldState::new(1), &report);

    assert!(matches!(
        application.resolutions[0].effect,
        IntentEffect::Skipped {
            issue: IntentIssue::MalformedIntent { .. }
        }
    ));
    assert_eq!(
        application.state.relations.relation(&id("a"), &id("b")),
        20.0
    );
    Ok(())
}

#[test]
fn service_shaped_report_applies_what_it_can() -> anyhow::Result<()> {
    let report = common::load_report("service_report.json")?;
    assert_eq!(report.initiator_id(), Some("red"));
    assert_eq!(report.counterpart_id(), Some("blue"));
    assert_eq!(report.justifications[1].severity, Severity::Low);
    assert_eq!(report.justifications[1].confidence(), 0.0);

    let application = engine().resolve(&WorldState::new(1), &report);
    let kinds: Vec<_> = application.resolutions.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            IntentKind::Proposal,
            IntentKind::Concession,
            IntentKind::Unknown,
            IntentKind::Concession,
        ]
    );
    assert_eq!(application.skipped().count(), 2);
    assert_eq!(
        application.state.relations.relation(&id("red"), &id("blue")),
        30.0
    );
    assert_eq!(application.state.relations.len(), 1);
    Ok(())
}
