use core_sim::{OutcomeEngine, OutcomePolicy, TurnScheduler, WorldState};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use sim_runtime::{Intent, Justification, NegotiationReport, Severity};

fn build_report(intents: usize) -> NegotiationReport {
    let mut batch = Vec::with_capacity(intents);
    let mut justifications = Vec::with_capacity(intents);
    for index in 0..intents {
        let initiator = format!("faction_{}", index % 7);
        let target = format!("faction_{}", (index + 3) % 7);
        let intent = match index % 4 {
            0 => Intent::proposal(&initiator, &target, "open trade on the river"),
            1 => Intent::concession(&initiator, &target, "cede the ford"),
            2 => Intent::ultimatum(&initiator, &target, "withdraw"),
            _ => Intent::counter_offer(&initiator, &target, "half the tariff"),
        };
        batch.push(intent);
        justifications.push(Justification::new(0.8, Severity::High));
    }
    NegotiationReport::new(batch, justifications)
}

fn bench_apply(c: &mut Criterion) {
    let engine = OutcomeEngine::new(OutcomePolicy::default());
    let mut group = c.benchmark_group("outcome_apply");

    for intents in [4usize, 32, 256] {
        let report = build_report(intents);
        group.bench_with_input(BenchmarkId::new("intents", intents), &report, |b, report| {
            b.iter_batched(
                || WorldState::new(7),
                |state| engine.apply(&state, report),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_advance(c: &mut Criterion) {
    let scheduler = TurnScheduler::new(1);
    let engine = OutcomeEngine::default();
    let state = engine.apply(&WorldState::new(7), &build_report(256));
    c.bench_function("turn_advance", |b| b.iter(|| scheduler.advance(&state)));
}

criterion_group!(outcome_benches, bench_apply, bench_advance);
criterion_main!(outcome_benches);
