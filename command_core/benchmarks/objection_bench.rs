use std::sync::Arc;

use command_core::{
    Action, CommandSession, Marshal, MarshalId, ObjectionConfig, Order, Personality,
    PersonalityCatalog, Roster, StaticBattlefield,
};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

fn battlefield() -> StaticBattlefield {
    StaticBattlefield::new()
        .with_capital("Paris")
        .connect("Paris", "Reims")
        .connect("Reims", "Metz")
        .connect("Metz", "Strasbourg")
        .with_enemy("Metz")
        .with_ratio("Metz", 0.4)
}

fn bench_evaluate_and_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("objection");
    let catalog = PersonalityCatalog::builtin();
    let field = battlefield();

    for trust in [15, 35, 60, 90] {
        group.bench_with_input(BenchmarkId::new("defend", trust), &trust, |b, &trust| {
            b.iter_batched(
                || {
                    let mut config = ObjectionConfig::default();
                    config.turn.major_objections_per_turn = u8::MAX;
                    let roster = Roster::new([
                        Marshal::new("ney", Personality::Aggressive, trust).at("Reims", 10_000),
                        Marshal::new("davout", Personality::Cautious, trust).at("Paris", 9_000),
                    ]);
                    CommandSession::new(roster, Arc::clone(&catalog), Arc::new(config), 42)
                },
                |mut session| {
                    let ney = MarshalId::new("ney");
                    for _ in 0..16 {
                        let raised = session
                            .issue_order(&ney, Order::new(Action::Defend), &field)
                            .ok()
                            .flatten();
                        if raised.is_some_and(|objection| objection.is_major()) {
                            let _ = session.resolve_objection(&ney, "compromise");
                        }
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(objection_benches, bench_evaluate_and_resolve);
criterion_main!(objection_benches);
