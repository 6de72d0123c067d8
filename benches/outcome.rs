use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use penny_wager::game::outcome::{generate_outcome, OutcomeParams};
use penny_wager::game::rules::FlightCurve;
use penny_wager::game::state::GameType;
use penny_wager::Multiplier;

const SERVER_SEED: &str = "6b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b";

fn outcome_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_outcome");
    let params = OutcomeParams::default();

    for game in GameType::ALL {
        group.bench_function(BenchmarkId::from_parameter(game.slug()), |b| {
            let mut nonce = 0u64;
            b.iter(|| {
                nonce += 1;
                black_box(generate_outcome(SERVER_SEED, "bench-client", nonce, game, &params))
            })
        });
    }
    group.finish();
}

fn flight_curve(c: &mut Criterion) {
    let curve = FlightCurve::default();
    c.bench_function("flight_curve/time_to_reach_100x", |b| {
        b.iter(|| black_box(curve.time_to_reach(black_box(Multiplier::from_hundredths(10_000)))))
    });
}

criterion_group!(benches, outcome_derivation, flight_curve);
criterion_main!(benches);
