//! Turn latency benchmarks
//!
//! Times full engine turns on randomized scenes to check the per-turn budget.
//!
//! Run with: cargo bench --bench turn

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skirmish_engine::config::EngineConfig;
use skirmish_engine::game::engine::Engine;
use skirmish_engine::game::state::{BaseSide, Entity, PlayerStatus, TurnInput};
use skirmish_engine::game::systems::optimizer::OffsetDisk;
use skirmish_engine::util::vec2::Vec2;

const WIDTH: f32 = 17630.0;
const HEIGHT: f32 = 9000.0;

/// A scene with our three units near base and `creatures` random creatures
fn random_scene(rng: &mut StdRng, creatures: usize, mana: i32) -> TurnInput {
    let mut entities = Vec::with_capacity(creatures + 6);

    for id in 0..3 {
        let pos = Vec2::new(rng.gen_range(500.0..7000.0), rng.gen_range(500.0..7000.0));
        entities.push(Entity::unit(id, pos));
    }
    for id in 3..6 {
        let pos = Vec2::new(rng.gen_range(10000.0..17000.0), rng.gen_range(2000.0..8500.0));
        entities.push(Entity::enemy(id, pos));
    }
    for k in 0..creatures {
        let pos = Vec2::new(rng.gen_range(0.0..WIDTH), rng.gen_range(0.0..HEIGHT));
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let vel = Vec2::new(angle.cos() * 400.0, angle.sin() * 400.0);
        let mut creature = Entity::creature(10 + k as i32, pos, vel, rng.gen_range(10..30));
        creature.threat = match rng.gen_range(0..3) {
            0 => BaseSide::Neither,
            1 => BaseSide::Friendly,
            _ => BaseSide::Hostile,
        };
        if creature.threat == BaseSide::Friendly && pos.length() < 5000.0 {
            creature.near_base = BaseSide::Friendly;
        }
        entities.push(creature);
    }

    TurnInput {
        players: [
            PlayerStatus { health: 3, mana },
            PlayerStatus { health: 3, mana: 50 },
        ],
        entities,
    }
}

/// Full turn at various creature counts
fn bench_play_turn(c: &mut Criterion) {
    let mut group = c.benchmark_group("play_turn");
    group.sample_size(50);

    for count in [5, 20, 50, 100] {
        let mut rng = StdRng::seed_from_u64(count as u64);
        let scenes: Vec<TurnInput> = (0..16).map(|_| random_scene(&mut rng, count, 60)).collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("creatures", count), &count, |b, _| {
            let mut engine = Engine::new(EngineConfig::default(), Vec2::ZERO);
            let mut next = 0;
            b.iter(|| {
                let scene = scenes[next % scenes.len()].clone();
                next += 1;
                black_box(engine.play_turn(scene))
            })
        });
    }
    group.finish();
}

/// Offset disk construction at the configured lattice steps
fn bench_offset_disk(c: &mut Criterion) {
    let mut group = c.benchmark_group("offset_disk");

    for step in [10, 20, 40] {
        group.bench_with_input(BenchmarkId::new("step", step), &step, |b, &step| {
            b.iter(|| black_box(OffsetDisk::new(800.0, step).len()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_play_turn, bench_offset_disk);
criterion_main!(benches);
