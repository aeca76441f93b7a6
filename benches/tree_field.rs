//! Benchmarks for the CPU-side particle work.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lumina_tree::snow::SNOW_COUNT;
use lumina_tree::{tree, Scene, SnowField, TreeConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for count in [500u32, 3_000, 10_000] {
        let config = TreeConfig::default().with_particle_count(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &config, |b, config| {
            let mut rng = StdRng::seed_from_u64(1);
            b.iter(|| black_box(tree::generate(config, &mut rng)))
        });
    }

    group.finish();
}

fn bench_vertices(c: &mut Criterion) {
    let config = TreeConfig::default().with_particle_count(10_000);
    let field = tree::generate(&config, &mut StdRng::seed_from_u64(2));

    c.bench_function("interleave_vertices_10k", |b| {
        b.iter(|| black_box(field.vertices()))
    });
}

fn bench_snow_tick(c: &mut Criterion) {
    let mut snow = SnowField::new(SNOW_COUNT, &mut StdRng::seed_from_u64(3));

    c.bench_function("snow_tick", |b| {
        b.iter(|| {
            snow.tick();
            black_box(snow.rotation)
        })
    });
}

fn bench_slider_drag(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(4);
    let mut scene = Scene::new(TreeConfig::default(), &mut rng).expect("valid default config");
    let mut turns = 1.0;

    // One regeneration per frame, as while dragging a slider.
    c.bench_function("apply_config_default_tree", |b| {
        b.iter(|| {
            turns = if turns >= 10.0 { 1.0 } else { turns + 0.5 };
            let config = TreeConfig::default().with_spiral_turns(turns);
            black_box(scene.apply_config(config, &mut rng).expect("valid config"))
        })
    });
}

criterion_group!(
    benches,
    bench_generate,
    bench_vertices,
    bench_snow_tick,
    bench_slider_drag
);
criterion_main!(benches);
