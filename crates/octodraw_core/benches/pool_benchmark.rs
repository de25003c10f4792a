//! # Drawer Performance Benchmark
//!
//! Targets:
//! - 10,000 animated entities per render pass
//! - Spawn/free churn without surface re-creation
//!
//! Run with: `cargo bench --package octodraw_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use octodraw_core::{
    DrawerConfig, EntityDrawer, FrameSource, RenderBackend, SlotPool, SurfaceRef, SurfaceTarget,
    TextureRef, Vec2,
};

const ENTITY_COUNT: usize = 10_000;

struct NullBackend(u64);

impl RenderBackend for NullBackend {
    fn create_surface(&mut self, _target: SurfaceTarget) -> SurfaceRef {
        self.0 += 1;
        SurfaceRef(self.0)
    }

    fn set_transform(&mut self, surface: SurfaceRef, position: Vec2) {
        black_box((surface, position));
    }

    fn clear(&mut self, surface: SurfaceRef) {
        black_box(surface);
    }

    fn draw(&mut self, surface: SurfaceRef, texture: TextureRef, offset: Vec2) {
        black_box((surface, texture, offset));
    }

    fn destroy(&mut self, _surface: SurfaceRef) {}
}

struct EightFrames;

impl FrameSource for EightFrames {
    fn frame_count(&self, _animation: &str) -> usize {
        8
    }

    fn frame_duration(&self, _animation: &str, _frame: usize) -> f64 {
        0.1
    }

    fn playback_speed(&self, _animation: &str) -> f64 {
        1.0
    }

    fn frame_texture(&self, _animation: &str, frame: usize) -> Option<TextureRef> {
        Some(TextureRef(frame as u64))
    }
}

fn populated(count: usize) -> EntityDrawer<NullBackend> {
    let drawer = EntityDrawer::new(NullBackend(0), DrawerConfig::default());
    let frames: Arc<dyn FrameSource> = Arc::new(EightFrames);
    for i in 0..count {
        let at = Vec2::new(i as f32, 0.0);
        let entity = drawer.add_instance(at, Vec2::ZERO, Arc::clone(&frames), "walk", "", false, false);
        drawer.add_direction_handler(entity, true);
    }
    drawer
}

/// Raw pool churn: allocate and free through the FIFO free-list.
fn bench_pool_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_churn");

    for count in [1_000, ENTITY_COUNT] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut pool: SlotPool<u64> = SlotPool::with_capacity(count);
            b.iter(|| {
                let handles: Vec<_> = (0..count as u64).map(|v| pool.new_instance(v)).collect();
                for handle in handles {
                    pool.free_instance(handle);
                }
                black_box(pool.len())
            });
        });
    }

    group.finish();
}

/// Spawn and free with recycled surfaces.
fn bench_spawn_free(c: &mut Criterion) {
    let drawer = populated(0);
    let frames: Arc<dyn FrameSource> = Arc::new(EightFrames);

    c.bench_function("spawn_free_1k", |b| {
        b.iter(|| {
            let entities: Vec<_> = (0..1_000)
                .map(|_| {
                    drawer.add_instance(Vec2::ZERO, Vec2::ZERO, Arc::clone(&frames), "boom", "", true, false)
                })
                .collect();
            for entity in entities {
                drawer.free_instance(entity, false);
            }
        });
    });
}

/// Full render pass over every entity.
fn bench_render_pass(c: &mut Criterion) {
    let drawer = populated(ENTITY_COUNT);

    c.bench_function("render_pass_10k", |b| {
        b.iter(|| black_box(drawer.advance_render(1.0 / 60.0)));
    });
}

/// Simulation tick: swap buffers, move everyone, classify facing.
fn bench_simulation_tick(c: &mut Criterion) {
    let drawer = populated(ENTITY_COUNT);

    c.bench_function("simulation_tick_10k", |b| {
        b.iter(|| {
            drawer.update_pos();
            drawer.advance_simulation();
        });
    });
}

criterion_group!(
    benches,
    bench_pool_churn,
    bench_spawn_free,
    bench_render_pass,
    bench_simulation_tick,
);

criterion_main!(benches);
