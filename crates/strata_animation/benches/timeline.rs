//! Per-frame cost of scrubbing a page worth of timelines

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_animation::{
    Easing, Position, PropertyPath, PropertySink, ScrollSpan, SinkError, Target, TimelineBuilder,
    TimelineEngine, Trigger, Tween,
};

/// Accepts every write
struct NullSink;

impl PropertySink for NullSink {
    fn write(&mut self, _: &Target, _: PropertyPath, value: f32) -> Result<(), SinkError> {
        black_box(value);
        Ok(())
    }

    fn read(&self, _: &Target, _: PropertyPath) -> Option<f32> {
        Some(0.0)
    }
}

fn engine(timelines: usize, keys: usize) -> TimelineEngine {
    let mut engine = TimelineEngine::new();
    for t in 0..timelines {
        let span = ScrollSpan::parse("top bottom", "bottom top").unwrap();
        let mut builder =
            TimelineBuilder::new(format!("section-{t}"), Trigger::scrubbed("section", span));
        for k in 0..keys {
            let target = Target::object(format!("mesh.{k}"));
            builder = builder.add(
                "rise",
                Tween::new(target, PropertyPath::PositionY, -1.0, 0.0)
                    .duration(1.0)
                    .ease(Easing::EaseInOutCubic),
                Position::At(k as f32 * 0.1),
            );
        }
        engine.add(builder.build().unwrap());
    }
    engine
}

fn bench_scrub(c: &mut Criterion) {
    let mut engine = engine(8, 20);
    let ids: Vec<_> = engine.ids().collect();
    let mut sink = NullSink;
    let mut frame = 0u32;

    c.bench_function("scrub_8x20", |b| {
        b.iter(|| {
            frame = frame.wrapping_add(1);
            let p = (frame % 120) as f32 / 120.0;
            for &id in &ids {
                engine.set_progress(id, p);
            }
            black_box(engine.advance(frame as f64 / 60.0, &mut sink))
        })
    });
}

criterion_group!(benches, bench_scrub);
criterion_main!(benches);
