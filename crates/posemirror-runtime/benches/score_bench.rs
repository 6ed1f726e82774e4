//! Benchmarks for the per-tick pipeline stages

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use posemirror_core::{Landmark, Rotation3D};
use posemirror_runtime::{
    MirrorConfig, MirrorSession, PoseScorer, RetargetConfig, Retargeter, ScorerConfig, TickInputs,
};
use posemirror_skeleton::Skeleton;
use posemirror_state::RotationTable;

const TICK: Duration = Duration::from_millis(16);

fn mixamo(name: &str) -> Skeleton {
    let mut skeleton = Skeleton::new(name);
    for side in ["Left", "Right"] {
        skeleton.ensure_path(&format!(
            "Armature/Hips/Spine/Spine1/Spine2/{side}Shoulder/{side}Arm/{side}ForeArm"
        ));
        skeleton.ensure_path(&format!("Armature/Hips/{side}UpLeg/{side}Leg"));
    }
    skeleton
}

fn posed_table() -> RotationTable {
    let table = RotationTable::new();
    for landmark in Landmark::all() {
        let angle = landmark.index() as f32 * 7.0;
        table.set(landmark, Rotation3D::from_axis_angle([0.3, 1.0, 0.1], angle));
    }
    table
}

fn bench_score_tick(c: &mut Criterion) {
    let live = mixamo("Live");
    let mut reference = mixamo("Reference");
    let mut scorer =
        PoseScorer::new(ScorerConfig::full_body(), Some(live.id()), Some(reference.id())).unwrap();
    scorer.tick(TICK, &live, &reference);

    let arm = reference
        .find("Armature/Hips/Spine/Spine1/Spine2/LeftShoulder/LeftArm")
        .unwrap();
    let mut angle = 0.0f32;

    c.bench_function("score_tick_13_bones", |b| {
        b.iter(|| {
            angle += 5.0;
            reference.set_local_rotation(arm, Rotation3D::from_axis_angle([0.0, 0.0, 1.0], angle));
            black_box(scorer.tick(TICK, &live, &reference))
        })
    });
}

fn bench_retarget_tick(c: &mut Criterion) {
    let table = posed_table();
    let mut live = mixamo("Live");
    let mut retargeter = Retargeter::new(RetargetConfig::default());

    c.bench_function("retarget_tick", |b| {
        b.iter(|| black_box(retargeter.tick(TICK, &table, Some(&mut live))))
    });
}

fn bench_session_tick(c: &mut Criterion) {
    let table = Arc::new(posed_table());
    let mut live = mixamo("Live");
    let reference = mixamo("Reference");
    let mut session = MirrorSession::new(MirrorConfig::default(), table)
        .with_scorer(Some(live.id()), Some(reference.id()));

    c.bench_function("session_tick", |b| {
        b.iter(|| {
            black_box(session.tick(
                TICK,
                TickInputs {
                    live: Some(&mut live),
                    reference: Some(&reference),
                    ..TickInputs::default()
                },
            ))
        })
    });
}

criterion_group!(
    benches,
    bench_score_tick,
    bench_retarget_tick,
    bench_session_tick
);
criterion_main!(benches);
