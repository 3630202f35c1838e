//! # Control Cycle Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use comms_if::{eqpt::arm::ArmDems, eqpt::chassis::ChassisDems, tc::arm_ctrl::ArmPose};
use motion_lib::{
    arm_ctrl::perimeter_guard,
    arm_ctrl::ArmGeometry,
    data_store::DataStore,
    sim::SimPlant,
    CYCLE_PERIOD_S,
};

fn ctrl_cycle_benchmark(c: &mut Criterion) {
    // ---- Build a data store driving the arm and balancing ----

    let mut ds = DataStore::default();
    let mut sim = SimPlant::default();

    ds.request_arm_pose(ArmPose::Mid);
    ds.start_balance();

    // Let the vision history fill before measuring
    for _ in 0..100 {
        for v in sim.take_vision() {
            ds.add_vision_measurement(v);
        }
        ds.cycle(&sim.sens(), CYCLE_PERIOD_S);
        sim.step(&ds.arm_ctrl_output, &ds.chassis_ctrl_output, CYCLE_PERIOD_S);
    }

    let sens = sim.sens();

    // Bench one full control cycle
    c.bench_function("DataStore::cycle", |b| {
        b.iter(|| ds.cycle(&sens, CYCLE_PERIOD_S))
    });

    // Bench the plant on its own to separate it from the cycle in the executable's loop
    c.bench_function("SimPlant::step", |b| {
        b.iter(|| sim.step(&ArmDems::default(), &ChassisDems::default(), CYCLE_PERIOD_S))
    });

    let geometry = ArmGeometry::default();

    c.bench_function("perimeter_guard::evaluate", |b| {
        b.iter(|| perimeter_guard::evaluate(&geometry, 135.0, 100.0, 115.0, 75.0))
    });
}

criterion_group!(benches, ctrl_cycle_benchmark);
criterion_main!(benches);
