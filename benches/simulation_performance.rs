use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ring_traffic_sim::{
    compute::{CpuBackend, SimulationBackend},
    config::{IntegrationScheme, SimulationConfig, UpdatePolicy},
    simulation::SimulationState,
    Scheduler,
};

fn seeded_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.random.seed = Some(42);
    config
}

fn benchmark_scheduler_frame(c: &mut Criterion) {
    let mut scheduler = Scheduler::new(seeded_config()).expect("default ring");

    // Let the platoon get moving before measuring
    for _ in 0..50 {
        scheduler.frame();
    }

    c.bench_function("scheduler_frame", |b| {
        b.iter(|| {
            black_box(scheduler.frame());
        })
    });
}

fn benchmark_backend_schemes(c: &mut Criterion) {
    let mut group = c.benchmark_group("backend_step");

    for (label, scheme, policy) in [
        ("euler_sequential", IntegrationScheme::Euler, UpdatePolicy::Sequential),
        ("euler_synchronous", IntegrationScheme::Euler, UpdatePolicy::Synchronous),
        ("rk4_sequential", IntegrationScheme::Rk4, UpdatePolicy::Sequential),
    ] {
        let mut config = seeded_config();
        config.solver.scheme = scheme;
        config.solver.update_policy = policy;

        let mut backend = CpuBackend::new(&config.solver);
        let mut state = SimulationState::new(config.ring.clone(), config.solver.dt());
        state.rebuild(config.vehicles.count, config.vehicles.human).expect("default ring");

        group.bench_function(label, |b| {
            b.iter(|| {
                backend.update(black_box(&mut state));
            })
        });
    }

    group.finish();
}

fn benchmark_ring_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_scaling");

    for vehicle_count in [10, 30, 60].iter() {
        let mut config = seeded_config();
        config.vehicles.count = *vehicle_count;
        let mut scheduler = Scheduler::new(config).expect("scaled ring");

        group.bench_with_input(
            format!("cpu_{}_vehicles", vehicle_count),
            vehicle_count,
            |b, _vehicle_count| {
                b.iter(|| {
                    scheduler.step();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_scheduler_frame,
    benchmark_backend_schemes,
    benchmark_ring_scaling
);
criterion_main!(benches);
