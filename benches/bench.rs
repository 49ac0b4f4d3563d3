use copters::pdlp::{ConstraintSense, LpInstance, PdlpCore, PdlpTunables};
use copters::SolverOptions;

fn trivial_1x1() -> LpInstance {
    // min x s.t. x >= 1, 0 <= x <= 10
    LpInstance::new(
        &[1.0],
        &[0.0],
        &[10.0],
        &[1.0],
        &[0],
        &[0],
        &[ConstraintSense::GreaterEqual],
        &[1.0],
        true,
        0.0,
    )
    .unwrap()
}

#[divan::bench]
fn trivial_1x1_to_optimal() {
    let instance = divan::black_box(trivial_1x1());
    let mut core = PdlpCore::setup(&instance, PdlpTunables::new(&SolverOptions::new())).unwrap();
    core.run().unwrap();
    divan::black_box(core.result());
}

fn main() {
    divan::main();
}
