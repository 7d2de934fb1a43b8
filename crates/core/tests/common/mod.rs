//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard, PoisonError};

use farm_wakes_core::{
    add_grid, add_row, AlgorithmConfig, EngineConfig, EngineContext, FarmSetup, ModelBook, States,
    TurbineType, WindFarm,
};
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

static SERIAL: Mutex<()> = Mutex::new(());

/// Only one engine may be active per process; tests running engines hold
/// this guard for their whole body
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Engines and worker counts every engine-agnostic test runs on
pub const ENGINES: [(&str, usize); 5] = [
    ("single", 1),
    ("pool", 1),
    ("pool", 3),
    ("cluster", 1),
    ("cluster", 4),
];

/// Row of turbines along x, 500 m apart
pub fn row_farm(n_turbines: usize) -> WindFarm {
    let mut farm = WindFarm::new("row");
    add_row(&mut farm, [0.0, 0.0], [500.0, 0.0], n_turbines, &TurbineType::nrel_5mw());
    farm
}

/// 3 x 3 grid with 600 m spacing
pub fn grid_farm() -> WindFarm {
    let mut farm = WindFarm::new("grid");
    add_grid(
        &mut farm,
        [0.0, 0.0],
        [600.0, 0.0],
        [0.0, 600.0],
        3,
        3,
        &TurbineType::nrel_5mw(),
    );
    farm
}

/// Setup with the given wake models and centre partial wakes
pub fn setup_with(farm: WindFarm, states: States, wake_models: &[&str]) -> FarmSetup {
    let config = AlgorithmConfig::default().with_wake_models(wake_models);
    FarmSetup::from_config(farm, states, &config, &ModelBook::new()).unwrap()
}

/// Setup with the default configuration
pub fn setup(farm: WindFarm, states: States) -> FarmSetup {
    FarmSetup::from_config(farm, states, &AlgorithmConfig::default(), &ModelBook::new()).unwrap()
}

/// Active engine context
pub fn context(engine: &str, n_workers: usize) -> EngineContext {
    EngineContext::with_config(&EngineConfig::named(engine).with_workers(n_workers)).unwrap()
}

/// Active engine context with a fixed state chunk size
pub fn chunked_context(engine: &str, n_workers: usize, chunk_size_states: usize) -> EngineContext {
    EngineContext::with_config(
        &EngineConfig::named(engine)
            .with_workers(n_workers)
            .with_chunk_size_states(chunk_size_states),
    )
    .unwrap()
}
