//! Wind Farm Wake Calculation Core Library
//!
//! Computes how the wakes of upstream turbines reduce the wind speed and
//! raise the turbulence seen by downstream turbines, for many inflow states
//! at once. The state axis (and, for point calculations, the target axis) is
//! split into chunks that are computed independently by an execution engine.
//!
//! ## Structure
//!
//! - `core_types`: named arrays, datasets and per-chunk data containers
//! - `farm`: turbines, layouts, turbine types and inflow states
//! - `models`: wake frames, wake models, superpositions, partial wakes and
//!   the farm controller, resolved by name through [`ModelBook`]
//! - `engine`: chunk planning, the chunk store and the `single`, `pool` and
//!   `cluster` engines
//! - `algorithms`: the wake accumulation and the [`Downwind`] and
//!   [`Iterative`] algorithms
//!
//! ## Example
//!
//! ```rust,ignore
//! use farm_wakes_core::*;
//!
//! let book = ModelBook::new();
//! let mut farm = WindFarm::new("row");
//! add_row(&mut farm, [0.0, 0.0], [500.0, 0.0], 3, &TurbineType::nrel_5mw());
//! let states = States::uniform(9.0, 270.0, 0.05, RHO_STANDARD);
//! let setup = FarmSetup::from_config(farm, states, &AlgorithmConfig::default(), &book)?;
//!
//! let mut ctx = EngineContext::with_config(&EngineConfig::named("pool"))?;
//! let results = Downwind::new(setup).calc_farm(&ctx)?;
//! ctx.finalize()?;
//! ```

// Core types and utilities
pub mod core_types;
pub mod error;

// Farm description and physics models
pub mod farm;
pub mod models;

// Execution and algorithms
pub mod algorithms;
pub mod engine;

// Re-export core types
pub use core_types::{variables, Axis, Dataset, VarArray, VarMap, Vec3};
pub use error::{Result, WakeError};

// Re-export farm and model types
pub use farm::{add_grid, add_row, State, States, Turbine, TurbineType, WindFarm, RHO_STANDARD};
pub use models::ModelBook;

// Re-export engine and algorithm types
pub use algorithms::{
    points_dataset, AlgorithmConfig, Downwind, FarmSetup, Iterative, PointWakesCalculation,
};
pub use engine::{active_engine, create_engine, ChunkStore, EngineConfig, EngineContext};
