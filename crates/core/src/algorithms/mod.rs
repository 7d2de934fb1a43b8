//! Farm calculation algorithms
//!
//! - [`Downwind`]: one pass over the turbines in downwind order, plus
//!   evaluation at arbitrary target points
//! - [`Iterative`]: repeated passes with under-relaxation until the farm
//!   results converge
//!
//! Both run their chunk calculations on the engine of an
//! [`EngineContext`](crate::engine::EngineContext).

mod config;
mod downwind;
mod farm_wakes;
mod iterative;
mod point_wakes;
mod setup;
mod urelax;

pub use config::AlgorithmConfig;
pub use downwind::Downwind;
pub use farm_wakes::FarmWakesCalculation;
pub use iterative::{max_abs_change, Iterative};
pub use point_wakes::{points_dataset, PointWakesCalculation};
pub use setup::{FarmSetup, WakeModelEntry};
pub use urelax::URelax;
