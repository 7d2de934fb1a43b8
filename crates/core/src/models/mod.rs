//! Physics collaborators of the wake calculation
//!
//! The wake accumulation is written against the traits in this module. One
//! small implementation of each kind ships with the crate, and
//! [`ModelBook`] resolves them by name.

mod crespo_hernandez;
mod farm_controller;
mod jensen;
pub mod model_book;
mod points;
mod rotor_points;
mod superposition;
mod r#trait;
pub mod top_hat;
mod wake_frame;

pub use crespo_hernandez::CrespoHernandezTi;
pub use farm_controller::BasicFarmController;
pub use jensen::{JensenWake, JENSEN_K};
pub use model_book::{ModelBook, Registry};
pub use points::{EvalPoints, PointGrid, WakeDeltas};
pub use r#trait::{
    delta_mut, slot_turbines, FarmController, PartialWakes, WakeFrame, WakeModel,
    WakeSuperposition,
};
pub use rotor_points::RotorPoints;
pub use superposition::{DeltaKind, LinearSuperposition, MaxSuperposition, QuadraticSuperposition};
pub use wake_frame::RotorWakes;
