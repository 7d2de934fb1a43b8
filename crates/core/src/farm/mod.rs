//! Wind farm description: turbines, layouts, turbine types and inflow states

pub mod states;
pub mod turbine_type;
pub mod wind_farm;

pub use states::{State, States, RHO_STANDARD};
pub use turbine_type::TurbineType;
pub use wind_farm::{add_grid, add_row, Turbine, WindFarm};
