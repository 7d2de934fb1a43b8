//! Core types and utilities

pub mod array;
pub mod axis;
pub mod data;
pub mod dataset;
pub mod variables;
pub mod vec3;

pub use array::VarArray;
pub use axis::Axis;
pub use data::{ChunkData, Data, DataKind, FarmData, ModelData, TargetData};
pub use dataset::{Dataset, VarMap};
pub use vec3::{wind_direction_vector, Vec3};
