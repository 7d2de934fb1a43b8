//! Named array axes

use serde::{Deserialize, Serialize};

/// Named axis of a [`VarArray`](super::VarArray)
///
/// Arrays carry their axes by name so chunk slicing and recombination can
/// address "the state axis" without knowing each variable's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    /// Atmospheric states
    State,
    /// Turbines of the wind farm
    Turbine,
    /// Target locations of a point calculation
    Target,
    /// Evaluation points per target (rotor points, or 1 for plain points)
    TPoint,
}

impl Axis {
    /// Short lowercase name, as used in log output
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Axis::State => "state",
            Axis::Turbine => "turbine",
            Axis::Target => "target",
            Axis::TPoint => "tpoint",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
