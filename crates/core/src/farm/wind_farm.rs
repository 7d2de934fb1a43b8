//! Turbines, wind farms and layout helpers

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core_types::{variables as v, Axis, Dataset, VarArray};

use super::TurbineType;

/// A single wind turbine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turbine {
    /// Stable index within the farm, assigned on insertion
    pub index: usize,
    /// Turbine name, defaults to `T<index>`
    pub name: String,
    /// Horizontal position (m)
    pub xy: [f64; 2],
    /// Hub height (m)
    pub hub_height: f64,
    /// Rotor diameter (m)
    pub diameter: f64,
    /// Name of the turbine type
    pub turbine_type: String,
    /// Turbine models evaluated by the farm controller, in order
    pub models: Vec<String>,
}

impl Turbine {
    /// Create a turbine of a given type at a position
    ///
    /// Diameter and hub height are taken from the type; the type is the
    /// only attached model.
    #[must_use]
    pub fn new(xy: [f64; 2], turbine_type: &TurbineType) -> Self {
        Self {
            index: 0,
            name: String::new(),
            xy,
            hub_height: turbine_type.hub_height,
            diameter: turbine_type.diameter,
            turbine_type: turbine_type.name.clone(),
            models: vec![turbine_type.name.clone()],
        }
    }

    /// Builder-style name override
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A collection of turbines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindFarm {
    /// Farm name
    pub name: String,
    turbines: Vec<Turbine>,
}

impl WindFarm {
    /// Create an empty farm
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            turbines: Vec::new(),
        }
    }

    /// Add a turbine, assigning its index (and default name)
    ///
    /// # Returns
    ///
    /// Index of the new turbine
    pub fn add_turbine(&mut self, mut turbine: Turbine) -> usize {
        let index = self.turbines.len();
        turbine.index = index;
        if turbine.name.is_empty() {
            turbine.name = format!("T{index}");
        }
        debug!(
            "Farm '{}': turbine {} '{}' at ({:.1}, {:.1})",
            self.name, index, turbine.name, turbine.xy[0], turbine.xy[1]
        );
        self.turbines.push(turbine);
        index
    }

    /// All turbines in index order
    #[must_use]
    pub fn turbines(&self) -> &[Turbine] {
        &self.turbines
    }

    /// Number of turbines
    #[must_use]
    pub fn n_turbines(&self) -> usize {
        self.turbines.len()
    }

    /// Turbine geometry as `(State, Turbine)` arrays `X`, `Y`, `H`, `D`
    ///
    /// Positions do not vary by state; the state axis is present so the
    /// arrays chunk the same way as every other farm variable.
    #[must_use]
    pub fn farm_dataset(&self, n_states: usize) -> Dataset {
        let n = self.n_turbines();
        let dims = [Axis::State, Axis::Turbine];
        let shape = [n_states, n];
        let mut x = VarArray::zeros(&dims, &shape);
        let mut y = VarArray::zeros(&dims, &shape);
        let mut h = VarArray::zeros(&dims, &shape);
        let mut d = VarArray::zeros(&dims, &shape);
        for s in 0..n_states {
            for t in &self.turbines {
                x.set2(s, t.index, t.xy[0]);
                y.set2(s, t.index, t.xy[1]);
                h.set2(s, t.index, t.hub_height);
                d.set2(s, t.index, t.diameter);
            }
        }
        Dataset::new((0..n_states).collect())
            .with_var(v::X, x)
            .with_var(v::Y, y)
            .with_var(v::H, h)
            .with_var(v::D, d)
    }
}

/// Add a straight row of turbines
///
/// # Arguments
///
/// * `farm` - Farm to extend
/// * `xy_base` - Position of the first turbine
/// * `xy_step` - Offset between neighbouring turbines
/// * `n_turbines` - Number of turbines to add
/// * `turbine_type` - Type of every turbine in the row
pub fn add_row(
    farm: &mut WindFarm,
    xy_base: [f64; 2],
    xy_step: [f64; 2],
    n_turbines: usize,
    turbine_type: &TurbineType,
) {
    for i in 0..n_turbines {
        let f = i as f64;
        let xy = [xy_base[0] + f * xy_step[0], xy_base[1] + f * xy_step[1]];
        farm.add_turbine(Turbine::new(xy, turbine_type));
    }
}

/// Add a regular rectangular grid of turbines, rows along `step_a`
pub fn add_grid(
    farm: &mut WindFarm,
    xy_base: [f64; 2],
    step_a: [f64; 2],
    step_b: [f64; 2],
    n_a: usize,
    n_b: usize,
    turbine_type: &TurbineType,
) {
    for j in 0..n_b {
        let g = j as f64;
        let row_base = [xy_base[0] + g * step_b[0], xy_base[1] + g * step_b[1]];
        add_row(farm, row_base, step_a, n_a, turbine_type);
    }
}
