//! Partial wakes evaluated at discrete rotor points

use std::ops::Range;

use super::{slot_turbines, EvalPoints, PartialWakes, PointGrid, WakeDeltas, WakeFrame, WakeModel};
use crate::core_types::{
    variables as v, wind_direction_vector, Axis, FarmData, ModelData, Vec3, VarArray, VarMap,
};
use crate::error::{Result, WakeError};

/// Farm variable holding the rotor average of a point variable
fn rotor_var(var: &str) -> Result<&'static str> {
    match var {
        v::WS => Ok(v::REWS),
        v::TI => Ok(v::TI),
        other => Err(WakeError::missing_variable(other, "rotor variables")),
    }
}

/// Farm variable holding the ambient value of a point variable
fn rotor_amb_var(var: &str) -> Result<&'static str> {
    match var {
        v::WS => Ok(v::AMB_REWS),
        v::TI => Ok(v::AMB_TI),
        other => Err(WakeError::missing_variable(other, "ambient rotor variables")),
    }
}

/// Rotor sampled at equally weighted points in the rotor plane
///
/// `centre` uses the hub only; `grid<n2>` lays an `n x n` grid over the
/// rotor's bounding square and keeps the points inside the disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RotorPoints {
    name: String,
    /// Offsets `(crosswind, vertical)` in rotor diameters
    offsets: Vec<(f64, f64)>,
}

impl RotorPoints {
    /// Hub-only rotor
    #[must_use]
    pub fn centre() -> Self {
        Self {
            name: "centre".to_string(),
            offsets: vec![(0.0, 0.0)],
        }
    }

    /// Regular grid over the rotor disk
    ///
    /// # Arguments
    ///
    /// * `n` - Points per grid side, the name is `grid<n*n>`
    #[must_use]
    pub fn grid(n: usize) -> Self {
        let n = n.max(1);
        let step = 1.0 / n as f64;
        let mut offsets = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                let y = -0.5 + (i as f64 + 0.5) * step;
                let z = -0.5 + (j as f64 + 0.5) * step;
                if y.hypot(z) <= 0.5 {
                    offsets.push((y, z));
                }
            }
        }
        Self {
            name: format!("grid{}", n * n),
            offsets,
        }
    }

    /// Number of points per rotor
    #[must_use]
    pub fn n_points(&self) -> usize {
        self.offsets.len()
    }

    /// Rows `[s, order[s][slot], ..]` of every delta array
    fn slot_rows(deltas: &WakeDeltas, turbines: &[usize], n_points: usize) -> VarMap {
        let dims = [Axis::State, Axis::Turbine, Axis::TPoint];
        let shape = [turbines.len(), 1, n_points];
        let mut rows = VarMap::default();
        for (var, array) in deltas {
            let mut row = VarArray::zeros(&dims, &shape);
            for (s, &t) in turbines.iter().enumerate() {
                row.row3_mut(s, 0).copy_from_slice(array.row3(s, t));
            }
            rows.insert(var.clone(), row);
        }
        rows
    }
}

impl PartialWakes for RotorPoints {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_wake_points(&self, mdata: &ModelData, fdata: &FarmData) -> Result<EvalPoints> {
        let n_states = fdata.n_states();
        let n_turbines = fdata.n_turbines();
        let n_points = self.n_points();
        let xs = fdata.var(v::X)?;
        let ys = fdata.var(v::Y)?;
        let hs = fdata.var(v::H)?;
        let ds = fdata.var(v::D)?;

        let mut grid = PointGrid::zeros(n_states, n_turbines, n_points);
        for s in 0..n_states {
            let n = wind_direction_vector(mdata.state_value(v::WD, s)?);
            let m = Vec3::new(-n.y, n.x, 0.0);
            for t in 0..n_turbines {
                let hub = Vec3::new(xs.get2(s, t), ys.get2(s, t), hs.get2(s, t));
                let d = ds.get2(s, t);
                for (p, &(oy, oz)) in self.offsets.iter().enumerate() {
                    grid.set(s, t, p, hub + d * (oy * m + oz * Vec3::z()));
                }
            }
        }

        let weight = 1.0 / n_points as f64;
        Ok(EvalPoints {
            target_axis: Axis::Turbine,
            grid,
            weights: vec![weight; n_points],
        })
    }

    fn contribute(
        &self,
        mdata: &ModelData,
        fdata: &FarmData,
        wake_frame: &dyn WakeFrame,
        wake_model: &dyn WakeModel,
        points: &EvalPoints,
        src_slot: usize,
        target_slots: Range<usize>,
        deltas: &mut WakeDeltas,
    ) -> Result<()> {
        let targets: Vec<Vec<usize>> = (0..fdata.n_states())
            .map(|s| {
                target_slots
                    .clone()
                    .map(|slot| fdata.order(s, slot))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<_>>()?;
        let wake_coos = wake_frame.get_wake_coos(mdata, fdata, src_slot, &points.grid)?;
        wake_model.contribute_at_rotors(mdata, fdata, src_slot, &wake_coos, &targets, deltas)?;
        points.check_deltas(wake_model.name(), deltas)
    }

    fn finalize_wakes(
        &self,
        _mdata: &ModelData,
        fdata: &FarmData,
        wake_model: &dyn WakeModel,
        points: &EvalPoints,
        slot: usize,
        deltas: &WakeDeltas,
    ) -> Result<VarMap> {
        points.check_deltas(wake_model.name(), deltas)?;
        let turbines = slot_turbines(fdata, slot)?;
        let n_points = points.grid.n_tpoints();
        let raw = Self::slot_rows(deltas, &turbines, n_points);

        // uniform inflow: every rotor point sees the rotor's ambient value
        let mut amb = VarMap::default();
        for (var, row) in &raw {
            let amb_var = fdata.var(rotor_amb_var(var)?)?;
            let mut values = VarArray::zeros(row.dims(), row.shape());
            for (s, &t) in turbines.iter().enumerate() {
                values.row3_mut(s, 0).fill(amb_var.get2(s, t));
            }
            amb.insert(var.clone(), values);
        }

        let final_deltas = wake_model.finalize_wake_deltas(&amb, &raw)?;
        let mut waked = amb;
        for (var, delta) in final_deltas {
            if let Some(values) = waked.get_mut(&var) {
                for (value, d) in values.as_mut_slice().iter_mut().zip(delta.as_slice()) {
                    *value += d;
                }
            }
        }
        Ok(waked)
    }

    fn evaluate_results(
        &self,
        mdata: &ModelData,
        fdata: &mut FarmData,
        wake_model: &dyn WakeModel,
        points: &EvalPoints,
        slot: usize,
        deltas: &WakeDeltas,
    ) -> Result<()> {
        let waked = self.finalize_wakes(mdata, fdata, wake_model, points, slot, deltas)?;
        let turbines = slot_turbines(fdata, slot)?;
        for (var, values) in &waked {
            let target = fdata.var_mut(rotor_var(var)?)?;
            for (s, &t) in turbines.iter().enumerate() {
                let mean: f64 = values
                    .row3(s, 0)
                    .iter()
                    .zip(&points.weights)
                    .map(|(value, w)| value * w)
                    .sum();
                target.set2(s, t, mean);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_centre_is_single_point() {
        let rp = RotorPoints::centre();
        assert_eq!(rp.n_points(), 1);
        assert_eq!(rp.name(), "centre");
    }

    #[test]
    fn test_grid_points_inside_disk() {
        let rp = RotorPoints::grid(4);
        assert_eq!(rp.name(), "grid16");
        // corners of a 4x4 grid fall outside the disk
        assert_eq!(rp.n_points(), 12);
        assert!(rp.offsets.iter().all(|&(y, z)| y.hypot(z) <= 0.5));
        let total: f64 = (0..rp.n_points()).map(|_| 1.0 / rp.n_points() as f64).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }
}
