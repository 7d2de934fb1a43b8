//! Wake effects at arbitrary target points

use super::FarmSetup;
use crate::core_types::{
    variables as v, Axis, ChunkData, Dataset, ModelData, TargetData, Vec3, VarArray, VarMap,
};
use crate::engine::{DataCalcModel, OutputCoords, StoreFragment};
use crate::error::{Result, WakeError};
use crate::models::{EvalPoints, PointGrid};

/// Point dataset with one point per target
///
/// # Arguments
///
/// * `n_states` - Number of states; points do not vary by state
/// * `points` - Target positions `(x, y, z)`
#[must_use]
pub fn points_dataset(n_states: usize, points: &[Vec3]) -> Dataset {
    let dims = [Axis::State, Axis::Target, Axis::TPoint];
    let shape = [n_states, points.len(), 1];
    let mut xs = VarArray::zeros(&dims, &shape);
    let mut ys = VarArray::zeros(&dims, &shape);
    let mut zs = VarArray::zeros(&dims, &shape);
    for s in 0..n_states {
        for (t, p) in points.iter().enumerate() {
            xs.set3(s, t, 0, p.x);
            ys.set3(s, t, 0, p.y);
            zs.set3(s, t, 0, p.z);
        }
    }
    Dataset::new((0..n_states).collect())
        .with_var(v::X, xs)
        .with_var(v::Y, ys)
        .with_var(v::Z, zs)
}

/// Waked wind speed and turbulence at target points
///
/// Needs converged farm results (order, thrust, rotor wind speed) in the
/// farm data; every turbine adds its wake to every point.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointWakesCalculation;

impl PointWakesCalculation {
    /// Names of the point variables this calculation returns
    #[must_use]
    pub fn output_vars() -> Vec<String> {
        v::POINT_OUTPUTS.iter().map(ToString::to_string).collect()
    }

    fn grid(tdata: &TargetData) -> Result<PointGrid> {
        let xs = tdata.var(v::X)?;
        let ys = tdata.var(v::Y)?;
        let zs = tdata.var(v::Z)?;
        let [n_states, n_targets, n_tpoints] = match *xs.shape() {
            [a, b, c] => [a, b, c],
            _ => {
                return Err(WakeError::shape_mismatch(
                    "target point coordinates",
                    &[tdata.n_states(), tdata.n_targets(), 1],
                    xs.shape(),
                ))
            }
        };
        let mut grid = PointGrid::zeros(n_states, n_targets, n_tpoints);
        for s in 0..n_states {
            for t in 0..n_targets {
                for p in 0..n_tpoints {
                    grid.set(
                        s,
                        t,
                        p,
                        Vec3::new(xs.get3(s, t, p), ys.get3(s, t, p), zs.get3(s, t, p)),
                    );
                }
            }
        }
        Ok(grid)
    }

    fn ensure_ambient(mdata: &ModelData, tdata: &mut TargetData) -> Result<()> {
        let shape = tdata.var(v::X)?.shape().to_vec();
        let dims = [Axis::State, Axis::Target, Axis::TPoint];
        for (amb_var, state_var) in [(v::AMB_WS, v::WS), (v::AMB_TI, v::TI)] {
            if !tdata.needs(amb_var) {
                continue;
            }
            let values = mdata.var(state_var)?;
            let mut array = tdata
                .remove(amb_var)
                .unwrap_or_else(|| VarArray::nan(&dims, &shape));
            for (s, row) in array.as_mut_slice().chunks_mut(shape[1] * shape[2]).enumerate() {
                for x in row.iter_mut().filter(|x| x.is_nan()) {
                    *x = values.get1(s);
                }
            }
            tdata.insert(amb_var, array);
        }
        Ok(())
    }
}

impl DataCalcModel for PointWakesCalculation {
    fn name(&self) -> &str {
        "point_wakes"
    }

    fn output_coords(&self) -> OutputCoords {
        OutputCoords::Points
    }

    fn ensure_variables(&self, setup: &FarmSetup, chunk: &mut ChunkData) -> Result<()> {
        let ChunkData { mdata, fdata, tdata } = chunk;
        let tdata = tdata
            .as_mut()
            .ok_or_else(|| WakeError::missing_variable(v::X, "target data"))?;
        if fdata.needs(v::ORDER) {
            let order = setup.wake_frame.calc_order(mdata, fdata)?;
            fdata.insert(v::ORDER, order);
        }
        Self::ensure_ambient(mdata, tdata)
    }

    fn calculate(
        &self,
        setup: &FarmSetup,
        chunk: &mut ChunkData,
        _store: &mut StoreFragment,
    ) -> Result<VarMap> {
        let ChunkData { mdata, fdata, tdata } = chunk;
        let tdata = tdata
            .as_ref()
            .ok_or_else(|| WakeError::missing_variable(v::X, "target data"))?;
        let grid = Self::grid(tdata)?;
        let n_tpoints = grid.n_tpoints();
        let points = EvalPoints {
            target_axis: Axis::Target,
            grid,
            weights: vec![1.0 / n_tpoints.max(1) as f64; n_tpoints],
        };

        let mut amb = VarMap::default();
        amb.insert(v::WS.to_string(), tdata.var(v::AMB_WS)?.clone());
        amb.insert(v::TI.to_string(), tdata.var(v::AMB_TI)?.clone());
        let mut waked = amb.clone();

        let n_turbines = fdata.n_turbines();
        for entry in &setup.wake_models {
            let wmodel = entry.model.as_ref();
            let mut deltas = wmodel.new_wake_deltas(&points);
            points.check_deltas(wmodel.name(), &deltas)?;
            for slot in 0..n_turbines {
                let coos = setup.wake_frame.get_wake_coos(mdata, fdata, slot, &points.grid)?;
                wmodel.contribute_at_points(mdata, fdata, slot, &coos, &mut deltas)?;
            }
            points.check_deltas(wmodel.name(), &deltas)?;

            for (var, delta) in wmodel.finalize_wake_deltas(&amb, &deltas)? {
                let values = waked
                    .get_mut(&var)
                    .ok_or_else(|| WakeError::missing_variable(&var, "point variables"))?;
                for (value, d) in values.as_mut_slice().iter_mut().zip(delta.as_slice()) {
                    *value += d;
                }
            }
        }

        let mut out = VarMap::default();
        if let Some(ws) = waked.remove(v::WS) {
            out.insert(v::WS.to_string(), ws);
        }
        if let Some(ti) = waked.remove(v::TI) {
            out.insert(v::TI.to_string(), ti);
        }
        for (amb_var, var) in [(v::AMB_WS, v::WS), (v::AMB_TI, v::TI)] {
            if let Some(values) = amb.remove(var) {
                out.insert(amb_var.to_string(), values);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_dataset_layout() {
        let ds = points_dataset(2, &[Vec3::new(1.0, 2.0, 90.0), Vec3::new(3.0, 4.0, 90.0)]);
        let x = ds.var(v::X).unwrap();
        assert_eq!(x.shape(), &[2, 2, 1]);
        assert_eq!(x.get3(1, 1, 0), 3.0);
        assert_eq!(ds.var(v::Z).unwrap().get3(0, 0, 0), 90.0);
        assert_eq!(ds.states(), &[0, 1]);
    }
}
