//! Straight wakes along the state wind direction

use std::cmp::Ordering;

use super::{PointGrid, WakeFrame};
use crate::core_types::{variables as v, wind_direction_vector, Axis, FarmData, ModelData, Vec3, VarArray};
use crate::error::Result;

/// Wake frame with straight wakes aligned to the uniform wind direction
///
/// Turbines are ordered by their downwind coordinate; turbines at the same
/// downwind coordinate keep their index order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotorWakes;

impl RotorWakes {
    /// Downwind unit vector and crosswind unit vector of a state
    fn frame(mdata: &ModelData, s: usize) -> Result<(Vec3, Vec3)> {
        let n = wind_direction_vector(mdata.state_value(v::WD, s)?);
        let m = Vec3::new(-n.y, n.x, 0.0);
        Ok((n, m))
    }
}

impl WakeFrame for RotorWakes {
    fn name(&self) -> &str {
        "rotor_wakes"
    }

    fn calc_order(&self, mdata: &ModelData, fdata: &FarmData) -> Result<VarArray> {
        let n_states = fdata.n_states();
        let n_turbines = fdata.n_turbines();
        let xs = fdata.var(v::X)?;
        let ys = fdata.var(v::Y)?;

        let mut order = VarArray::zeros(&[Axis::State, Axis::Turbine], &[n_states, n_turbines]);
        let mut downwind = vec![0.0; n_turbines];
        let mut idx: Vec<usize> = Vec::with_capacity(n_turbines);
        for s in 0..n_states {
            let (n, _) = Self::frame(mdata, s)?;
            for t in 0..n_turbines {
                downwind[t] = n.x * xs.get2(s, t) + n.y * ys.get2(s, t);
            }
            idx.clear();
            idx.extend(0..n_turbines);
            idx.sort_by(|&a, &b| {
                match downwind[a].partial_cmp(&downwind[b]).unwrap_or(Ordering::Equal) {
                    Ordering::Equal => a.cmp(&b),
                    other => other,
                }
            });
            for (slot, &t) in idx.iter().enumerate() {
                order.set2(s, slot, t as f64);
            }
        }
        Ok(order)
    }

    fn get_wake_coos(
        &self,
        mdata: &ModelData,
        fdata: &FarmData,
        src_slot: usize,
        points: &PointGrid,
    ) -> Result<PointGrid> {
        let [n_states, n_targets, n_tpoints] = points.shape();
        let xs = fdata.var(v::X)?;
        let ys = fdata.var(v::Y)?;
        let hs = fdata.var(v::H)?;

        let mut coos = PointGrid::zeros(n_states, n_targets, n_tpoints);
        for s in 0..n_states {
            let src = fdata.order(s, src_slot)?;
            let hub = Vec3::new(xs.get2(s, src), ys.get2(s, src), hs.get2(s, src));
            let (n, m) = Self::frame(mdata, s)?;
            for t in 0..n_targets {
                for p in 0..n_tpoints {
                    let delta = points.get(s, t, p) - hub;
                    coos.set(s, t, p, Vec3::new(delta.dot(&n), delta.dot(&m), delta.z));
                }
            }
        }
        Ok(coos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{DataKind, Data};
    use crate::farm::{add_row, States, TurbineType, WindFarm};
    use approx::assert_relative_eq;

    fn chunk(wd: f64) -> (ModelData, FarmData) {
        let mut farm = WindFarm::new("row");
        add_row(&mut farm, [0.0, 0.0], [500.0, 0.0], 3, &TurbineType::nrel_5mw());
        let states = States::uniform(9.0, wd, 0.05, 1.225);
        let mdata = Data::from_dataset(DataKind::Model, &states.model_dataset(), 0..1, None).unwrap();
        let fdata = Data::from_dataset(DataKind::Farm, &farm.farm_dataset(1), 0..1, None).unwrap();
        (mdata, fdata)
    }

    #[test]
    fn test_order_follows_wind() {
        let (mdata, fdata) = chunk(270.0);
        let order = RotorWakes.calc_order(&mdata, &fdata).unwrap();
        assert_eq!(order.as_slice(), &[0.0, 1.0, 2.0]);

        let (mdata, fdata) = chunk(90.0);
        let order = RotorWakes.calc_order(&mdata, &fdata).unwrap();
        assert_eq!(order.as_slice(), &[2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_ties_keep_index_order() {
        // northerly wind across an east-west row
        let (mdata, fdata) = chunk(0.0);
        let order = RotorWakes.calc_order(&mdata, &fdata).unwrap();
        assert_eq!(order.as_slice(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_wake_coordinates() {
        let (mdata, mut fdata) = chunk(270.0);
        let order = RotorWakes.calc_order(&mdata, &fdata).unwrap();
        fdata.insert(v::ORDER, order);

        let mut points = PointGrid::zeros(1, 1, 1);
        points.set(0, 0, 0, Vec3::new(1000.0, 30.0, 100.0));
        let coos = RotorWakes.get_wake_coos(&mdata, &fdata, 0, &points).unwrap();
        let c = coos.get(0, 0, 0);
        assert_relative_eq!(c.x, 1000.0, epsilon = 1e-9);
        assert_relative_eq!(c.y.abs(), 30.0, epsilon = 1e-9);
        assert_relative_eq!(c.z, 10.0, epsilon = 1e-9);
    }
}
