//! Under-relaxation of farm variables between iterations

use crate::core_types::{Axis, FarmData, VarArray};
use crate::engine::StoreFragment;
use crate::error::Result;
use crate::models::slot_turbines;

/// Blends freshly computed farm values with the previous iteration's values
///
/// For a factor `r`, the kept value is `(1 - r) * new + r * previous`. The
/// previous values live in the chunk-store fragment under the variable name,
/// so they follow the chunk from one iteration to the next.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct URelax {
    factors: Vec<(String, f64)>,
}

impl URelax {
    /// Create from `(variable, factor)` pairs, each factor in `[0, 1)`
    #[must_use]
    pub fn new(factors: Vec<(String, f64)>) -> Self {
        Self { factors }
    }

    /// Relaxed variables and their factors
    #[must_use]
    pub fn factors(&self) -> &[(String, f64)] {
        &self.factors
    }

    /// Relax the turbines at a downwind slot
    ///
    /// # Arguments
    ///
    /// * `fdata` - Farm data holding the new values; receives the blend
    /// * `slot` - Downwind slot whose turbines are relaxed
    /// * `fragment` - Chunk-store fragment holding the previous values;
    ///   receives the blend for the next iteration
    pub fn apply(&self, fdata: &mut FarmData, slot: usize, fragment: &mut StoreFragment) -> Result<()> {
        let turbines = slot_turbines(fdata, slot)?;
        let dims = [Axis::State, Axis::Turbine];
        let shape = [fdata.n_states(), fdata.n_turbines()];
        for (var, r) in &self.factors {
            let values = fdata.var_mut(var)?;
            let previous = fragment
                .entry(var.clone())
                .or_insert_with(|| VarArray::nan(&dims, &shape));
            for (s, &t) in turbines.iter().enumerate() {
                let new = values.get2(s, t);
                let prev = previous.get2(s, t);
                let blended = if prev.is_nan() {
                    new
                } else {
                    (1.0 - r) * new + r * prev
                };
                values.set2(s, t, blended);
                previous.set2(s, t, blended);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{variables as v, Data, DataKind};
    use approx::assert_relative_eq;

    fn fdata(ct: [f64; 2]) -> FarmData {
        let mut data = Data::new(DataKind::Farm, 0, 1);
        data.insert(
            v::ORDER,
            VarArray::new(&[Axis::State, Axis::Turbine], &[1, 2], vec![1.0, 0.0]).unwrap(),
        );
        data.insert(
            v::CT,
            VarArray::new(&[Axis::State, Axis::Turbine], &[1, 2], ct.to_vec()).unwrap(),
        );
        data
    }

    #[test]
    fn test_first_pass_keeps_new_value() {
        let urelax = URelax::new(vec![(v::CT.to_string(), 0.5)]);
        let mut data = fdata([0.8, 0.6]);
        let mut fragment = StoreFragment::default();
        urelax.apply(&mut data, 0, &mut fragment).unwrap();
        // slot 0 is turbine 1
        assert_eq!(data.value(v::CT, 0, 1).unwrap(), 0.6);
        assert_eq!(fragment[v::CT].get2(0, 1), 0.6);
        assert!(fragment[v::CT].get2(0, 0).is_nan());
    }

    #[test]
    fn test_blends_with_previous() {
        let urelax = URelax::new(vec![(v::CT.to_string(), 0.25)]);
        let mut fragment = StoreFragment::default();
        urelax.apply(&mut fdata([0.8, 0.4]), 1, &mut fragment).unwrap();

        let mut data = fdata([0.0, 0.4]);
        urelax.apply(&mut data, 1, &mut fragment).unwrap();
        assert_relative_eq!(data.value(v::CT, 0, 0).unwrap(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(fragment[v::CT].get2(0, 0), 0.2, epsilon = 1e-12);
    }
}
