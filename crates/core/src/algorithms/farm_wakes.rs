//! Wake accumulation over the turbines of a farm
//!
//! Turbines are visited in downwind order. At every slot the rotor values of
//! the turbine there are evaluated from the deltas added by earlier slots,
//! the farm controller updates its thrust and power and relaxation blends
//! them. Only then does the turbine add its wake to the other slots.

use rustc_hash::{FxBuildHasher, FxHashMap};

use super::{FarmSetup, URelax};
use crate::core_types::{variables as v, Axis, ChunkData, FarmData, ModelData, VarArray, VarMap};
use crate::engine::{DataCalcModel, OutputCoords, StoreFragment};
use crate::error::Result;
use crate::models::EvalPoints;

/// Inflow variables every farm calculation reads
const MODEL_INPUTS: [&str; 4] = [v::WS, v::WD, v::TI, v::RHO];

/// Replace NaN entries of a `(State, Turbine)` variable
///
/// `value(s, t)` supplies the replacement; a missing variable is created.
fn fill_nan<F>(fdata: &mut FarmData, var: &str, mut value: F) -> Result<()>
where
    F: FnMut(usize, usize) -> Result<f64>,
{
    let dims = [Axis::State, Axis::Turbine];
    let shape = [fdata.n_states(), fdata.n_turbines()];
    let mut array = fdata
        .remove(var)
        .unwrap_or_else(|| VarArray::nan(&dims, &shape));
    for s in 0..shape[0] {
        for t in 0..shape[1] {
            if array.get2(s, t).is_nan() {
                array.set2(s, t, value(s, t)?);
            }
        }
    }
    fdata.insert(var, array);
    Ok(())
}

/// Turbine-level wake calculation
#[derive(Debug, Clone, Default)]
pub struct FarmWakesCalculation {
    urelax: Option<URelax>,
}

impl FarmWakesCalculation {
    /// Single pass without relaxation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pass that relaxes the given variables against the chunk store
    #[must_use]
    pub fn with_urelax(urelax: URelax) -> Self {
        Self {
            urelax: Some(urelax),
        }
    }

    /// Names of the farm variables this calculation returns
    #[must_use]
    pub fn output_vars() -> Vec<String> {
        v::FARM_OUTPUTS.iter().map(ToString::to_string).collect()
    }

    fn ensure_ambient(setup: &FarmSetup, mdata: &ModelData, fdata: &mut FarmData) -> Result<()> {
        for var in MODEL_INPUTS {
            mdata.var(var)?;
        }
        if fdata.needs(v::ORDER) {
            let order = setup.wake_frame.calc_order(mdata, fdata)?;
            fdata.insert(v::ORDER, order);
        }

        // uniform inflow: every rotor sees the state values
        for (amb_var, state_var) in [(v::AMB_REWS, v::WS), (v::AMB_TI, v::TI), (v::AMB_RHO, v::RHO)] {
            if fdata.needs(amb_var) {
                let values = mdata.var(state_var)?;
                fill_nan(fdata, amb_var, |s, _| Ok(values.get1(s)))?;
            }
        }

        if fdata.needs(v::AMB_CT) || fdata.needs(v::AMB_P) {
            let res = setup.farm_controller.calculate(mdata, fdata, true, None)?;
            for (var, values) in res {
                fill_nan(fdata, &var, |s, t| Ok(values.get2(s, t)))?;
            }
        }

        for (var, amb_var) in [
            (v::REWS, v::AMB_REWS),
            (v::TI, v::AMB_TI),
            (v::RHO, v::AMB_RHO),
            (v::CT, v::AMB_CT),
            (v::P, v::AMB_P),
        ] {
            if fdata.needs(var) {
                let amb = fdata.var(amb_var)?.clone();
                fill_nan(fdata, var, |s, t| Ok(amb.get2(s, t)))?;
            }
        }
        Ok(())
    }
}

impl DataCalcModel for FarmWakesCalculation {
    fn name(&self) -> &str {
        "farm_wakes"
    }

    fn output_coords(&self) -> OutputCoords {
        OutputCoords::Farm
    }

    fn ensure_variables(&self, setup: &FarmSetup, chunk: &mut ChunkData) -> Result<()> {
        Self::ensure_ambient(setup, &chunk.mdata, &mut chunk.fdata)
    }

    fn calculate(
        &self,
        setup: &FarmSetup,
        chunk: &mut ChunkData,
        store: &mut StoreFragment,
    ) -> Result<VarMap> {
        let ChunkData { mdata, fdata, .. } = chunk;
        let n_turbines = fdata.n_turbines();
        let wake_frame = setup.wake_frame.as_ref();

        // shared partial wakes evaluate their points once
        let mut points: FxHashMap<String, EvalPoints> =
            FxHashMap::with_capacity_and_hasher(setup.wake_models.len(), FxBuildHasher);
        for entry in &setup.wake_models {
            let pwake = entry.partial_wakes.as_ref();
            if !points.contains_key(pwake.name()) {
                points.insert(pwake.name().to_string(), pwake.get_wake_points(mdata, fdata)?);
            }
        }

        for entry in &setup.wake_models {
            let pwake = entry.partial_wakes.as_ref();
            let wmodel = entry.model.as_ref();
            let Some(wpoints) = points.get(pwake.name()) else {
                continue;
            };
            let mut deltas = pwake.new_wake_deltas(wmodel, wpoints)?;

            for oi in 0..n_turbines {
                pwake.evaluate_results(mdata, fdata, wmodel, wpoints, oi, &deltas)?;
                let res = setup.farm_controller.calculate(mdata, fdata, false, Some(oi))?;
                fdata.update(res);

                if let Some(urelax) = &self.urelax {
                    urelax.apply(fdata, oi, store)?;
                }

                // the wake carries the final state of slot oi
                if oi > 0 {
                    pwake.contribute(mdata, fdata, wake_frame, wmodel, wpoints, oi, 0..oi, &mut deltas)?;
                }
                if oi + 1 < n_turbines {
                    pwake.contribute(
                        mdata,
                        fdata,
                        wake_frame,
                        wmodel,
                        wpoints,
                        oi,
                        oi + 1..n_turbines,
                        &mut deltas,
                    )?;
                }
            }
        }

        v::FARM_OUTPUTS
            .iter()
            .map(|&var| Ok((var.to_string(), fdata.var(var)?.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::AlgorithmConfig;
    use crate::core_types::{Data, DataKind};
    use crate::error::WakeError;
    use crate::farm::{add_row, States, TurbineType, WindFarm};
    use crate::models::ModelBook;

    fn setup(n: usize, wd: f64) -> FarmSetup {
        let mut farm = WindFarm::new("row");
        add_row(&mut farm, [0.0, 0.0], [500.0, 0.0], n, &TurbineType::nrel_5mw());
        FarmSetup::from_config(
            farm,
            States::uniform(9.0, wd, 0.05, 1.225),
            &AlgorithmConfig::default(),
            &ModelBook::new(),
        )
        .unwrap()
    }

    fn chunk(setup: &FarmSetup) -> ChunkData {
        let n = setup.n_states();
        ChunkData {
            mdata: Data::from_dataset(DataKind::Model, &setup.model_dataset(), 0..n, None).unwrap(),
            fdata: Data::from_dataset(DataKind::Farm, &setup.farm_dataset(), 0..n, None).unwrap(),
            tdata: None,
        }
    }

    #[test]
    fn test_ensure_variables_sets_ambient() {
        let setup = setup(2, 270.0);
        let mut chunk = chunk(&setup);
        FarmWakesCalculation::new()
            .ensure_variables(&setup, &mut chunk)
            .unwrap();
        let fdata = &chunk.fdata;
        assert_eq!(fdata.value(v::AMB_REWS, 0, 1).unwrap(), 9.0);
        assert_eq!(fdata.value(v::REWS, 0, 1).unwrap(), 9.0);
        assert_eq!(fdata.value(v::RHO, 0, 0).unwrap(), 1.225);
        let p_amb = TurbineType::nrel_5mw().power(9.0);
        assert_eq!(fdata.value(v::AMB_P, 0, 0).unwrap(), p_amb);
        assert_eq!(fdata.value(v::P, 0, 1).unwrap(), p_amb);
        assert_eq!(fdata.order(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_missing_model_variable() {
        let setup = setup(2, 270.0);
        let mut chunk = chunk(&setup);
        chunk.mdata.remove(v::RHO);
        let err = FarmWakesCalculation::new()
            .ensure_variables(&setup, &mut chunk)
            .unwrap_err();
        assert_eq!(err, WakeError::missing_variable(v::RHO, "model data"));
    }

    #[test]
    fn test_second_turbine_is_waked() {
        let setup = setup(2, 270.0);
        let mut chunk = chunk(&setup);
        let model = FarmWakesCalculation::new();
        model.ensure_variables(&setup, &mut chunk).unwrap();
        let res = model
            .calculate(&setup, &mut chunk, &mut StoreFragment::default())
            .unwrap();
        let rews = &res[v::REWS];
        assert_eq!(rews.get2(0, 0), 9.0);
        assert!(rews.get2(0, 1) < 9.0);
        assert!(res[v::P].get2(0, 1) < res[v::P].get2(0, 0));
        assert_eq!(res.len(), v::FARM_OUTPUTS.len());
    }

    #[test]
    fn test_single_turbine_unwaked() {
        let setup = setup(1, 270.0);
        let mut chunk = chunk(&setup);
        let model = FarmWakesCalculation::new();
        model.ensure_variables(&setup, &mut chunk).unwrap();
        let res = model
            .calculate(&setup, &mut chunk, &mut StoreFragment::default())
            .unwrap();
        assert_eq!(res[v::REWS].get2(0, 0), 9.0);
        assert_eq!(res[v::AMB_P].get2(0, 0), res[v::P].get2(0, 0));
    }
}
