//! Farm controller driven by tabulated turbine types

use rustc_hash::FxHashMap;

use super::{slot_turbines, FarmController};
use crate::core_types::{variables as v, Axis, FarmData, ModelData, VarArray, VarMap};
use crate::error::{Result, WakeError};
use crate::farm::{TurbineType, WindFarm};

/// Evaluates each turbine's attached turbine-type models in order
///
/// Thrust and power follow from the rotor-equivalent wind speed through the
/// type's curves. With `pre_rotor` the ambient wind speed is used and the
/// `AMB_*` variables are written instead.
#[derive(Debug, Clone)]
pub struct BasicFarmController {
    types: FxHashMap<String, TurbineType>,
    turbine_models: Vec<Vec<String>>,
}

impl BasicFarmController {
    /// Create a controller for a farm
    ///
    /// # Arguments
    ///
    /// * `farm` - Wind farm whose turbines name their models
    /// * `types` - Turbine types available by name
    pub fn new(farm: &WindFarm, types: Vec<TurbineType>) -> Result<Self> {
        let types: FxHashMap<String, TurbineType> =
            types.into_iter().map(|t| (t.name.clone(), t)).collect();
        let mut turbine_models = Vec::with_capacity(farm.n_turbines());
        for turbine in farm.turbines() {
            for model in &turbine.models {
                if !types.contains_key(model) {
                    let mut available: Vec<String> = types.keys().cloned().collect();
                    available.sort();
                    return Err(WakeError::UnknownModel {
                        kind: "turbine model".to_string(),
                        name: model.clone(),
                        available,
                    });
                }
            }
            turbine_models.push(turbine.models.clone());
        }
        Ok(Self {
            types,
            turbine_models,
        })
    }

    /// Thrust and power of turbine `t` at rotor wind speed `ws`
    fn evaluate(&self, t: usize, ws: f64) -> Result<(f64, f64)> {
        let models = self.turbine_models.get(t).ok_or_else(|| {
            WakeError::shape_mismatch("turbine models", &[self.turbine_models.len()], &[t + 1])
        })?;
        let mut ct = 0.0;
        let mut power = 0.0;
        for name in models {
            if let Some(tt) = self.types.get(name) {
                ct = tt.ct(ws);
                power = tt.power(ws);
            }
        }
        Ok((ct, power))
    }
}

impl FarmController for BasicFarmController {
    fn name(&self) -> &str {
        "basic_ctrl"
    }

    fn output_farm_vars(&self) -> &[&'static str] {
        &[v::CT, v::P, v::AMB_CT, v::AMB_P]
    }

    fn calculate(
        &self,
        _mdata: &ModelData,
        fdata: &FarmData,
        pre_rotor: bool,
        downwind_index: Option<usize>,
    ) -> Result<VarMap> {
        let (ws_var, ct_var, p_var) = if pre_rotor {
            (v::AMB_REWS, v::AMB_CT, v::AMB_P)
        } else {
            (v::REWS, v::CT, v::P)
        };
        let n_states = fdata.n_states();
        let n_turbines = fdata.n_turbines();
        let dims = [Axis::State, Axis::Turbine];
        let shape = [n_states, n_turbines];
        let current = |name: &str| {
            fdata
                .get(name)
                .cloned()
                .unwrap_or_else(|| VarArray::nan(&dims, &shape))
        };
        let mut ct = current(ct_var);
        let mut power = current(p_var);
        let ws = fdata.var(ws_var)?;

        let mut set = |s: usize, t: usize| -> Result<()> {
            let (c, p) = self.evaluate(t, ws.get2(s, t))?;
            ct.set2(s, t, c);
            power.set2(s, t, p);
            Ok(())
        };
        match downwind_index {
            Some(slot) => {
                for (s, t) in slot_turbines(fdata, slot)?.into_iter().enumerate() {
                    set(s, t)?;
                }
            }
            None => {
                for s in 0..n_states {
                    for t in 0..n_turbines {
                        set(s, t)?;
                    }
                }
            }
        }

        let mut out = VarMap::default();
        out.insert(ct_var.to_string(), ct);
        out.insert(p_var.to_string(), power);
        Ok(out)
    }
}
