//! Shared machinery for top-hat wake models
//!
//! A top-hat wake has a constant delta across a circular cross section whose
//! radius grows with downwind distance. Points upstream of the source, or
//! outside the wake radius, receive nothing.

use super::{delta_mut, PointGrid, WakeDeltas, WakeSuperposition};
use crate::core_types::{variables as v, FarmData, VarArray, VarMap};
use crate::error::{Result, WakeError};

/// Farm values of a wake source turbine in one state
#[derive(Debug, Clone, Copy)]
pub struct SourceRotor {
    /// Thrust coefficient
    pub ct: f64,
    /// Rotor diameter (m)
    pub diameter: f64,
    /// Rotor-equivalent wind speed (m/s)
    pub rews: f64,
    /// Ambient turbulence intensity
    pub amb_ti: f64,
}

impl SourceRotor {
    /// Read the source values of turbine `t` in state `s`
    pub fn read(fdata: &FarmData, s: usize, t: usize) -> Result<Self> {
        Ok(Self {
            ct: fdata.value(v::CT, s, t)?,
            diameter: fdata.value(v::D, s, t)?,
            rews: fdata.value(v::REWS, s, t)?,
            amb_ti: fdata.value(v::AMB_TI, s, t)?,
        })
    }
}

/// Profile of a top-hat wake model
pub trait TopHat {
    /// Model name, for error messages
    fn model_name(&self) -> &str;

    /// Variable this model produces deltas for
    fn variable(&self) -> &'static str;

    /// Superposition used to merge overlapping wakes
    fn superposition(&self) -> &dyn WakeSuperposition;

    /// Wake radius at downwind distance `x`
    fn wake_radius(&self, src: &SourceRotor, x: f64) -> f64;

    /// Delta inside the wake at downwind distance `x`
    fn centreline_delta(&self, src: &SourceRotor, x: f64) -> f64;
}

/// Add the top-hat wake of the source at `src_slot`
///
/// # Arguments
///
/// * `targets` - Per-state target indices, or `None` for every target
pub fn contribute<M: TopHat + ?Sized>(
    model: &M,
    fdata: &FarmData,
    src_slot: usize,
    wake_coos: &PointGrid,
    targets: Option<&[Vec<usize>]>,
    deltas: &mut WakeDeltas,
) -> Result<()> {
    let [n_states, n_targets, n_tpoints] = wake_coos.shape();
    let delta = delta_mut(deltas, model.variable(), model.model_name())?;
    if delta.shape() != wake_coos.shape() {
        return Err(WakeError::shape_mismatch(
            format!("wake deltas of wake model '{}'", model.model_name()),
            &wake_coos.shape(),
            delta.shape(),
        ));
    }
    let superposition = model.superposition();
    let all: Vec<usize> = (0..n_targets).collect();

    for s in 0..n_states {
        let src = SourceRotor::read(fdata, s, fdata.order(s, src_slot)?)?;
        // zero or undefined thrust: no wake
        if src.ct.is_nan() || src.ct <= 0.0 {
            continue;
        }
        let selected = match targets {
            Some(per_state) => per_state[s].as_slice(),
            None => all.as_slice(),
        };
        for &t in selected {
            for p in 0..n_tpoints {
                let c = wake_coos.get(s, t, p);
                if c.x <= 0.0 {
                    continue;
                }
                let r = c.y.hypot(c.z);
                if r < model.wake_radius(&src, c.x) {
                    let wake = model.centreline_delta(&src, c.x);
                    let acc = delta.get3(s, t, p);
                    delta.set3(s, t, p, superposition.add_wake(acc, wake));
                }
            }
        }
    }
    Ok(())
}

/// Final deltas of a top-hat model, clipped so no value drops below zero
pub fn finalize<M: TopHat + ?Sized>(model: &M, amb: &VarMap, deltas: &WakeDeltas) -> Result<WakeDeltas> {
    let var = model.variable();
    let acc = deltas
        .get(var)
        .ok_or_else(|| WakeError::missing_variable(var, model.model_name()))?;
    let ambient = amb
        .get(var)
        .ok_or_else(|| WakeError::missing_variable(var, "ambient point values"))?;
    if ambient.shape() != acc.shape() {
        return Err(WakeError::shape_mismatch(
            format!("ambient '{var}' of wake model '{}'", model.model_name()),
            acc.shape(),
            ambient.shape(),
        ));
    }

    let superposition = model.superposition();
    let data = acc
        .as_slice()
        .iter()
        .zip(ambient.as_slice())
        .map(|(&a, &amb)| superposition.calc_final_wake_delta(amb, a).max(-amb))
        .collect();
    let mut out = WakeDeltas::default();
    out.insert(var.to_string(), VarArray::new(acc.dims(), acc.shape(), data)?);
    Ok(out)
}
