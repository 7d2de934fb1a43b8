//! Collaborator trait definitions
//!
//! The wake accumulation only talks to its physics through these traits:
//! a wake frame orders turbines and maps points into wake coordinates, wake
//! models add deltas at those points, a superposition merges overlapping
//! wakes, a partial-wakes strategy turns point deltas into rotor values, and
//! a farm controller turns rotor values into thrust and power.

use std::ops::Range;

use super::{EvalPoints, PointGrid, WakeDeltas};
use crate::core_types::{FarmData, ModelData, VarArray, VarMap};
use crate::error::{Result, WakeError};

/// Turbine ordering and wake coordinate system
pub trait WakeFrame: Send + Sync {
    /// Registry name
    fn name(&self) -> &str;

    /// Downwind order of the turbines for every state
    ///
    /// # Returns
    ///
    /// `(State, Turbine)` array whose row `s` is a permutation of the turbine
    /// indices, upstream first
    fn calc_order(&self, mdata: &ModelData, fdata: &FarmData) -> Result<VarArray>;

    /// Express points in the wake frame of the turbine at a downwind slot
    ///
    /// # Arguments
    ///
    /// * `mdata` - Model data of the chunk
    /// * `fdata` - Farm data of the chunk, must contain the order
    /// * `src_slot` - Downwind slot of the source turbine
    /// * `points` - World-frame points
    ///
    /// # Returns
    ///
    /// Points as `(downwind, crosswind, vertical)` offsets from the source hub
    fn get_wake_coos(
        &self,
        mdata: &ModelData,
        fdata: &FarmData,
        src_slot: usize,
        points: &PointGrid,
    ) -> Result<PointGrid>;
}

/// Merge rule for overlapping wakes
pub trait WakeSuperposition: Send + Sync {
    /// Registry name
    fn name(&self) -> &str;

    /// Add one wake to the accumulated value at a point
    fn add_wake(&self, accumulated: f64, wake: f64) -> f64;

    /// Final delta relative to the ambient value
    fn calc_final_wake_delta(&self, ambient: f64, accumulated: f64) -> f64;
}

/// Wake model: deltas caused by a source turbine at evaluation points
pub trait WakeModel: Send + Sync {
    /// Registry name
    fn name(&self) -> &str;

    /// Variables this model produces deltas for
    fn wake_variables(&self) -> &[&'static str];

    /// Zero-filled deltas for the given evaluation points
    fn new_wake_deltas(&self, points: &EvalPoints) -> WakeDeltas {
        self.wake_variables()
            .iter()
            .map(|v| ((*v).to_string(), points.zeros()))
            .collect()
    }

    /// Add the wake of the turbine at `src_slot` to rotor points of other turbines
    ///
    /// # Arguments
    ///
    /// * `wake_coos` - Rotor points of all turbines in the source's wake frame
    /// * `targets` - Per state, the turbine indices that receive the wake
    /// * `deltas` - Accumulated deltas, `(State, Turbine, TPoint)`
    fn contribute_at_rotors(
        &self,
        mdata: &ModelData,
        fdata: &FarmData,
        src_slot: usize,
        wake_coos: &PointGrid,
        targets: &[Vec<usize>],
        deltas: &mut WakeDeltas,
    ) -> Result<()>;

    /// Add the wake of the turbine at `src_slot` to every target point
    fn contribute_at_points(
        &self,
        mdata: &ModelData,
        fdata: &FarmData,
        src_slot: usize,
        wake_coos: &PointGrid,
        deltas: &mut WakeDeltas,
    ) -> Result<()>;

    /// Turn accumulated deltas into final deltas relative to ambient
    ///
    /// Pure: the inputs are not modified, so finalizing the same
    /// accumulation twice yields the same result.
    ///
    /// # Arguments
    ///
    /// * `amb` - Ambient values at the points, keyed by wake variable
    /// * `deltas` - Accumulated deltas, same shapes as `amb`
    fn finalize_wake_deltas(&self, amb: &VarMap, deltas: &WakeDeltas) -> Result<WakeDeltas>;
}

/// Strategy that evaluates wakes over a rotor
pub trait PartialWakes: Send + Sync {
    /// Registry name
    fn name(&self) -> &str;

    /// Evaluation points for every turbine rotor
    fn get_wake_points(&self, mdata: &ModelData, fdata: &FarmData) -> Result<EvalPoints>;

    /// Zero-filled deltas of a wake model for these points
    fn new_wake_deltas(&self, wake_model: &dyn WakeModel, points: &EvalPoints) -> Result<WakeDeltas> {
        let deltas = wake_model.new_wake_deltas(points);
        points.check_deltas(wake_model.name(), &deltas)?;
        Ok(deltas)
    }

    /// Add the wake of the turbine at `src_slot` to the turbines at `target_slots`
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
    ) -> Result<()>;

    /// Waked values at the rotor points of the turbines at `slot`
    ///
    /// # Returns
    ///
    /// Per wake variable, a `(State, Turbine, TPoint)` array with a turbine
    /// axis of length one
    fn finalize_wakes(
        &self,
        mdata: &ModelData,
        fdata: &FarmData,
        wake_model: &dyn WakeModel,
        points: &EvalPoints,
        slot: usize,
        deltas: &WakeDeltas,
    ) -> Result<VarMap>;

    /// Write rotor results of the turbines at `slot` into farm data
    fn evaluate_results(
        &self,
        mdata: &ModelData,
        fdata: &mut FarmData,
        wake_model: &dyn WakeModel,
        points: &EvalPoints,
        slot: usize,
        deltas: &WakeDeltas,
    ) -> Result<()>;
}

/// Turbine operation: thrust and power from rotor inflow
pub trait FarmController: Send + Sync {
    /// Registry name
    fn name(&self) -> &str;

    /// Farm variables written by the controller
    fn output_farm_vars(&self) -> &[&'static str];

    /// Evaluate turbine models
    ///
    /// # Arguments
    ///
    /// * `pre_rotor` - If true, evaluate at ambient inflow (`AMB_*` outputs)
    /// * `downwind_index` - Restrict to the turbines at this slot, or all
    ///
    /// # Returns
    ///
    /// Full `(State, Turbine)` arrays; entries outside the selection keep
    /// their current farm data values
    fn calculate(
        &self,
        mdata: &ModelData,
        fdata: &FarmData,
        pre_rotor: bool,
        downwind_index: Option<usize>,
    ) -> Result<VarMap>;
}

/// Turbine index at `slot` for every state of the chunk
pub fn slot_turbines(fdata: &FarmData, slot: usize) -> Result<Vec<usize>> {
    (0..fdata.n_states()).map(|s| fdata.order(s, slot)).collect()
}

/// Delta array of a wake variable, or `MissingVariable`
pub fn delta_mut<'a>(deltas: &'a mut WakeDeltas, var: &str, owner: &str) -> Result<&'a mut VarArray> {
    deltas
        .get_mut(var)
        .ok_or_else(|| WakeError::missing_variable(var, &format!("wake deltas of '{owner}'")))
}
