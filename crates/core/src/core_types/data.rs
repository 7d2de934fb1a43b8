//! Per-chunk data containers
//!
//! A chunk sees three containers: model data (per-state inflow), farm data
//! (per-state, per-turbine values) and, for point calculations, target data
//! (per-state, per-target, per-point values). All three share the same
//! contiguous state range of the chunk.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::{variables as v, Axis, Dataset, VarArray, VarMap};
use crate::error::{Result, WakeError};

/// Which role a [`Data`] container plays in a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataKind {
    /// Inflow variables over `State`
    Model,
    /// Turbine variables over `(State, Turbine)`
    Farm,
    /// Target variables over `(State, Target, TPoint)`
    Target,
}

impl DataKind {
    /// Human-readable name used in error context
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            DataKind::Model => "model data",
            DataKind::Farm => "farm data",
            DataKind::Target => "target data",
        }
    }
}

/// Chunk-local named variable container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Data {
    kind: DataKind,
    states_i0: usize,
    n_states: usize,
    vars: VarMap,
}

/// Per-state inflow data of a chunk
pub type ModelData = Data;
/// Per-turbine data of a chunk
pub type FarmData = Data;
/// Per-target data of a chunk
pub type TargetData = Data;

impl Data {
    /// Create an empty container
    ///
    /// # Arguments
    ///
    /// * `kind` - Role of the container
    /// * `states_i0` - Global index of the first state of the chunk
    /// * `n_states` - Number of states in the chunk
    #[must_use]
    pub fn new(kind: DataKind, states_i0: usize, n_states: usize) -> Self {
        Self {
            kind,
            states_i0,
            n_states,
            vars: VarMap::default(),
        }
    }

    /// Slice a full dataset down to one chunk
    ///
    /// # Arguments
    ///
    /// * `kind` - Role of the container
    /// * `ds` - Full dataset
    /// * `states` - State range of the chunk
    /// * `targets` - Target range of the chunk, for target data only
    pub fn from_dataset(
        kind: DataKind,
        ds: &Dataset,
        states: Range<usize>,
        targets: Option<Range<usize>>,
    ) -> Result<Self> {
        let mut data = Self::new(kind, states.start, states.len());
        for (name, array) in ds.vars() {
            let mut part = array.slice_axis(Axis::State, states.clone())?;
            if let Some(t) = &targets {
                part = part.slice_axis(Axis::Target, t.clone())?;
            }
            data.vars.insert(name.clone(), part);
        }
        Ok(data)
    }

    /// Role of the container
    #[must_use]
    pub fn kind(&self) -> DataKind {
        self.kind
    }

    /// Global index of the first state
    #[must_use]
    pub fn states_i0(&self) -> usize {
        self.states_i0
    }

    /// Number of states in the chunk
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Length of an axis as seen by the stored variables
    #[must_use]
    pub fn size(&self, axis: Axis) -> Option<usize> {
        if axis == Axis::State {
            return Some(self.n_states);
        }
        self.vars.values().find_map(|a| a.size_of(axis))
    }

    /// Number of turbines (0 if no turbine variable is stored)
    #[must_use]
    pub fn n_turbines(&self) -> usize {
        self.size(Axis::Turbine).unwrap_or(0)
    }

    /// Number of targets (0 if no target variable is stored)
    #[must_use]
    pub fn n_targets(&self) -> usize {
        self.size(Axis::Target).unwrap_or(0)
    }

    /// Variable by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VarArray> {
        self.vars.get(name)
    }

    /// Variable by name, or `MissingVariable`
    pub fn var(&self, name: &str) -> Result<&VarArray> {
        self.vars
            .get(name)
            .ok_or_else(|| WakeError::missing_variable(name, self.kind.label()))
    }

    /// Mutable variable by name, or `MissingVariable`
    pub fn var_mut(&mut self, name: &str) -> Result<&mut VarArray> {
        let label = self.kind.label();
        self.vars
            .get_mut(name)
            .ok_or_else(|| WakeError::missing_variable(name, label))
    }

    /// True if the variable exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// True if the variable is absent or holds any NaN
    #[must_use]
    pub fn needs(&self, name: &str) -> bool {
        self.vars.get(name).is_none_or(VarArray::has_nan)
    }

    /// Insert or replace a variable
    pub fn insert(&mut self, name: impl Into<String>, array: VarArray) {
        self.vars.insert(name.into(), array);
    }

    /// Remove a variable
    pub fn remove(&mut self, name: &str) -> Option<VarArray> {
        self.vars.remove(name)
    }

    /// All variables
    #[must_use]
    pub fn vars(&self) -> &VarMap {
        &self.vars
    }

    /// Consume into the variable map
    #[must_use]
    pub fn into_vars(self) -> VarMap {
        self.vars
    }

    /// Merge results into the container, replacing existing variables
    pub fn update(&mut self, results: VarMap) {
        self.vars.extend(results);
    }

    /// Add NaN placeholders for variables not present yet
    ///
    /// # Arguments
    ///
    /// * `names` - Variables that must exist
    /// * `dims` - Placeholder axes
    /// * `shape` - Placeholder shape
    pub fn fill_missing(&mut self, names: &[String], dims: &[Axis], shape: &[usize]) {
        for name in names {
            if !self.vars.contains_key(name) {
                self.vars.insert(name.clone(), VarArray::nan(dims, shape));
            }
        }
    }

    /// Value of a `(State,)` variable
    pub fn state_value(&self, name: &str, s: usize) -> Result<f64> {
        Ok(self.var(name)?.get1(s))
    }

    /// Value of a `(State, Turbine)` or `(State, Target)` variable
    pub fn value(&self, name: &str, s: usize, i: usize) -> Result<f64> {
        Ok(self.var(name)?.get2(s, i))
    }

    /// Turbine index visited at downwind slot `slot` of state `s`
    pub fn order(&self, s: usize, slot: usize) -> Result<usize> {
        let value = self.value(v::ORDER, s, slot)?;
        if value.is_nan() || value < 0.0 {
            return Err(WakeError::missing_variable(v::ORDER, self.kind.label()));
        }
        Ok(value as usize)
    }
}

/// The three containers of one chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkData {
    /// Per-state inflow
    pub mdata: ModelData,
    /// Per-turbine values
    pub fdata: FarmData,
    /// Per-target values, for point calculations
    pub tdata: Option<TargetData>,
}

impl ChunkData {
    /// The container the calculation writes its results for
    #[must_use]
    pub fn goal(&self) -> &Data {
        self.tdata.as_ref().unwrap_or(&self.fdata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farm_dataset() -> Dataset {
        let x = VarArray::new(
            &[Axis::State, Axis::Turbine],
            &[4, 2],
            vec![0.0, 500.0, 0.0, 500.0, 0.0, 500.0, 0.0, 500.0],
        )
        .unwrap();
        Dataset::new(vec![0, 1, 2, 3]).with_var(v::X, x)
    }

    #[test]
    fn test_from_dataset_slices_states() {
        let data = Data::from_dataset(DataKind::Farm, &farm_dataset(), 1..3, None).unwrap();
        assert_eq!(data.states_i0(), 1);
        assert_eq!(data.n_states(), 2);
        assert_eq!(data.n_turbines(), 2);
        assert_eq!(data.var(v::X).unwrap().shape(), &[2, 2]);
    }

    #[test]
    fn test_fill_missing_prefills_nan() {
        let mut data = Data::from_dataset(DataKind::Farm, &farm_dataset(), 0..4, None).unwrap();
        data.fill_missing(
            &[v::X.to_string(), v::REWS.to_string()],
            &[Axis::State, Axis::Turbine],
            &[4, 2],
        );
        assert!(!data.var(v::X).unwrap().has_nan());
        assert!(data.needs(v::REWS));
        assert!(data.order(0, 0).is_err());
    }

    #[test]
    fn test_missing_variable_context() {
        let data = Data::new(DataKind::Model, 0, 1);
        let err = data.var(v::WS).unwrap_err();
        assert_eq!(err.to_string(), "Missing variable 'WS' in model data");
    }
}
