//! Full-domain variable collections

use rustc_hash::{FxBuildHasher, FxHashMap};
use serde::{Deserialize, Serialize};

use super::{Axis, VarArray};
use crate::error::{Result, WakeError};

/// Named arrays, keyed by variable name
pub type VarMap = FxHashMap<String, VarArray>;

/// Unchunked collection of named variables
///
/// Holds the global state coordinate alongside the arrays so that results
/// recombined from chunks can be matched back to their input states.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    states: Vec<usize>,
    vars: VarMap,
}

impl Dataset {
    /// Create an empty dataset over the given global state indices
    #[must_use]
    pub fn new(states: Vec<usize>) -> Self {
        Self {
            states,
            vars: VarMap::default(),
        }
    }

    /// Create a dataset from existing arrays
    #[must_use]
    pub fn from_vars(states: Vec<usize>, vars: VarMap) -> Self {
        Self { states, vars }
    }

    /// Builder-style insert
    pub fn with_var(mut self, name: impl Into<String>, array: VarArray) -> Self {
        self.insert(name, array);
        self
    }

    /// Insert or replace a variable
    pub fn insert(&mut self, name: impl Into<String>, array: VarArray) {
        self.vars.insert(name.into(), array);
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
            .ok_or_else(|| WakeError::missing_variable(name, "dataset"))
    }

    /// True if the variable exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
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

    /// Variable names in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Global state indices
    #[must_use]
    pub fn states(&self) -> &[usize] {
        &self.states
    }

    /// Length of an axis
    ///
    /// The state axis is taken from the state coordinate when present,
    /// every other axis from the first variable that carries it.
    #[must_use]
    pub fn size(&self, axis: Axis) -> Option<usize> {
        if axis == Axis::State && !self.states.is_empty() {
            return Some(self.states.len());
        }
        self.vars.values().find_map(|v| v.size_of(axis))
    }

    /// Select indices along an axis for every variable
    pub fn isel(&self, axis: Axis, indices: &[usize]) -> Result<Self> {
        let mut vars = VarMap::with_capacity_and_hasher(self.vars.len(), FxBuildHasher);
        for (name, array) in &self.vars {
            vars.insert(name.clone(), array.select(axis, indices)?);
        }
        let states = if axis == Axis::State && !self.states.is_empty() {
            indices.iter().map(|&i| self.states[i]).collect()
        } else {
            self.states.clone()
        };
        Ok(Self { states, vars })
    }

    /// True if both datasets hold the same variables with identical bits
    #[must_use]
    pub fn bit_eq(&self, other: &Dataset) -> bool {
        self.states == other.states
            && self.vars.len() == other.vars.len()
            && self
                .vars
                .iter()
                .all(|(name, a)| other.vars.get(name).is_some_and(|b| a.bit_eq(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isel_states() {
        let ws = VarArray::new(&[Axis::State], &[3], vec![5.0, 6.0, 7.0]).unwrap();
        let ds = Dataset::new(vec![0, 1, 2]).with_var("WS", ws);
        let sel = ds.isel(Axis::State, &[2, 0]).unwrap();
        assert_eq!(sel.states(), &[2, 0]);
        assert_eq!(sel.var("WS").unwrap().as_slice(), &[7.0, 5.0]);
        assert_eq!(sel.size(Axis::State), Some(2));
    }

    #[test]
    fn test_missing_variable() {
        let ds = Dataset::new(vec![0]);
        let err = ds.var("TI").unwrap_err();
        assert!(matches!(err, WakeError::MissingVariable { ref var, .. } if var == "TI"));
    }

    #[test]
    fn test_names_sorted() {
        let ds = Dataset::new(vec![0])
            .with_var("WS", VarArray::zeros(&[Axis::State], &[1]))
            .with_var("RHO", VarArray::zeros(&[Axis::State], &[1]));
        assert_eq!(ds.names(), vec!["RHO", "WS"]);
    }
}
