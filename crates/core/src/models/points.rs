//! Evaluation point grids and wake delta containers

use crate::core_types::{Axis, Vec3, VarArray, VarMap};
use crate::error::{Result, WakeError};

/// Wake deltas per variable, arrays of dims `(State, Turbine|Target, TPoint)`
pub type WakeDeltas = VarMap;

/// Points laid out as `(state, target, point)`
///
/// Used both for evaluation points in world coordinates and for the same
/// points expressed in the wake frame of a source turbine.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGrid {
    shape: [usize; 3],
    points: Vec<Vec3>,
}

impl PointGrid {
    /// Grid of zero vectors
    #[must_use]
    pub fn zeros(n_states: usize, n_targets: usize, n_tpoints: usize) -> Self {
        Self {
            shape: [n_states, n_targets, n_tpoints],
            points: vec![Vec3::zeros(); n_states * n_targets * n_tpoints],
        }
    }

    /// `[n_states, n_targets, n_tpoints]`
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Number of states
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.shape[0]
    }

    /// Number of targets
    #[must_use]
    pub fn n_targets(&self) -> usize {
        self.shape[1]
    }

    /// Number of points per target
    #[must_use]
    pub fn n_tpoints(&self) -> usize {
        self.shape[2]
    }

    #[inline]
    fn index(&self, s: usize, t: usize, p: usize) -> usize {
        assert!(
            s < self.shape[0] && t < self.shape[1] && p < self.shape[2],
            "Point ({s}, {t}, {p}) out of bounds for {:?}",
            self.shape
        );
        (s * self.shape[1] + t) * self.shape[2] + p
    }

    /// Point at `(s, t, p)`
    #[must_use]
    pub fn get(&self, s: usize, t: usize, p: usize) -> Vec3 {
        self.points[self.index(s, t, p)]
    }

    /// Set point at `(s, t, p)`
    pub fn set(&mut self, s: usize, t: usize, p: usize, point: Vec3) {
        let idx = self.index(s, t, p);
        self.points[idx] = point;
    }
}

/// Evaluation points with per-point weights
#[derive(Debug, Clone, PartialEq)]
pub struct EvalPoints {
    /// Target axis of the points: `Turbine` for rotors, `Target` for probes
    pub target_axis: Axis,
    /// Point positions
    pub grid: PointGrid,
    /// Weight of each point within its target, sums to one
    pub weights: Vec<f64>,
}

impl EvalPoints {
    /// Axes of delta arrays for these points
    #[must_use]
    pub fn dims(&self) -> [Axis; 3] {
        [Axis::State, self.target_axis, Axis::TPoint]
    }

    /// Zero-filled delta array for these points
    #[must_use]
    pub fn zeros(&self) -> VarArray {
        VarArray::zeros(&self.dims(), &self.grid.shape())
    }

    /// Check that every delta array matches the point layout
    ///
    /// # Arguments
    ///
    /// * `owner` - Name of the wake model owning the deltas
    /// * `deltas` - Delta arrays to check
    pub fn check_deltas(&self, owner: &str, deltas: &WakeDeltas) -> Result<()> {
        let expected = self.grid.shape();
        for (var, array) in deltas {
            if array.shape() != expected {
                return Err(WakeError::shape_mismatch(
                    format!("wake deltas '{var}' of wake model '{owner}'"),
                    &expected,
                    array.shape(),
                ));
            }
        }
        Ok(())
    }
}
