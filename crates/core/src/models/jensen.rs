//! Jensen (Park) top-hat wind speed deficit

use std::sync::Arc;

use super::top_hat::{self, SourceRotor, TopHat};
use super::{PointGrid, WakeDeltas, WakeModel, WakeSuperposition};
use crate::core_types::{variables as v, FarmData, ModelData, VarMap};
use crate::error::Result;

/// Default wake expansion coefficient
pub const JENSEN_K: f64 = 0.05;

/// Jensen wake model
///
/// Inside a wake of radius `D/2 + k x` the wind speed drops by
/// `(1 - sqrt(1 - ct)) * (D / (D + 2 k x))^2` times the source's rotor
/// wind speed.
#[derive(Clone)]
pub struct JensenWake {
    name: String,
    k: f64,
    superposition: Arc<dyn WakeSuperposition>,
}

impl JensenWake {
    /// Create a Jensen model
    ///
    /// # Arguments
    ///
    /// * `name` - Registry name
    /// * `k` - Wake expansion coefficient
    /// * `superposition` - Wind speed superposition
    #[must_use]
    pub fn new(name: impl Into<String>, k: f64, superposition: Arc<dyn WakeSuperposition>) -> Self {
        Self {
            name: name.into(),
            k,
            superposition,
        }
    }

    /// Wake expansion coefficient
    #[must_use]
    pub fn k(&self) -> f64 {
        self.k
    }
}

impl TopHat for JensenWake {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn variable(&self) -> &'static str {
        v::WS
    }

    fn superposition(&self) -> &dyn WakeSuperposition {
        self.superposition.as_ref()
    }

    fn wake_radius(&self, src: &SourceRotor, x: f64) -> f64 {
        0.5 * src.diameter + self.k * x
    }

    fn centreline_delta(&self, src: &SourceRotor, x: f64) -> f64 {
        let ct = src.ct.min(1.0);
        let ratio = src.diameter / (src.diameter + 2.0 * self.k * x);
        -(1.0 - (1.0 - ct).sqrt()) * ratio * ratio * src.rews
    }
}

impl WakeModel for JensenWake {
    fn name(&self) -> &str {
        &self.name
    }

    fn wake_variables(&self) -> &[&'static str] {
        &[v::WS]
    }

    fn contribute_at_rotors(
        &self,
        _mdata: &ModelData,
        fdata: &FarmData,
        src_slot: usize,
        wake_coos: &PointGrid,
        targets: &[Vec<usize>],
        deltas: &mut WakeDeltas,
    ) -> Result<()> {
        top_hat::contribute(self, fdata, src_slot, wake_coos, Some(targets), deltas)
    }

    fn contribute_at_points(
        &self,
        _mdata: &ModelData,
        fdata: &FarmData,
        src_slot: usize,
        wake_coos: &PointGrid,
        deltas: &mut WakeDeltas,
    ) -> Result<()> {
        top_hat::contribute(self, fdata, src_slot, wake_coos, None, deltas)
    }

    fn finalize_wake_deltas(&self, amb: &VarMap, deltas: &WakeDeltas) -> Result<WakeDeltas> {
        top_hat::finalize(self, amb, deltas)
    }
}
