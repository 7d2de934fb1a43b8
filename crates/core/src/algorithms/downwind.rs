//! Single-pass downwind algorithm

use std::sync::Arc;

use tracing::info;

use super::{FarmSetup, FarmWakesCalculation, PointWakesCalculation};
use crate::core_types::{Axis, Dataset};
use crate::engine::{CalcMode, CalcRequest, ChunkStore, DataCalcModel, EngineContext};
use crate::error::{Result, WakeError};

/// Visits the turbines once in downwind order
///
/// Each turbine is evaluated before it contributes, so its wake carries its
/// own waked speed and thrust.
#[derive(Debug, Clone)]
pub struct Downwind {
    setup: Arc<FarmSetup>,
}

impl Downwind {
    /// Create the algorithm for a farm setup
    #[must_use]
    pub fn new(setup: FarmSetup) -> Self {
        Self {
            setup: Arc::new(setup),
        }
    }

    /// The shared farm setup
    #[must_use]
    pub fn setup(&self) -> &FarmSetup {
        &self.setup
    }

    /// Farm results over every state
    ///
    /// # Returns
    ///
    /// `(State, Turbine)` dataset with the farm output variables
    pub fn calc_farm(&self, ctx: &EngineContext) -> Result<Dataset> {
        self.run_farm(ctx, None)
    }

    /// Farm results for a subset of states
    ///
    /// # Arguments
    ///
    /// * `ctx` - Engine context with an active engine
    /// * `states` - State indices to compute, in output order
    pub fn calc_farm_states(&self, ctx: &EngineContext, states: Vec<usize>) -> Result<Dataset> {
        self.run_farm(ctx, Some(states))
    }

    fn run_farm(&self, ctx: &EngineContext, selection: Option<Vec<usize>>) -> Result<Dataset> {
        let model_data = self.setup.model_dataset();
        let farm_data = self.setup.farm_dataset();
        let mut request = CalcRequest::farm(&model_data, &farm_data, FarmWakesCalculation::output_vars());
        request.selection = selection;

        let model: Arc<dyn DataCalcModel> = Arc::new(FarmWakesCalculation::new());
        let results = ctx.run_calculation(
            &self.setup,
            model,
            request,
            &mut ChunkStore::new(),
            CalcMode::single(),
        )?;
        info!(
            "Downwind farm calculation done: {} states, {} turbines",
            results.states().len(),
            self.setup.n_turbines()
        );
        Ok(results)
    }

    /// Waked wind at target points
    ///
    /// # Arguments
    ///
    /// * `ctx` - Engine context with an active engine
    /// * `farm_results` - Output of a farm calculation
    /// * `points` - `(State, Target, TPoint)` dataset with `X`, `Y`, `Z`,
    ///   over the same states as `farm_results` or over all states
    ///
    /// # Returns
    ///
    /// `(State, Target, TPoint)` dataset with `WS`, `TI`, `AMB_WS`, `AMB_TI`
    pub fn calc_points(
        &self,
        ctx: &EngineContext,
        farm_results: &Dataset,
        points: &Dataset,
    ) -> Result<Dataset> {
        let states = farm_results.states();
        let model_data = self.setup.model_dataset().isel(Axis::State, states)?;
        let farm_data = self.setup.farm_data_with(farm_results)?;

        let n_points_states = points.size(Axis::State).unwrap_or(0);
        let selected;
        let point_data = if n_points_states == states.len() {
            points
        } else if n_points_states == self.setup.n_states() {
            selected = points.isel(Axis::State, states)?;
            &selected
        } else {
            return Err(WakeError::shape_mismatch(
                "point data states",
                &[states.len()],
                &[n_points_states],
            ));
        };

        let model: Arc<dyn DataCalcModel> = Arc::new(PointWakesCalculation);
        let results = ctx.run_calculation(
            &self.setup,
            model,
            CalcRequest::points(
                &model_data,
                &farm_data,
                point_data,
                PointWakesCalculation::output_vars(),
            ),
            &mut ChunkStore::new(),
            CalcMode::single(),
        )?;
        info!(
            "Point calculation done: {} targets",
            results.size(Axis::Target).unwrap_or(0)
        );
        Ok(results)
    }
}
