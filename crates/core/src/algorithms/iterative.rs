//! Iterative algorithm with under-relaxation

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{AlgorithmConfig, FarmSetup, FarmWakesCalculation, URelax};
use crate::core_types::Dataset;
use crate::engine::{CalcMode, CalcRequest, ChunkStore, DataCalcModel, EngineContext};
use crate::error::Result;

/// Largest absolute change of the given variables between two results
///
/// A NaN on either side counts as an infinite change.
pub fn max_abs_change(previous: &Dataset, current: &Dataset, vars: &[String]) -> Result<f64> {
    let mut change: f64 = 0.0;
    for var in vars {
        let a = previous.var(var)?;
        let b = current.var(var)?;
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            let d = (x - y).abs();
            change = if d.is_nan() { f64::INFINITY } else { change.max(d) };
        }
    }
    Ok(change)
}

/// Repeats the farm calculation until the farm results settle
///
/// Every pass feeds the previous results back as farm data. Relaxed
/// variables are blended with the previous pass through the chunk store. After
/// convergence, or at the iteration limit, one final pass clears the store.
pub struct Iterative {
    setup: Arc<FarmSetup>,
    urelax: URelax,
    max_iterations: usize,
    tolerance: f64,
    convergence_vars: Vec<String>,
    store: ChunkStore,
    history: Vec<f64>,
}

impl Iterative {
    /// Create from the iteration settings of a configuration
    ///
    /// # Arguments
    ///
    /// * `setup` - Farm, states and resolved models
    /// * `config` - Supplies `urelax`, `max_iterations`, `tolerance` and
    ///   `convergence_vars`
    #[must_use]
    pub fn new(setup: FarmSetup, config: &AlgorithmConfig) -> Self {
        Self {
            setup: Arc::new(setup),
            urelax: URelax::new(config.urelax.iter().map(|(v, r)| (v.clone(), *r)).collect()),
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            convergence_vars: config.convergence_vars.clone(),
            store: ChunkStore::new(),
            history: Vec::new(),
        }
    }

    /// The shared farm setup
    #[must_use]
    pub fn setup(&self) -> &FarmSetup {
        &self.setup
    }

    /// Chunk store of the running calculation
    #[must_use]
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Largest change of every iteration after the first, in order
    #[must_use]
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// True if the last run met the tolerance
    #[must_use]
    pub fn converged(&self) -> bool {
        self.history.last().is_some_and(|&c| c < self.tolerance)
    }

    /// Farm results over every state
    ///
    /// A failed pass leaves the chunk store empty.
    pub fn calc_farm(&mut self, ctx: &EngineContext) -> Result<Dataset> {
        self.store.clear();
        self.history.clear();
        let results = self.run_passes(ctx);
        if results.is_err() {
            self.store.clear();
        }
        results
    }

    fn run_passes(&mut self, ctx: &EngineContext) -> Result<Dataset> {

        let model_data = self.setup.model_dataset();
        let geometry = self.setup.farm_dataset();
        let out_vars = FarmWakesCalculation::output_vars();
        let model: Arc<dyn DataCalcModel> =
            Arc::new(FarmWakesCalculation::with_urelax(self.urelax.clone()));

        let mut previous: Option<Dataset> = None;
        for iteration in 0..self.max_iterations {
            let farm_data = match &previous {
                Some(results) => self.setup.farm_data_with(results)?,
                None => geometry.clone(),
            };
            let results = ctx.run_calculation(
                &self.setup,
                Arc::clone(&model),
                CalcRequest::farm(&model_data, &farm_data, out_vars.clone()),
                &mut self.store,
                CalcMode::iteration(),
            )?;

            let done = match &previous {
                Some(prev) => {
                    let change = max_abs_change(prev, &results, &self.convergence_vars)?;
                    self.history.push(change);
                    info!("Iteration {}: max change {:.3e}", iteration, change);
                    change < self.tolerance
                }
                None => {
                    debug!("Iteration {}: initial pass", iteration);
                    false
                }
            };
            previous = Some(results);
            if done {
                break;
            }
        }
        if !self.converged() {
            warn!(
                "No convergence after {} iterations (tolerance {:e})",
                self.max_iterations, self.tolerance
            );
        }

        let farm_data = match &previous {
            Some(results) => self.setup.farm_data_with(results)?,
            None => geometry,
        };
        let results = ctx.run_calculation(
            &self.setup,
            model,
            CalcRequest::farm(&model_data, &farm_data, out_vars),
            &mut self.store,
            CalcMode::final_iteration(),
        )?;
        info!(
            "Iterative farm calculation done after {} iterations",
            self.history.len() + 1
        );
        Ok(results)
    }
}
