//! Active engine handle and the chunked calculation driver

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::{
    combine_results, create_engine, ChunkJob, ChunkPlan, ChunkStore, DataCalcModel, Engine,
    EngineConfig, OutputCoords, StoreFragment,
};
use crate::algorithms::FarmSetup;
use crate::core_types::{Axis, ChunkData, Data, DataKind, Dataset};
use crate::error::{Result, WakeError};

/// How chunk-store fragments are handled by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalcMode {
    /// Chunks receive their stored fragment and return an updated one
    pub iterative: bool,
    /// Last pass of an iterative run; the store is cleared afterwards
    pub final_iteration: bool,
}

impl CalcMode {
    /// One-off calculation, the store is not used
    #[must_use]
    pub const fn single() -> Self {
        Self {
            iterative: false,
            final_iteration: false,
        }
    }

    /// Intermediate pass of an iterative calculation
    #[must_use]
    pub const fn iteration() -> Self {
        Self {
            iterative: true,
            final_iteration: false,
        }
    }

    /// Final pass of an iterative calculation
    #[must_use]
    pub const fn final_iteration() -> Self {
        Self {
            iterative: true,
            final_iteration: true,
        }
    }

    /// True if returned fragments are kept for the next pass
    #[must_use]
    pub const fn keeps_store(self) -> bool {
        self.iterative && !self.final_iteration
    }
}

/// Inputs of one chunked calculation
#[derive(Debug, Clone)]
pub struct CalcRequest<'a> {
    /// Per-state inflow, `(State,)` variables
    pub model_data: &'a Dataset,
    /// Per-turbine data, `(State, Turbine)` variables
    pub farm_data: &'a Dataset,
    /// Per-target data, `(State, Target, TPoint)` variables, point runs only
    pub point_data: Option<&'a Dataset>,
    /// Variables the result must contain
    pub out_vars: Vec<String>,
    /// Restrict the run to these state indices
    pub selection: Option<Vec<usize>>,
}

impl<'a> CalcRequest<'a> {
    /// Farm calculation over every state
    #[must_use]
    pub fn farm(model_data: &'a Dataset, farm_data: &'a Dataset, out_vars: Vec<String>) -> Self {
        Self {
            model_data,
            farm_data,
            point_data: None,
            out_vars,
            selection: None,
        }
    }

    /// Point calculation over every state
    #[must_use]
    pub fn points(
        model_data: &'a Dataset,
        farm_data: &'a Dataset,
        point_data: &'a Dataset,
        out_vars: Vec<String>,
    ) -> Self {
        Self {
            model_data,
            farm_data,
            point_data: Some(point_data),
            out_vars,
            selection: None,
        }
    }

    /// Restrict to a subset of states
    #[must_use]
    pub fn with_selection(mut self, states: Vec<usize>) -> Self {
        self.selection = Some(states);
        self
    }
}

/// Name of the engine active in this process
static ACTIVE_ENGINE: Mutex<Option<&'static str>> = Mutex::new(None);

fn active_slot() -> MutexGuard<'static, Option<&'static str>> {
    ACTIVE_ENGINE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Name of the engine active in this process, if any
#[must_use]
pub fn active_engine() -> Option<&'static str> {
    *active_slot()
}

/// Holder of the single active engine
///
/// At most one engine is active per process, whichever context holds it.
/// Algorithms receive the context explicitly instead of looking it up
/// globally.
#[derive(Default)]
pub struct EngineContext {
    engine: Option<Box<dyn Engine>>,
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("engine", &self.engine.as_ref().map(|e| e.name()))
            .finish()
    }
}

impl EngineContext {
    /// Context without an active engine
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build, initialize and activate the engine named in `config`
    pub fn with_config(config: &EngineConfig) -> Result<Self> {
        let mut ctx = Self::new();
        ctx.initialize(create_engine(&config.engine, config.clone())?)?;
        Ok(ctx)
    }

    /// Activate an engine
    ///
    /// # Errors
    ///
    /// `EngineAlreadyActive` if this or any other context holds an active
    /// engine; the active engine is left untouched
    pub fn initialize(&mut self, mut engine: Box<dyn Engine>) -> Result<()> {
        let mut slot = active_slot();
        if let Some(active) = self.engine.as_ref().map(|e| e.name()).or(*slot) {
            return Err(WakeError::EngineAlreadyActive {
                active: active.to_string(),
                requested: engine.name().to_string(),
            });
        }
        engine.initialize()?;
        info!(
            "Engine '{}' initialized with {} workers",
            engine.name(),
            engine.config().n_workers
        );
        *slot = Some(engine.name());
        self.engine = Some(engine);
        Ok(())
    }

    /// Release the active engine; harmless without one
    ///
    /// The process-wide slot is freed even if the engine fails to shut down.
    pub fn finalize(&mut self) -> Result<()> {
        if let Some(mut engine) = self.engine.take() {
            let res = engine.finalize();
            *active_slot() = None;
            res?;
            info!("Engine '{}' finalized", engine.name());
        }
        Ok(())
    }

    /// True if an engine is active
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    /// The active engine
    pub fn engine(&self) -> Result<&dyn Engine> {
        self.engine.as_deref().ok_or(WakeError::EngineNotInitialized)
    }

    /// Run a calculation chunk by chunk on the active engine
    ///
    /// # Arguments
    ///
    /// * `setup` - Farm, inflow states and models
    /// * `model` - Calculation run on every chunk
    /// * `request` - Input datasets, output variables and state selection
    /// * `store` - Chunk store of the running algorithm
    /// * `mode` - Store handling of this pass
    ///
    /// # Returns
    ///
    /// Dataset holding every requested output variable over the full
    /// (selected) state axis
    pub fn run_calculation(
        &self,
        setup: &Arc<FarmSetup>,
        model: Arc<dyn DataCalcModel>,
        request: CalcRequest<'_>,
        store: &mut ChunkStore,
        mode: CalcMode,
    ) -> Result<Dataset> {
        let engine = self.engine()?;
        let coords = model.output_coords();

        let selected;
        let (model_data, farm_data, point_data) = match &request.selection {
            Some(states) => {
                selected = (
                    request.model_data.isel(Axis::State, states)?,
                    request.farm_data.isel(Axis::State, states)?,
                    request
                        .point_data
                        .map(|pd| pd.isel(Axis::State, states))
                        .transpose()?,
                );
                (&selected.0, &selected.1, selected.2.as_ref())
            }
            None => (request.model_data, request.farm_data, request.point_data),
        };

        let n_states = model_data
            .size(Axis::State)
            .ok_or(WakeError::EmptyAxis { axis: Axis::State })?;
        let n_turbines = farm_data.size(Axis::Turbine).unwrap_or(0);
        let (n_targets, n_tpoints) = match (coords, point_data) {
            (OutputCoords::Farm, _) => (0, 0),
            (OutputCoords::Points, Some(pd)) => (
                pd.size(Axis::Target)
                    .ok_or(WakeError::EmptyAxis { axis: Axis::Target })?,
                pd.size(Axis::TPoint).unwrap_or(1),
            ),
            (OutputCoords::Points, None) => {
                return Err(WakeError::InvalidConfig(format!(
                    "calculation '{}' requires point data",
                    model.name()
                )))
            }
        };

        let plan = ChunkPlan::new(engine.config(), n_states, n_targets)?;
        let dims = coords.dims();
        let mut jobs = Vec::with_capacity(plan.n_chunks());
        for key in plan.keys() {
            let state_range = plan.states[key.states].clone();
            let target_range = plan.targets[key.targets].clone();
            let mdata = Data::from_dataset(DataKind::Model, model_data, state_range.clone(), None)?;
            let mut fdata = Data::from_dataset(DataKind::Farm, farm_data, state_range.clone(), None)?;

            let (tdata, out_shape) = match coords {
                OutputCoords::Farm => {
                    let shape = vec![state_range.len(), n_turbines];
                    fdata.fill_missing(&request.out_vars, dims, &shape);
                    (None, shape)
                }
                OutputCoords::Points => {
                    let shape = vec![state_range.len(), target_range.len(), n_tpoints];
                    let mut tdata = match point_data {
                        Some(pd) => Data::from_dataset(
                            DataKind::Target,
                            pd,
                            state_range.clone(),
                            Some(target_range.clone()),
                        )?,
                        None => Data::new(DataKind::Target, state_range.start, state_range.len()),
                    };
                    tdata.fill_missing(&request.out_vars, dims, &shape);
                    (Some(tdata), shape)
                }
            };

            let fragment = if mode.iterative {
                store.take(key)
            } else {
                StoreFragment::default()
            };
            jobs.push(ChunkJob {
                key,
                data: ChunkData { mdata, fdata, tdata },
                store: fragment,
                out_vars: request.out_vars.clone(),
                out_dims: dims.to_vec(),
                out_shape,
            });
        }

        info!(
            "Running '{}' on engine '{}': {} states, {} targets, {} chunks",
            model.name(),
            engine.name(),
            n_states,
            n_targets,
            plan.n_chunks()
        );
        let states = if model_data.states().is_empty() {
            (0..n_states).collect()
        } else {
            model_data.states().to_vec()
        };
        let combined = engine
            .run_chunks(Arc::clone(&model), Arc::clone(setup), jobs)
            .and_then(|outputs| {
                debug!("Combining {} chunk outputs", outputs.len());
                combine_results(outputs, &plan, &request.out_vars, states, store, mode)
            });
        if combined.is_err() && mode.iterative {
            // fragments taken for this pass are gone; the rest are stale
            store.clear();
        }
        combined
    }
}

impl Drop for EngineContext {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            warn!("Engine finalize failed on drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SingleEngine;

    /// Engine activation is process-wide, so tests holding one take turns
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[test]
    fn test_second_engine_rejected() {
        let _serial = serial();
        let mut ctx = EngineContext::new();
        ctx.initialize(Box::new(SingleEngine::new(EngineConfig::default())))
            .unwrap();
        let err = ctx
            .initialize(Box::new(SingleEngine::new(EngineConfig::default())))
            .unwrap_err();
        assert!(matches!(err, WakeError::EngineAlreadyActive { .. }));
        assert!(ctx.is_active());
        assert_eq!(ctx.engine().unwrap().name(), "single");
    }

    #[test]
    fn test_engine_slot_shared_between_contexts() {
        let _serial = serial();
        let mut first = EngineContext::with_config(&EngineConfig::named("single")).unwrap();
        assert_eq!(active_engine(), Some("single"));

        let mut second = EngineContext::new();
        let err = second
            .initialize(Box::new(SingleEngine::new(EngineConfig::default())))
            .unwrap_err();
        assert_eq!(
            err,
            WakeError::EngineAlreadyActive {
                active: "single".to_string(),
                requested: "single".to_string(),
            }
        );
        assert!(!second.is_active());

        first.finalize().unwrap();
        assert_eq!(active_engine(), None);
        second
            .initialize(Box::new(SingleEngine::new(EngineConfig::default())))
            .unwrap();
        assert!(second.is_active());
        drop(second);
        assert_eq!(active_engine(), None);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let _serial = serial();
        let mut ctx = EngineContext::with_config(&EngineConfig::named("pool").with_workers(2)).unwrap();
        ctx.finalize().unwrap();
        ctx.finalize().unwrap();
        assert!(!ctx.is_active());
        assert!(matches!(ctx.engine(), Err(WakeError::EngineNotInitialized)));
    }

    #[test]
    fn test_mode_store_handling() {
        assert!(!CalcMode::single().keeps_store());
        assert!(CalcMode::iteration().keeps_store());
        assert!(!CalcMode::final_iteration().keeps_store());
    }
}
