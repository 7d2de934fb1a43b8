//! Engine and calculation model traits

use std::sync::Arc;

use super::{ChunkJob, ChunkOutput, EngineConfig, StoreFragment};
use crate::algorithms::FarmSetup;
use crate::core_types::{Axis, ChunkData, VarMap};
use crate::error::Result;

/// Which container a calculation writes its results for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCoords {
    /// `(State, Turbine)` results
    Farm,
    /// `(State, Target, TPoint)` results
    Points,
}

impl OutputCoords {
    /// Axes of every output array
    #[must_use]
    pub const fn dims(self) -> &'static [Axis] {
        match self {
            OutputCoords::Farm => &[Axis::State, Axis::Turbine],
            OutputCoords::Points => &[Axis::State, Axis::Target, Axis::TPoint],
        }
    }
}

/// A calculation that runs independently on every chunk
pub trait DataCalcModel: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Result container of the calculation
    fn output_coords(&self) -> OutputCoords;

    /// Fill in derived inputs the calculation needs before it runs
    fn ensure_variables(&self, _setup: &FarmSetup, _chunk: &mut ChunkData) -> Result<()> {
        Ok(())
    }

    /// Compute the chunk
    ///
    /// # Arguments
    ///
    /// * `setup` - Farm, inflow states and models
    /// * `chunk` - Chunk data, may be updated in place
    /// * `store` - Chunk-store fragment persisted between iterations
    ///
    /// # Returns
    ///
    /// Output arrays keyed by variable name
    fn calculate(
        &self,
        setup: &FarmSetup,
        chunk: &mut ChunkData,
        store: &mut StoreFragment,
    ) -> Result<VarMap>;
}

/// Executes chunk jobs, sequentially or in parallel
pub trait Engine: Send + Sync {
    /// Registry name
    fn name(&self) -> &'static str;

    /// Configuration the engine was built with
    fn config(&self) -> &EngineConfig;

    /// Acquire workers
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release workers; calling it twice is harmless
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Run every job and return the outputs
    ///
    /// Outputs may come back in any order; the first failing chunk aborts
    /// the run with its error.
    fn run_chunks(
        &self,
        model: Arc<dyn DataCalcModel>,
        setup: Arc<FarmSetup>,
        jobs: Vec<ChunkJob>,
    ) -> Result<Vec<ChunkOutput>>;
}
