//! Sequential engine

use std::sync::Arc;

use super::{run_chunk, ChunkJob, ChunkOutput, DataCalcModel, Engine, EngineConfig};
use crate::algorithms::FarmSetup;
use crate::error::Result;

/// Runs every chunk on the calling thread, in key order
#[derive(Debug, Clone)]
pub struct SingleEngine {
    config: EngineConfig,
}

impl SingleEngine {
    /// Create a sequential engine
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl Engine for SingleEngine {
    fn name(&self) -> &'static str {
        "single"
    }

    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn run_chunks(
        &self,
        model: Arc<dyn DataCalcModel>,
        setup: Arc<FarmSetup>,
        jobs: Vec<ChunkJob>,
    ) -> Result<Vec<ChunkOutput>> {
        jobs.into_iter()
            .map(|job| run_chunk(model.as_ref(), &setup, job))
            .collect()
    }
}
