//! Thread-pool engine on rayon

use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use super::{run_chunk, ChunkJob, ChunkOutput, DataCalcModel, Engine, EngineConfig};
use crate::algorithms::FarmSetup;
use crate::error::{Result, WakeError};

/// Runs chunks in parallel on a dedicated rayon pool
///
/// Chunks share the farm setup by reference; each chunk owns its data.
pub struct PoolEngine {
    config: EngineConfig,
    pool: Option<ThreadPool>,
}

impl PoolEngine {
    /// Create a pool engine; threads start on [`Engine::initialize`]
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config, pool: None }
    }
}

impl Engine for PoolEngine {
    fn name(&self) -> &'static str {
        "pool"
    }

    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn initialize(&mut self) -> Result<()> {
        if self.pool.is_some() {
            return Ok(());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.n_workers)
            .thread_name(|i| format!("wake-pool-{i}"))
            .build()
            .map_err(|e| WakeError::Transport(e.to_string()))?;
        self.pool = Some(pool);
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        if self.pool.take().is_some() {
            debug!("Pool engine threads released");
        }
        Ok(())
    }

    fn run_chunks(
        &self,
        model: Arc<dyn DataCalcModel>,
        setup: Arc<FarmSetup>,
        jobs: Vec<ChunkJob>,
    ) -> Result<Vec<ChunkOutput>> {
        let pool = self.pool.as_ref().ok_or(WakeError::EngineNotInitialized)?;
        pool.install(|| {
            jobs.into_par_iter()
                .map(|job| run_chunk(model.as_ref(), &setup, job))
                .collect()
        })
    }
}
