//! Chunked execution engines
//!
//! A calculation is split into chunks along the state axis and, for point
//! calculations, the target axis. Every chunk is computed independently by
//! the active engine and the outputs are reassembled in chunk-key order.
//!
//! # Engines
//!
//! - `single`: sequential, on the calling thread
//! - `pool`: rayon thread pool
//! - `cluster`: long-lived worker threads fed bincode-encoded jobs
//!
//! All engines produce bit-identical results for the same chunk layout.
//!
//! # Example
//!
//! ```rust,ignore
//! use farm_wakes_core::engine::{EngineConfig, EngineContext};
//!
//! let mut ctx = EngineContext::with_config(&EngineConfig::named("pool"))?;
//! // ... run algorithms ...
//! ctx.finalize()?;
//! ```

mod chunks;
mod cluster;
mod combine;
mod config;
mod context;
mod pool;
mod single;
mod store;
mod r#trait;

// Re-exports
pub use chunks::{calc_chunk_sizes, run_chunk, ChunkJob, ChunkKey, ChunkOutput, ChunkPlan};
pub use cluster::ClusterEngine;
pub use combine::combine_results;
pub use config::EngineConfig;
pub use context::{active_engine, CalcMode, CalcRequest, EngineContext};
pub use pool::PoolEngine;
pub use r#trait::{DataCalcModel, Engine, OutputCoords};
pub use single::SingleEngine;
pub use store::{ChunkStore, StoreFragment};

use tracing::info;

use crate::error::{Result, WakeError};

/// Names accepted by [`create_engine`]
pub const ENGINE_NAMES: [&str; 3] = ["cluster", "pool", "single"];

/// Create an engine by name
///
/// The engine is not initialized yet; hand it to
/// [`EngineContext::initialize`].
///
/// # Arguments
///
/// * `name` - `single`, `pool` or `cluster`
/// * `config` - Chunk sizes and worker count
///
/// # Returns
///
/// A boxed `Engine`, or `UnknownEngine` listing the available names
pub fn create_engine(name: &str, config: EngineConfig) -> Result<Box<dyn Engine>> {
    config.validate()?;
    let engine: Box<dyn Engine> = match name {
        "single" => Box::new(SingleEngine::new(config)),
        "pool" => Box::new(PoolEngine::new(config)),
        "cluster" => Box::new(ClusterEngine::new(config)),
        other => {
            return Err(WakeError::UnknownEngine {
                name: other.to_string(),
                available: ENGINE_NAMES.iter().map(ToString::to_string).collect(),
            })
        }
    };
    info!("Selected '{}' engine", engine.name());
    Ok(engine)
}
