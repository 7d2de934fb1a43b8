//! Chunk partitioning and the per-chunk calculation wrapper
//!
//! The domain is cut into contiguous state ranges and, for point
//! calculations, contiguous target ranges. Chunk boundaries depend only on
//! the axis extents and the configured chunk sizes, never on scheduling, so
//! every engine sees the same jobs.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DataCalcModel, EngineConfig, StoreFragment};
use crate::algorithms::FarmSetup;
use crate::core_types::{Axis, ChunkData, VarMap};
use crate::error::{Result, WakeError};

/// Position of a chunk in the state x target chunk grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey {
    /// State chunk index
    pub states: usize,
    /// Target chunk index
    pub targets: usize,
}

impl ChunkKey {
    /// Create a chunk key
    #[must_use]
    pub const fn new(states: usize, targets: usize) -> Self {
        Self { states, targets }
    }
}

impl std::fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.states, self.targets)
    }
}

/// Split an axis into chunk sizes
///
/// The number of chunks is `floor(extent / chunk_size)`, every chunk gets
/// `floor(extent / n_chunks)` entries and the remainder adds one entry to
/// each of the last chunks.
///
/// # Arguments
///
/// * `axis` - Axis being split, for error reporting
/// * `extent` - Axis length
/// * `chunk_size` - Requested chunk size, clamped to `1..=extent`
///
/// # Returns
///
/// Chunk sizes in axis order, summing to `extent`
pub fn calc_chunk_sizes(axis: Axis, extent: usize, chunk_size: usize) -> Result<Vec<usize>> {
    if extent == 0 {
        return Err(WakeError::EmptyAxis { axis });
    }
    let size = chunk_size.clamp(1, extent);
    let n_chunks = extent / size;
    let base = extent / n_chunks;
    let extra = extent - n_chunks * base;

    let mut sizes = vec![base; n_chunks];
    for s in &mut sizes[n_chunks - extra..] {
        *s += 1;
    }

    let sum: usize = sizes.iter().sum();
    if sum != extent {
        return Err(WakeError::ChunkSizes { axis, sum, extent });
    }
    Ok(sizes)
}

fn to_ranges(sizes: &[usize]) -> Vec<Range<usize>> {
    let mut start = 0;
    sizes
        .iter()
        .map(|&n| {
            let range = start..start + n;
            start += n;
            range
        })
        .collect()
}

/// State and target ranges of every chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    /// State range per state chunk
    pub states: Vec<Range<usize>>,
    /// Target range per target chunk
    pub targets: Vec<Range<usize>>,
}

impl ChunkPlan {
    /// Compute the chunk layout for a calculation
    ///
    /// # Arguments
    ///
    /// * `config` - Engine configuration with chunk sizes and worker count
    /// * `n_states` - Number of states
    /// * `n_targets` - Number of target points, 0 for farm calculations
    pub fn new(config: &EngineConfig, n_states: usize, n_targets: usize) -> Result<Self> {
        let state_size = config
            .chunk_size_states
            .unwrap_or_else(|| n_states.div_ceil(config.n_workers.max(1)));
        let states = to_ranges(&calc_chunk_sizes(Axis::State, n_states, state_size)?);

        let targets = if n_targets <= 1 {
            vec![0..n_targets]
        } else {
            to_ranges(&calc_chunk_sizes(
                Axis::Target,
                n_targets,
                config.chunk_size_points,
            )?)
        };
        debug!(
            "Chunk plan: {} state chunks x {} target chunks",
            states.len(),
            targets.len()
        );
        Ok(Self { states, targets })
    }

    /// Total number of chunks
    #[must_use]
    pub fn n_chunks(&self) -> usize {
        self.states.len() * self.targets.len()
    }

    /// All chunk keys in ascending order
    pub fn keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        (0..self.states.len())
            .flat_map(move |i| (0..self.targets.len()).map(move |j| ChunkKey::new(i, j)))
    }
}

/// Everything a worker needs to compute one chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkJob {
    /// Chunk position
    pub key: ChunkKey,
    /// Sliced input data, output variables pre-filled with NaN
    pub data: ChunkData,
    /// Chunk-store fragment of this chunk
    pub store: StoreFragment,
    /// Variables the calculation must return
    pub out_vars: Vec<String>,
    /// Axes of every output array
    pub out_dims: Vec<Axis>,
    /// Shape of every output array
    pub out_shape: Vec<usize>,
}

/// Result of one chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkOutput {
    /// Chunk position
    pub key: ChunkKey,
    /// One array per output variable
    pub results: VarMap,
    /// Updated chunk-store fragment
    pub store: StoreFragment,
}

/// Run a model on one chunk
///
/// Calls `ensure_variables` and `calculate`, fills output variables the
/// model did not return from chunk inputs of the expected shape, and checks
/// every output shape. Any failure is wrapped in `ChunkFailed` with the
/// chunk key.
pub fn run_chunk(model: &dyn DataCalcModel, setup: &FarmSetup, job: ChunkJob) -> Result<ChunkOutput> {
    let key = job.key;
    run_chunk_inner(model, setup, job).map_err(|source| WakeError::ChunkFailed {
        key,
        source: Box::new(source),
    })
}

fn run_chunk_inner(
    model: &dyn DataCalcModel,
    setup: &FarmSetup,
    job: ChunkJob,
) -> Result<ChunkOutput> {
    let ChunkJob {
        key,
        mut data,
        mut store,
        out_vars,
        out_dims,
        out_shape,
    } = job;

    model.ensure_variables(setup, &mut data)?;
    let mut calculated = model.calculate(setup, &mut data, &mut store)?;

    let goal = data.goal();
    let mut results = VarMap::default();
    let mut missing = Vec::new();
    for var in &out_vars {
        let array = match calculated.remove(var) {
            Some(array) => array,
            None => match goal.get(var) {
                Some(input) if input.shape() == out_shape.as_slice() => input.clone(),
                _ => {
                    missing.push(var.clone());
                    continue;
                }
            },
        };
        if array.shape() != out_shape.as_slice() || array.dims() != out_dims.as_slice() {
            return Err(WakeError::shape_mismatch(
                format!("output '{var}' of model '{}'", model.name()),
                &out_shape,
                array.shape(),
            ));
        }
        results.insert(var.clone(), array);
    }
    if !missing.is_empty() {
        return Err(WakeError::MissingResults {
            vars: missing,
            expected_shape: out_shape,
        });
    }

    Ok(ChunkOutput {
        key,
        results,
        store,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_sizes_sum_to_extent() {
        for extent in 1..60 {
            for size in 1..=extent + 3 {
                let sizes = calc_chunk_sizes(Axis::State, extent, size).unwrap();
                assert_eq!(sizes.iter().sum::<usize>(), extent);
                assert!(sizes.iter().all(|&s| s > 0));
                let min = sizes.iter().min().unwrap();
                let max = sizes.iter().max().unwrap();
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn test_remainder_goes_to_last_chunks() {
        assert_eq!(calc_chunk_sizes(Axis::State, 10, 3).unwrap(), vec![3, 3, 4]);
        assert_eq!(calc_chunk_sizes(Axis::State, 11, 4).unwrap(), vec![5, 6]);
        assert_eq!(calc_chunk_sizes(Axis::State, 5, 100).unwrap(), vec![5]);
    }

    #[test]
    fn test_empty_axis() {
        let err = calc_chunk_sizes(Axis::State, 0, 4).unwrap_err();
        assert_eq!(err, WakeError::EmptyAxis { axis: Axis::State });
    }

    #[test]
    fn test_plan_default_state_chunks() {
        let config = EngineConfig::default().with_workers(4);
        let plan = ChunkPlan::new(&config, 10, 0).unwrap();
        assert_eq!(plan.states, vec![0..3, 3..6, 6..10]);
        assert_eq!(plan.targets, vec![0..0]);
        assert_eq!(plan.n_chunks(), 3);
    }

    #[test]
    fn test_plan_target_chunks() {
        let config = EngineConfig::default()
            .with_workers(1)
            .with_chunk_size_points(4);
        let plan = ChunkPlan::new(&config, 2, 9).unwrap();
        assert_eq!(plan.states, vec![0..2]);
        assert_eq!(plan.targets, vec![0..4, 4..9]);
        let keys: Vec<ChunkKey> = plan.keys().collect();
        assert_eq!(keys, vec![ChunkKey::new(0, 0), ChunkKey::new(0, 1)]);
    }
}
