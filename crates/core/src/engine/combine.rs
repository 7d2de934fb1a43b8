//! Reassembly of chunk outputs into full datasets

use tracing::debug;

use super::{CalcMode, ChunkOutput, ChunkPlan, ChunkStore};
use crate::core_types::{Axis, Dataset, VarArray, VarMap};
use crate::error::{Result, WakeError};

/// Combine chunk outputs into one dataset
///
/// Outputs are ordered by chunk key, joined along the target axis within
/// every state chunk and then along the state axis, so the result does not
/// depend on the order in which workers finished.
///
/// # Arguments
///
/// * `outputs` - One output per chunk of `plan`, in any order
/// * `plan` - Chunk layout of the run
/// * `out_vars` - Variables to assemble
/// * `states` - State coordinate of the result
/// * `store` - Chunk store receiving the returned fragments
/// * `mode` - Whether fragments are kept for another iteration
pub fn combine_results(
    mut outputs: Vec<ChunkOutput>,
    plan: &ChunkPlan,
    out_vars: &[String],
    states: Vec<usize>,
    store: &mut ChunkStore,
    mode: CalcMode,
) -> Result<Dataset> {
    if outputs.len() != plan.n_chunks() {
        return Err(WakeError::shape_mismatch(
            "chunk outputs",
            &[plan.n_chunks()],
            &[outputs.len()],
        ));
    }
    outputs.sort_by_key(|o| o.key);

    let n_targets = plan.targets.len();
    let mut vars = VarMap::default();
    for var in out_vars {
        let mut state_parts = Vec::with_capacity(plan.states.len());
        for row in outputs.chunks(n_targets) {
            let parts = row
                .iter()
                .map(|o| {
                    o.results
                        .get(var)
                        .cloned()
                        .ok_or_else(|| WakeError::MissingResults {
                            vars: vec![var.clone()],
                            expected_shape: Vec::new(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            let joined = if n_targets > 1 {
                VarArray::concat(&parts, Axis::Target)?
            } else {
                parts.into_iter().next().ok_or(WakeError::EmptyAxis { axis: Axis::Target })?
            };
            state_parts.push(joined);
        }
        vars.insert(var.clone(), VarArray::concat(&state_parts, Axis::State)?);
    }

    if mode.keeps_store() {
        for output in outputs {
            store.insert(output.key, output.store);
        }
        debug!("Chunk store holds {} fragments", store.len());
    } else {
        store.clear();
    }

    Ok(Dataset::from_vars(states, vars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ChunkKey, EngineConfig, StoreFragment};

    fn output(key: ChunkKey, states: &[f64], n_targets: usize) -> ChunkOutput {
        let data: Vec<f64> = states
            .iter()
            .flat_map(|&s| (0..n_targets).map(move |t| s * 100.0 + (key.targets * 10 + t) as f64))
            .collect();
        let array = VarArray::new(
            &[Axis::State, Axis::Target, Axis::TPoint],
            &[states.len(), n_targets, 1],
            data,
        )
        .unwrap();
        let mut results = VarMap::default();
        results.insert("WS".to_string(), array);
        let mut store = StoreFragment::default();
        store.insert("WS".to_string(), VarArray::from_1d(Axis::State, states.to_vec()));
        ChunkOutput {
            key,
            results,
            store,
        }
    }

    #[test]
    fn test_combine_order_independent() {
        let config = EngineConfig::default()
            .with_workers(1)
            .with_chunk_size_states(2)
            .with_chunk_size_points(2);
        let plan = ChunkPlan::new(&config, 4, 4).unwrap();
        assert_eq!(plan.n_chunks(), 4);

        let outputs = vec![
            output(ChunkKey::new(1, 1), &[2.0, 3.0], 2),
            output(ChunkKey::new(0, 0), &[0.0, 1.0], 2),
            output(ChunkKey::new(1, 0), &[2.0, 3.0], 2),
            output(ChunkKey::new(0, 1), &[0.0, 1.0], 2),
        ];
        let mut store = ChunkStore::new();
        let vars = vec!["WS".to_string()];
        let ds = combine_results(
            outputs,
            &plan,
            &vars,
            vec![0, 1, 2, 3],
            &mut store,
            CalcMode::iteration(),
        )
        .unwrap();

        let ws = ds.var("WS").unwrap();
        assert_eq!(ws.shape(), &[4, 4, 1]);
        assert_eq!(ws.get3(0, 0, 0), 0.0);
        assert_eq!(ws.get3(0, 2, 0), 10.0);
        assert_eq!(ws.get3(3, 1, 0), 301.0);
        assert_eq!(ws.get3(3, 3, 0), 311.0);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_final_mode_clears_store() {
        let config = EngineConfig::default().with_workers(1);
        let plan = ChunkPlan::new(&config, 2, 3).unwrap();
        let mut store = ChunkStore::new();
        store.insert(ChunkKey::new(0, 0), StoreFragment::default());
        let outputs = vec![output(ChunkKey::new(0, 0), &[0.0, 1.0], 3)];
        let vars = vec!["WS".to_string()];
        combine_results(outputs, &plan, &vars, vec![0, 1], &mut store, CalcMode::single()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_chunk_rejected() {
        let config = EngineConfig::default().with_workers(2);
        let plan = ChunkPlan::new(&config, 4, 0).unwrap();
        let mut store = ChunkStore::new();
        let err = combine_results(
            Vec::new(),
            &plan,
            &[],
            vec![0, 1, 2, 3],
            &mut store,
            CalcMode::single(),
        )
        .unwrap_err();
        assert!(matches!(err, WakeError::ShapeMismatch { .. }));
    }
}
