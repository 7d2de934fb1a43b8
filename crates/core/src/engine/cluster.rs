//! Message-passing engine on long-lived worker threads
//!
//! Workers share nothing with the coordinator but channels. Chunk jobs and
//! results cross the channel bincode-encoded, the way they would cross a
//! process or network boundary; the model and farm setup are broadcast once
//! per run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{run_chunk, ChunkJob, ChunkOutput, DataCalcModel, Engine, EngineConfig};
use crate::algorithms::FarmSetup;
use crate::error::{Result, WakeError};

/// Encoded `Result<ChunkOutput, WakeError>` tagged with its run
type ResultMessage = (u64, Vec<u8>);

enum WorkerMessage {
    /// Model and setup of the next run
    Broadcast {
        run_id: u64,
        model: Arc<dyn DataCalcModel>,
        setup: Arc<FarmSetup>,
    },
    /// Encoded [`ChunkJob`]
    Job { run_id: u64, payload: Vec<u8> },
    Shutdown,
}

struct Worker {
    inbox: Sender<WorkerMessage>,
    handle: JoinHandle<()>,
}

/// Runs chunks on worker threads fed through channels
pub struct ClusterEngine {
    config: EngineConfig,
    workers: Vec<Worker>,
    results: Option<Mutex<Receiver<ResultMessage>>>,
    next_run: AtomicU64,
}

impl ClusterEngine {
    /// Create a cluster engine; workers start on [`Engine::initialize`]
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            workers: Vec::new(),
            results: None,
            next_run: AtomicU64::new(0),
        }
    }

    /// Number of running workers
    #[must_use]
    pub fn n_running(&self) -> usize {
        self.workers.len()
    }

    fn receive(&self, results: &Receiver<ResultMessage>, outstanding: usize) -> Result<ResultMessage> {
        match self.config.result_timeout_ms {
            Some(ms) => results
                .recv_timeout(Duration::from_millis(ms))
                .map_err(|e| match e {
                    RecvTimeoutError::Timeout => WakeError::Timeout {
                        waited_ms: ms,
                        outstanding,
                    },
                    RecvTimeoutError::Disconnected => {
                        WakeError::Transport("all workers disconnected".to_string())
                    }
                }),
            None => results
                .recv()
                .map_err(|_| WakeError::Transport("all workers disconnected".to_string())),
        }
    }
}

fn decode_and_run(model: &dyn DataCalcModel, setup: &FarmSetup, payload: &[u8]) -> Result<ChunkOutput> {
    let job: ChunkJob =
        bincode::deserialize(payload).map_err(|e| WakeError::Transport(e.to_string()))?;
    let key = job.key;
    catch_unwind(AssertUnwindSafe(|| run_chunk(model, setup, job))).unwrap_or_else(|_| {
        Err(WakeError::ChunkFailed {
            key,
            source: Box::new(WakeError::Transport("worker panicked".to_string())),
        })
    })
}

fn worker_loop(index: usize, inbox: Receiver<WorkerMessage>, outbox: Sender<ResultMessage>) {
    let mut current: Option<(u64, Arc<dyn DataCalcModel>, Arc<FarmSetup>)> = None;
    while let Ok(message) = inbox.recv() {
        match message {
            WorkerMessage::Broadcast {
                run_id,
                model,
                setup,
            } => current = Some((run_id, model, setup)),
            WorkerMessage::Job { run_id, payload } => {
                let result = match &current {
                    Some((id, model, setup)) if *id == run_id => {
                        decode_and_run(model.as_ref(), setup, &payload)
                    }
                    _ => Err(WakeError::Transport(format!(
                        "worker {index} received a job for unknown run {run_id}"
                    ))),
                };
                let bytes = bincode::serialize(&result).unwrap_or_else(|e| {
                    warn!("Worker {} failed to encode result: {}", index, e);
                    Vec::new()
                });
                if outbox.send((run_id, bytes)).is_err() {
                    break;
                }
            }
            WorkerMessage::Shutdown => break,
        }
    }
    debug!("Worker {} stopped", index);
}

impl Engine for ClusterEngine {
    fn name(&self) -> &'static str {
        "cluster"
    }

    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn initialize(&mut self) -> Result<()> {
        if !self.workers.is_empty() {
            return Ok(());
        }
        let (result_tx, result_rx) = mpsc::channel();
        for index in 0..self.config.n_workers {
            let (tx, rx) = mpsc::channel();
            let outbox = result_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("wake-worker-{index}"))
                .spawn(move || worker_loop(index, rx, outbox))
                .map_err(|e| WakeError::Transport(e.to_string()))?;
            self.workers.push(Worker { inbox: tx, handle });
        }
        self.results = Some(Mutex::new(result_rx));
        info!("Cluster engine started {} workers", self.workers.len());
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        for worker in &self.workers {
            // a worker that already exited has dropped its inbox
            let _ = worker.inbox.send(WorkerMessage::Shutdown);
        }
        let mut panicked = Vec::new();
        for (index, worker) in self.workers.drain(..).enumerate() {
            if worker.handle.join().is_err() {
                panicked.push(index);
            }
        }
        self.results = None;
        if panicked.is_empty() {
            Ok(())
        } else {
            Err(WakeError::Transport(format!("workers {panicked:?} panicked")))
        }
    }

    fn run_chunks(
        &self,
        model: Arc<dyn DataCalcModel>,
        setup: Arc<FarmSetup>,
        jobs: Vec<ChunkJob>,
    ) -> Result<Vec<ChunkOutput>> {
        let results = self.results.as_ref().ok_or(WakeError::EngineNotInitialized)?;
        if self.workers.is_empty() {
            return Err(WakeError::EngineNotInitialized);
        }
        let results = results
            .lock()
            .map_err(|_| WakeError::Transport("result channel poisoned".to_string()))?;
        let run_id = self.next_run.fetch_add(1, Ordering::Relaxed);
        let send_error = |_| WakeError::Transport("worker disconnected".to_string());

        for worker in &self.workers {
            worker
                .inbox
                .send(WorkerMessage::Broadcast {
                    run_id,
                    model: Arc::clone(&model),
                    setup: Arc::clone(&setup),
                })
                .map_err(send_error)?;
        }

        let n_jobs = jobs.len();
        for (i, job) in jobs.into_iter().enumerate() {
            let payload = bincode::serialize(&job).map_err(|e| WakeError::Transport(e.to_string()))?;
            self.workers[i % self.workers.len()]
                .inbox
                .send(WorkerMessage::Job { run_id, payload })
                .map_err(send_error)?;
        }
        debug!("Run {}: submitted {} chunks to {} workers", run_id, n_jobs, self.workers.len());

        let mut outputs = Vec::with_capacity(n_jobs);
        while outputs.len() < n_jobs {
            let (id, bytes) = self.receive(&results, n_jobs - outputs.len())?;
            if id != run_id {
                debug!("Dropping stale result of run {}", id);
                continue;
            }
            let result: std::result::Result<ChunkOutput, WakeError> =
                bincode::deserialize(&bytes).map_err(|e| WakeError::Transport(e.to_string()))?;
            let output = result?;
            debug!("Run {}: chunk {} done", run_id, output.key);
            outputs.push(output);
        }
        info!("Run {}: received {} chunk results", run_id, outputs.len());
        Ok(outputs)
    }
}

impl Drop for ClusterEngine {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            warn!("Cluster engine shutdown failed: {}", e);
        }
    }
}
