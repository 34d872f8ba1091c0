// crates/strata-engine/src/pipeline.rs
//
// Pipeline engine: drives every work item through up to `max_layers` hops
// with a bounded worker pool.
//
// Exactly two pieces of mutable shared state exist: the rate limiter's
// grant slot (inside LedgerGate) and the checkpoint. Workers never write
// the checkpoint themselves; they hand completed items to a dedicated
// writer task over a channel.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::Instant;

use strata_core::{
    seed_from_identity, Checkpoint, CompletedItem, DerivationOracle, ErrorTag, ItemState,
    LayerResult, LedgerClient, OnChain, RunConfig, RunCounters, StrataError, WorkItem,
};
use strata_store::{CheckpointStore, ResultLog};

use crate::gate::LedgerGate;
use crate::limiter::RateLimiter;

/// Run-level outcome returned by [`PipelineEngine::run`].
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Items admitted to the worker pool this run.
    pub admitted: u64,
    /// Items skipped because the checkpoint already committed them.
    pub skipped: u64,
    /// Items fully committed this run.
    pub completed: u64,
    /// Items admitted but abandoned by a graceful shutdown.
    pub incomplete: u64,
    /// Final counters snapshot, including the distinct unknown total.
    pub counters: RunCounters,
}

/// Orchestrates the worker pool, the ledger gate, and the checkpoint writer.
pub struct PipelineEngine {
    config: RunConfig,
    oracle: Arc<dyn DerivationOracle>,
    ledger: Option<Arc<dyn LedgerClient>>,
}

/// Everything a worker needs, cloned per worker.
struct WorkerCtx {
    oracle: Arc<dyn DerivationOracle>,
    gate: Option<Arc<LedgerGate>>,
    max_layers: u32,
    call_timeout: Duration,
    rx: Arc<Mutex<mpsc::Receiver<String>>>,
    done: mpsc::Sender<CompletedItem>,
    shutdown: watch::Receiver<bool>,
}

impl PipelineEngine {
    pub fn new(
        config: RunConfig,
        oracle: Arc<dyn DerivationOracle>,
        ledger: Option<Arc<dyn LedgerClient>>,
    ) -> Self {
        Self {
            config,
            oracle,
            ledger,
        }
    }

    /// Run the pipeline over the given input ids until completion or
    /// graceful shutdown (signalled through the watch channel).
    ///
    /// Idempotent resume: ids already in the loaded checkpoint are skipped
    /// entirely; the oracle and the ledger receive zero calls for them.
    pub async fn run(
        &self,
        seeds: Vec<String>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunReport, StrataError> {
        self.config.validate()?;

        let store = CheckpointStore::new(&self.config.checkpoint_path);
        let checkpoint = store.load(self.config.force_restart)?;
        let log = ResultLog::new(&self.config.results_path);

        // Dedup within the run and skip ids the checkpoint already committed.
        let mut seen: HashSet<String> = HashSet::new();
        let mut pending: Vec<String> = Vec::new();
        let mut skipped = 0u64;
        for id in seeds {
            if !seen.insert(id.clone()) {
                continue;
            }
            if checkpoint.is_processed(&id) {
                skipped += 1;
            } else {
                pending.push(id);
            }
        }
        let admitted = pending.len() as u64;
        tracing::info!(
            "Pipeline starting: {} items admitted, {} already committed, {} workers, max {} layers",
            admitted,
            skipped,
            self.config.concurrency,
            self.config.max_layers
        );

        let gate = match (&self.ledger, self.config.rpc_enabled) {
            (Some(ledger), true) => Some(Arc::new(LedgerGate::new(
                ledger.clone(),
                Arc::new(RateLimiter::new(self.config.min_call_spacing)),
                self.config.max_retries,
                self.config.retry_backoff_base,
                self.config.call_timeout,
            ))),
            (None, true) => {
                tracing::warn!("RPC enabled but no ledger client wired; recording unknown");
                None
            }
            _ => None,
        };

        let (work_tx, work_rx) = mpsc::channel::<String>(self.config.concurrency.max(1));
        let work_rx = Arc::new(Mutex::new(work_rx));
        let (done_tx, done_rx) = mpsc::channel::<CompletedItem>(64);

        let writer = tokio::spawn(run_writer(
            done_rx,
            store,
            log,
            checkpoint,
            self.config.save_every_n,
            admitted,
        ));

        // Feeder: stops admitting new items once shutdown is requested, even
        // while parked on a full queue (busy workers stop pulling after the
        // flag flips, so a plain send would never complete). Dropping the
        // sender on exit unblocks workers waiting on an empty queue.
        let mut feeder_shutdown = shutdown.clone();
        let feeder = tokio::spawn(async move {
            for id in pending {
                if *feeder_shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    sent = work_tx.send(id) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                    _ = shutdown_requested(&mut feeder_shutdown) => break,
                }
            }
        });

        let mut workers = Vec::new();
        for worker in 0..self.config.concurrency {
            let ctx = WorkerCtx {
                oracle: self.oracle.clone(),
                gate: gate.clone(),
                max_layers: self.config.max_layers,
                call_timeout: self.config.call_timeout,
                rx: work_rx.clone(),
                done: done_tx.clone(),
                shutdown: shutdown.clone(),
            };
            workers.push(tokio::spawn(run_worker(worker, ctx)));
        }
        drop(done_tx);

        feeder
            .await
            .map_err(|e| StrataError::InvalidState(format!("feeder task failed: {}", e)))?;
        for handle in workers {
            handle
                .await
                .map_err(|e| StrataError::InvalidState(format!("worker task failed: {}", e)))?;
        }

        let (checkpoint, completed) = writer
            .await
            .map_err(|e| StrataError::InvalidState(format!("writer task failed: {}", e)))??;

        let incomplete = admitted - completed;
        if incomplete > 0 {
            tracing::warn!(
                "Run stopped with {} incomplete item(s); rerun with the same checkpoint to finish",
                incomplete
            );
        }
        tracing::info!(
            "Pipeline finished: {} completed, {} incomplete, {} unknown verdicts",
            completed,
            incomplete,
            checkpoint.counters.on_chain_unknown
        );

        Ok(RunReport {
            admitted,
            skipped,
            completed,
            incomplete,
            counters: checkpoint.counters,
        })
    }
}

/// Resolve once the shutdown flag flips to true. Never resolves when the
/// sender is gone with the flag still false, so callers racing this against
/// other work are not tripped by a dropped sender.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|requested| *requested).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Worker loop: pull one id at a time and drive its full chain.
async fn run_worker(worker: usize, ctx: WorkerCtx) {
    loop {
        if *ctx.shutdown.borrow() {
            tracing::debug!("Worker {} stopping: shutdown requested", worker);
            break;
        }

        let id = { ctx.rx.lock().await.recv().await };
        let Some(id) = id else {
            break;
        };

        match process_item(&id, &ctx).await {
            Some(item) => {
                // Writer gone means the run is aborting; nothing left to do.
                if ctx.done.send(item).await.is_err() {
                    break;
                }
            }
            None => {
                tracing::debug!(
                    "Worker {} abandoned an item mid-chain for shutdown; it will rerun",
                    worker
                );
                break;
            }
        }
    }
}

/// Drive one item through its layer chain sequentially.
///
/// Layers within an item are never parallelized: layer N+1's seed is a pure
/// function of layer N's identity. Returns `None` when a graceful shutdown
/// interrupted the chain after a completed layer; the item stays
/// uncommitted and reruns from layer 0 next time.
async fn process_item(id: &str, ctx: &WorkerCtx) -> Option<CompletedItem> {
    let mut item = WorkItem::new(id);
    let mut prev_identity: Option<String> = None;

    while item.current_layer < ctx.max_layers && !item.is_finished() {
        let layer = item.current_layer + 1;
        item.state = ItemState::Pending;
        item.attempts = 0;

        // Layer 1 uses the original input seed unchanged; later layers use
        // the shared transform of the previous layer's identity.
        let seed = match &prev_identity {
            None => item.id.clone(),
            Some(identity) => match seed_from_identity(identity) {
                Some(seed) => seed,
                None => {
                    // The identity cannot seed a next layer; the chain ends.
                    item.state = ItemState::Done;
                    break;
                }
            },
        };

        item.state = ItemState::Deriving;
        let identity = match tokio::time::timeout(ctx.call_timeout, ctx.oracle.derive(&seed)).await
        {
            Ok(Ok(identity)) => identity,
            Ok(Err(e)) => {
                fail_layer(&mut item, layer, seed, &e.to_string());
                break;
            }
            Err(_elapsed) => {
                fail_layer(&mut item, layer, seed, "derivation call timed out");
                break;
            }
        };
        item.state = ItemState::Derived;

        let (on_chain, balance, error) = match &ctx.gate {
            Some(gate) => {
                item.state = ItemState::Verifying;
                let verification = gate.check(&identity).await;
                item.attempts = verification.retries;
                (verification.on_chain, verification.balance, verification.error)
            }
            None => (OnChain::Unknown, None, None),
        };

        item.history.push(LayerResult {
            layer,
            seed,
            identity: Some(identity.clone()),
            derivable: true,
            on_chain,
            balance,
            error,
        });
        item.current_layer = layer;
        item.state = ItemState::LayerComplete;

        if layer >= ctx.max_layers {
            item.state = ItemState::Done;
            break;
        }
        prev_identity = Some(identity);

        // Graceful shutdown boundary: the current layer is finished, the
        // rest of the chain is abandoned uncommitted.
        if *ctx.shutdown.borrow() {
            return None;
        }
    }

    if !item.is_finished() {
        item.state = ItemState::Done;
    }
    Some(item.into_completed())
}

/// Record a terminal derivation failure for the current layer.
///
/// The oracle is deterministic, so there is nothing to retry: the item
/// transitions straight to `PermanentlyFailed`.
fn fail_layer(item: &mut WorkItem, layer: u32, seed: String, reason: &str) {
    tracing::debug!(
        "Derivation failed at layer {} (item {}...): {}",
        layer,
        id_prefix(&item.id),
        reason
    );
    item.history.push(LayerResult {
        layer,
        seed,
        identity: None,
        derivable: false,
        on_chain: OnChain::Unknown,
        balance: None,
        error: Some(ErrorTag::DerivationFailed),
    });
    item.current_layer = layer;
    item.state = ItemState::PermanentlyFailed;
}

/// First 12 characters of an id for log lines. Ids are not guaranteed ASCII,
/// so byte slicing would panic on a multibyte boundary.
fn id_prefix(id: &str) -> String {
    id.chars().take(12).collect()
}

/// Dedicated checkpoint writer: the single owner of the checkpoint and the
/// result log. Appends each finished item, folds it into the counters, and
/// commits a checkpoint every `save_every_n` items plus once at the end.
///
/// Commit order per item: result line durable first, then the id enters
/// `processed_ids`. An id is therefore never checkpointed ahead of its
/// layer results.
async fn run_writer(
    mut rx: mpsc::Receiver<CompletedItem>,
    store: CheckpointStore,
    log: ResultLog,
    mut checkpoint: Checkpoint,
    save_every_n: u64,
    admitted: u64,
) -> Result<(Checkpoint, u64), StrataError> {
    let started = Instant::now();
    let mut completed = 0u64;
    let mut since_save = 0u64;

    while let Some(item) = rx.recv().await {
        log.append(&item)?;
        checkpoint.counters.record(&item);
        checkpoint.processed_ids.insert(item.id);
        completed += 1;
        since_save += 1;

        if since_save >= save_every_n {
            store.save(&checkpoint)?;
            since_save = 0;

            let elapsed = started.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                completed as f64 / elapsed
            } else {
                0.0
            };
            let eta_min = if rate > 0.0 {
                (admitted.saturating_sub(completed)) as f64 / rate / 60.0
            } else {
                0.0
            };
            tracing::info!(
                "Progress: {}/{} items ({:.1}%), {:.1} items/s, ETA {:.1} min",
                completed,
                admitted,
                completed as f64 * 100.0 / admitted.max(1) as f64,
                rate,
                eta_min
            );
        }
    }

    // Final flush covers the tail below the save boundary.
    store.save(&checkpoint)?;
    Ok((checkpoint, completed))
}
