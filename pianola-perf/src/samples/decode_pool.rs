//! Parallel sample decode pool
//!
//! A fixed set of worker threads decodes sample bytes off the async runtime.
//! Each worker has its own job channel; submissions are handed out
//! round-robin. A single coordinator task owns the table of pending requests,
//! so correlation of completions to waiting callers never needs a lock.
//!
//! Worker threads only decode and report back. They never touch the pending
//! table.
//!
//! Once the pool starts shutting down, workers finish the job in hand and
//! discard anything still queued for them without decoding it.
//!
//! There is no per-request timeout: a worker that never reports back leaves
//! its submission pending for as long as the pool lives.

use super::decoder::{DecodedPcm, PcmDecoder};
use super::preload::SampleSource;
use crate::error::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::mpsc as std_mpsc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Decoded sample as delivered to the submitter
#[derive(Debug, Clone)]
pub struct DecodeResult {
    /// Correlation id assigned at submission
    pub id: Uuid,

    /// One sample sequence per channel
    pub pcm_channels: Vec<Vec<f32>>,

    pub sample_rate: u32,
}

impl DecodeResult {
    pub fn frames(&self) -> usize {
        self.pcm_channels.first().map(|c| c.len()).unwrap_or(0)
    }
}

/// Work handed to one worker thread
struct DecodeJob {
    id: Uuid,
    bytes: Vec<u8>,
}

/// Worker report back to the coordinator
struct Completion {
    id: Uuid,
    outcome: Result<DecodedPcm>,
}

enum PoolCommand {
    Submit {
        bytes: Vec<u8>,
        reply: oneshot::Sender<Option<DecodeResult>>,
    },
    PendingCount(oneshot::Sender<usize>),
    Shutdown,
}

/// Fixed-size decode pool
pub struct DecodePool {
    commands: mpsc::UnboundedSender<PoolCommand>,
    coordinator: tokio::task::JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
    size: usize,
}

impl DecodePool {
    /// Start `size` worker threads (at least one) and the coordinator task
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(size: usize, decoder: Arc<dyn PcmDecoder>) -> Result<Self> {
        let size = size.max(1);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let stop_flag = Arc::new(AtomicBool::new(false));

        let mut job_senders = Vec::with_capacity(size);
        let mut workers = Vec::with_capacity(size);
        for worker_id in 0..size {
            let (job_tx, job_rx) = std_mpsc::channel::<DecodeJob>();
            let decoder = Arc::clone(&decoder);
            let completions = completion_tx.clone();
            let stop = Arc::clone(&stop_flag);

            let handle = thread::Builder::new()
                .name(format!("decode-worker-{}", worker_id))
                .spawn(move || Self::worker_loop(worker_id, job_rx, decoder, completions, stop))?;

            job_senders.push(job_tx);
            workers.push(handle);
        }
        // Workers hold the only completion senders
        drop(completion_tx);

        let (commands, command_rx) = mpsc::unbounded_channel();
        let coordinator = tokio::spawn(Self::coordinate(
            command_rx,
            completion_rx,
            job_senders,
            stop_flag,
        ));

        info!("Decode pool started with {} worker threads", size);

        Ok(Self {
            commands,
            coordinator,
            workers,
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Queue `bytes` for decoding
    ///
    /// The request is registered immediately; the returned future resolves
    /// with the decoded PCM, or `None` if the bytes could not be decoded or
    /// the pool has shut down.
    pub fn submit(&self, bytes: Vec<u8>) -> impl Future<Output = Option<DecodeResult>> + Send + 'static {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(PoolCommand::Submit { bytes, reply })
            .is_err()
        {
            warn!("Decode pool is shut down; submission dropped");
        }

        async move { response.await.ok().flatten() }
    }

    /// Fetch `name` from `source` and decode it
    ///
    /// A source that cannot provide the bytes resolves to `None` without
    /// touching the workers.
    pub async fn submit_source(&self, source: &dyn SampleSource, name: &str) -> Option<DecodeResult> {
        match source.fetch(name).await {
            Ok(bytes) => self.submit(bytes).await,
            Err(e) => {
                warn!("Skipping sample {}: {}", name, e);
                None
            }
        }
    }

    /// Number of submissions still waiting for a worker result
    pub async fn pending_count(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(PoolCommand::PendingCount(tx)).is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    /// Stop accepting work and join all workers
    ///
    /// Submissions still pending resolve to `None`. Jobs already running on a
    /// worker finish before that worker exits.
    pub async fn shutdown(self) {
        info!("Shutting down decode pool");
        let _ = self.commands.send(PoolCommand::Shutdown);

        if let Err(e) = self.coordinator.await {
            warn!("Decode pool coordinator ended abnormally: {}", e);
        }

        let workers = self.workers;
        let joined = tokio::task::spawn_blocking(move || {
            for (worker_id, handle) in workers.into_iter().enumerate() {
                if handle.join().is_err() {
                    warn!("Decode worker {} panicked", worker_id);
                }
            }
        })
        .await;

        match joined {
            Ok(()) => info!("Decode pool shut down"),
            Err(e) => warn!("Failed to join decode workers: {}", e),
        }
    }

    fn worker_loop(
        worker_id: usize,
        jobs: std_mpsc::Receiver<DecodeJob>,
        decoder: Arc<dyn PcmDecoder>,
        completions: mpsc::UnboundedSender<Completion>,
        stop_flag: Arc<AtomicBool>,
    ) {
        debug!("Decode worker {} started", worker_id);

        // Ends when the coordinator drops this worker's job sender
        while let Ok(job) = jobs.recv() {
            if stop_flag.load(Ordering::Relaxed) {
                debug!("Worker {} discarding {} (pool shutting down)", worker_id, job.id);
                continue;
            }
            debug!("Worker {} decoding {} ({} bytes)", worker_id, job.id, job.bytes.len());
            let outcome = decoder.decode(&job.bytes);
            if completions
                .send(Completion {
                    id: job.id,
                    outcome,
                })
                .is_err()
            {
                break;
            }
        }

        debug!("Decode worker {} exiting", worker_id);
    }

    async fn coordinate(
        mut commands: mpsc::UnboundedReceiver<PoolCommand>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
        workers: Vec<std_mpsc::Sender<DecodeJob>>,
        stop_flag: Arc<AtomicBool>,
    ) {
        let mut pending: HashMap<Uuid, oneshot::Sender<Option<DecodeResult>>> = HashMap::new();
        let mut next_worker = 0usize;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(PoolCommand::Submit { bytes, reply }) => {
                        let mut id = Uuid::new_v4();
                        while pending.contains_key(&id) {
                            id = Uuid::new_v4();
                        }
                        pending.insert(id, reply);

                        let worker = next_worker;
                        next_worker = (next_worker + 1) % workers.len();

                        if workers[worker].send(DecodeJob { id, bytes }).is_err() {
                            warn!("Decode worker {} is gone; dropping request {}", worker, id);
                            if let Some(reply) = pending.remove(&id) {
                                let _ = reply.send(None);
                            }
                        }
                    }
                    Some(PoolCommand::PendingCount(reply)) => {
                        let _ = reply.send(pending.len());
                    }
                    Some(PoolCommand::Shutdown) | None => break,
                },
                Some(completion) = completions.recv() => {
                    let Some(reply) = pending.remove(&completion.id) else {
                        warn!("Decode completion for unknown request {}", completion.id);
                        continue;
                    };

                    let result = match completion.outcome {
                        Ok(pcm) => Some(DecodeResult {
                            id: completion.id,
                            pcm_channels: pcm.channels,
                            sample_rate: pcm.sample_rate,
                        }),
                        Err(e) => {
                            warn!("Decode of request {} failed: {}", completion.id, e);
                            None
                        }
                    };

                    // Submitter may have stopped waiting
                    let _ = reply.send(result);
                }
            }
        }

        // Set before the job senders drop so queued work is skipped
        stop_flag.store(true, Ordering::Relaxed);

        if !pending.is_empty() {
            debug!("Abandoning {} pending decode requests", pending.len());
        }
    }
}
