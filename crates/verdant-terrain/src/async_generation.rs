//! Asynchronous chunk generation with a configurable thread pool.
//!
//! Offloads the generation pipeline to background threads, supports
//! cancellation, and delivers completed chunks via bounded channels.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use dashmap::DashMap;
use tracing::{debug, warn};
use verdant_voxel::ChunkPos;

use crate::pipeline::{BiomeSelection, GeneratedChunk, TerrainPipeline};

/// A request to generate a single chunk.
#[derive(Clone, Debug)]
pub struct GenerationTask {
    pub pos: ChunkPos,
    pub selection: BiomeSelection,
    /// Lower values are generated first within a batch. Typically the
    /// squared distance from the chunk to the point of interest.
    pub priority: u64,
}

/// A completed chunk and how long it took.
#[derive(Debug)]
pub struct GenerationResult {
    pub chunk: GeneratedChunk,
    /// Generation time in microseconds (for profiling).
    pub generation_time_us: u64,
    /// Ticket of the submission that produced this chunk.
    pub submission: u64,
}

/// Internal wrapper that carries the task and its cancellation flag.
struct PendingTask {
    task: GenerationTask,
    ticket: u64,
    cancelled: Arc<AtomicBool>,
}

/// The latest submission for a position.
type ActiveTask = (u64, Arc<AtomicBool>);

/// Manages asynchronous chunk generation across a thread pool.
pub struct AsyncChunkGenerator {
    task_sender: Sender<PendingTask>,
    result_receiver: Receiver<GenerationResult>,
    /// Ticket and shared cancellation flag of the latest submission per
    /// position.
    active_tasks: Arc<DashMap<ChunkPos, ActiveTask>>,
    next_ticket: AtomicU64,
    /// Tasks queued or executing.
    in_flight: Arc<AtomicU64>,
    workers: usize,
}

impl AsyncChunkGenerator {
    /// Create a generator with `thread_count` workers sharing `pipeline`.
    ///
    /// `max_concurrent` bounds the task queue (twice this many may wait) and
    /// `result_capacity` the completed-chunk channel. Fails only if no
    /// worker thread could be spawned.
    pub fn new(
        pipeline: Arc<TerrainPipeline>,
        thread_count: usize,
        max_concurrent: usize,
        result_capacity: usize,
    ) -> io::Result<Self> {
        let (task_sender, task_receiver) = bounded::<PendingTask>(max_concurrent.max(1) * 2);
        let (result_sender, result_receiver) = bounded::<GenerationResult>(result_capacity.max(1));
        let in_flight = Arc::new(AtomicU64::new(0));

        let mut workers = 0;
        let mut last_error = None;
        for index in 0..thread_count.max(1) {
            let receiver = task_receiver.clone();
            let sender = result_sender.clone();
            let in_flight = Arc::clone(&in_flight);
            let pipeline = Arc::clone(&pipeline);

            let spawned = std::thread::Builder::new()
                .name(format!("chunk-gen-{index}"))
                .spawn(move || {
                    while let Ok(pending) = receiver.recv() {
                        // Check cancellation before starting work.
                        if pending.cancelled.load(Ordering::Relaxed) {
                            in_flight.fetch_sub(1, Ordering::Relaxed);
                            continue;
                        }

                        let start = std::time::Instant::now();
                        let chunk = pipeline.generate(pending.task.pos, &pending.task.selection);
                        let elapsed = start.elapsed().as_micros() as u64;

                        // Check cancellation after generation.
                        if !pending.cancelled.load(Ordering::Relaxed) {
                            let _ = sender.send(GenerationResult {
                                chunk,
                                generation_time_us: elapsed,
                                submission: pending.ticket,
                            });
                        }

                        in_flight.fetch_sub(1, Ordering::Relaxed);
                    }
                });

            match spawned {
                Ok(_) => workers += 1,
                Err(e) => {
                    warn!("Failed to spawn chunk generation worker {index}: {e}");
                    last_error = Some(e);
                }
            }
        }

        if workers == 0
            && let Some(e) = last_error
        {
            return Err(e);
        }
        debug!("Started {workers} chunk generation workers");

        Ok(Self {
            task_sender,
            result_receiver,
            active_tasks: Arc::new(DashMap::new()),
            next_ticket: AtomicU64::new(0),
            in_flight,
            workers,
        })
    }

    /// Create a generator with a sensible default thread count based on CPU cores.
    pub fn with_defaults(pipeline: Arc<TerrainPipeline>) -> io::Result<Self> {
        Self::new(pipeline, default_thread_count(), 64, 128)
    }

    /// Number of worker threads actually running.
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Submit a chunk for background generation.
    ///
    /// Returns `Ok(())` if the task was queued, or `Err(task)` if the queue is full.
    /// A queued task supersedes any earlier submission for the same position,
    /// which is cancelled.
    #[allow(clippy::result_large_err)]
    pub fn submit(&self, task: GenerationTask) -> Result<(), GenerationTask> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(AtomicBool::new(false));
        let previous = self.active_tasks.insert(task.pos, (ticket, Arc::clone(&cancelled)));
        self.in_flight.fetch_add(1, Ordering::Relaxed);

        match self.task_sender.try_send(PendingTask {
            task,
            ticket,
            cancelled,
        }) {
            Ok(()) => {
                if let Some((_, superseded)) = previous {
                    superseded.store(true, Ordering::Relaxed);
                }
                Ok(())
            }
            Err(e) => {
                self.in_flight.fetch_sub(1, Ordering::Relaxed);
                let pending = e.into_inner();
                self.forget(pending.task.pos, ticket);
                if let Some(previous) = previous {
                    self.active_tasks.entry(pending.task.pos).or_insert(previous);
                }
                Err(pending.task)
            }
        }
    }

    /// Drop the entry for `pos` only if it still belongs to `ticket`.
    fn forget(&self, pos: ChunkPos, ticket: u64) {
        self.active_tasks.remove_if(&pos, |_, (current, _)| *current == ticket);
    }

    /// Submit several tasks, lowest priority value first. Returns the tasks
    /// that did not fit in the queue.
    pub fn submit_batch(&self, mut tasks: Vec<GenerationTask>) -> Vec<GenerationTask> {
        tasks.sort_by_key(|t| t.priority);
        tasks
            .into_iter()
            .filter_map(|task| self.submit(task).err())
            .collect()
    }

    /// Cancel a pending or in-progress generation task.
    ///
    /// If the task has already completed, this is a no-op.
    pub fn cancel(&self, pos: &ChunkPos) {
        if let Some((_, (_, cancelled))) = self.active_tasks.remove(pos) {
            cancelled.store(true, Ordering::Relaxed);
        }
    }

    /// Drain all completed chunks from the result channel.
    pub fn drain_results(&self) -> Vec<GenerationResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_receiver.try_recv() {
            self.forget(result.chunk.pos, result.submission);
            results.push(result);
        }
        results
    }

    /// Number of tasks currently in flight (queued or executing).
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Returns `true` if a task for the given position is currently pending.
    pub fn is_pending(&self, pos: &ChunkPos) -> bool {
        self.active_tasks.contains_key(pos)
    }
}

/// Leaves headroom for the calling thread.
pub fn default_thread_count() -> usize {
    let cpus = num_cpus::get().max(2);
    (cpus - 1).max(1)
}
