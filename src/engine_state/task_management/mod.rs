//! # Task Management System
//!
//! A fixed-size pool of worker threads that turns chunk snapshots into mesh
//! buffers off the coordinating thread.
//!
//! ## Architecture Overview
//! - `MeshWorkerPool`: owns the workers and a FIFO queue of pending tasks
//! - `Task` and `TaskResult`: a unit of work and its output, see [`task`]
//!
//! Every worker runs at most one task at a time, so the number of workers is
//! the concurrency ceiling. Work beyond the ceiling waits in the queue and is
//! dequeued in submission order whenever a worker finishes.
//!
//! ## Platform-Specific Behavior
//! - **Native**: workers are `std::thread`s
//! - **Web**: workers are spawned with the `wasm_thread` crate
//!
//! ## Failure Handling
//! A task that panics is caught with `catch_unwind`. Its worker slot is always
//! reclaimed and the queue keeps draining; the awaiting caller sees
//! [`EngineError::WorkerFailed`].
//!
//! ## Example Usage
//! ```no_run
//! use voxel_terrain::engine_state::rendering::meshing::MeshSnapshot;
//! use voxel_terrain::engine_state::task_management::MeshWorkerPool;
//! use voxel_terrain::engine_state::voxels::terrain::TerrainSynthesizer;
//!
//! let pool = MeshWorkerPool::new(4);
//! let chunk = TerrainSynthesizer::new(3).generate_chunk(0, 0);
//! let mesh = pollster::block_on(pool.submit(MeshSnapshot::capture(&chunk), 0)).unwrap();
//! assert!(!mesh.is_empty());
//! pool.dispose();
//! ```

pub mod task;

use std::{
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
};

use futures::{
    channel::oneshot,
    future::{self, BoxFuture},
    FutureExt,
};
use task::Task;

#[cfg(target_family = "wasm")]
mod wasm_imports {
    pub use wasm_thread as thread;
    pub use wasm_thread::JoinHandle;
}

#[cfg(target_family = "wasm")]
use self::wasm_imports::*;

#[cfg(not(target_family = "wasm"))]
use std::thread::{self, JoinHandle};

use crate::{
    engine_state::rendering::{
        meshing::{mesh::MeshBuffers, snapshot::MeshSnapshot, ChunkMesher, GreedyMesher},
        tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask,
    },
    error::{EngineError, EngineResult},
};

/// Counters describing the pool at one instant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerPoolStats {
    pub workers: usize,
    /// Tasks currently being processed.
    pub active: usize,
    /// Highest value `active` has ever reached.
    pub peak_active: usize,
    pub queued: usize,
    pub completed: u64,
    /// Tasks that panicked.
    pub failed: u64,
}

struct PoolState {
    queue: VecDeque<Box<dyn Task>>,
    active: usize,
    peak_active: usize,
    completed: u64,
    failed: u64,
    shutting_down: bool,
}

type SharedState = Arc<(Mutex<PoolState>, Condvar)>;

fn lock(state: &Mutex<PoolState>) -> MutexGuard<'_, PoolState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bounded executor for meshing work.
pub struct MeshWorkerPool {
    shared: SharedState,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    mesher: Arc<dyn ChunkMesher>,
}

impl MeshWorkerPool {
    /// Creates a pool with `num_workers` threads (at least one) that meshes
    /// with [`GreedyMesher`].
    pub fn new(num_workers: usize) -> Self {
        Self::with_mesher(num_workers, Arc::new(GreedyMesher))
    }

    /// Creates a pool whose meshing jobs run `mesher`.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads, which is also the maximum
    ///   number of tasks in flight
    /// * `mesher` - Builds the buffers of every submitted snapshot
    pub fn with_mesher(num_workers: usize, mesher: Arc<dyn ChunkMesher>) -> Self {
        let worker_count = num_workers.max(1);
        let shared: SharedState = Arc::new((
            Mutex::new(PoolState {
                queue: VecDeque::new(),
                active: 0,
                peak_active: 0,
                completed: 0,
                failed: 0,
                shutting_down: false,
            }),
            Condvar::new(),
        ));

        log::info!(
            "Starting mesh worker pool with {} workers (available parallelism: {:?})",
            worker_count,
            thread::available_parallelism()
        );

        let workers = (0..worker_count)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || worker_loop(shared))
            })
            .collect();

        Self {
            shared,
            workers: Mutex::new(workers),
            worker_count,
            mesher,
        }
    }

    /// Queues a meshing job for `snapshot` at `lod_level`.
    ///
    /// # Returns
    /// A future resolving to the mesh, or to [`EngineError::WorkerFailed`] when
    /// the job panicked, or [`EngineError::PoolDisposed`] when the pool no
    /// longer accepts work.
    pub fn submit(
        &self,
        snapshot: MeshSnapshot,
        lod_level: usize,
    ) -> BoxFuture<'static, EngineResult<MeshBuffers>> {
        let key = snapshot.key;
        let (sender, receiver) = oneshot::channel();
        let task = ChunkMeshGenerationTask::new(snapshot, lod_level, self.mesher.clone(), sender);

        if let Err(error) = self.publish_task(Box::new(task)) {
            return future::ready(Err(error)).boxed();
        }

        receiver
            .map(move |result| {
                result.map_err(|_| {
                    EngineError::WorkerFailed(format!("meshing chunk {key} was abandoned"))
                })
            })
            .boxed()
    }

    /// Appends a task to the queue and wakes an idle worker.
    pub fn publish_task(&self, task: Box<dyn Task>) -> EngineResult<()> {
        let (state, condvar) = &*self.shared;
        let mut state = lock(state);
        if state.shutting_down {
            return Err(EngineError::PoolDisposed);
        }
        state.queue.push_back(task);
        condvar.notify_one();
        Ok(())
    }

    pub fn stats(&self) -> WorkerPoolStats {
        let state = lock(&self.shared.0);
        WorkerPoolStats {
            workers: self.worker_count,
            active: state.active,
            peak_active: state.peak_active,
            queued: state.queue.len(),
            completed: state.completed,
            failed: state.failed,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.shared.0).shutting_down
    }

    /// Stops accepting work and drops queued tasks. Workers exit once their
    /// current task finishes; native workers are joined, web workers are
    /// detached. Calling it again does nothing.
    pub fn dispose(&self) {
        let dropped = {
            let (state, condvar) = &*self.shared;
            let mut state = lock(state);
            if state.shutting_down {
                return;
            }
            state.shutting_down = true;
            condvar.notify_all();
            std::mem::take(&mut state.queue)
        };
        if !dropped.is_empty() {
            log::debug!("Dropping {} queued tasks on shutdown", dropped.len());
        }
        drop(dropped);

        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        release_workers(workers);
        log::info!("Mesh worker pool stopped");
    }
}

#[cfg(not(target_family = "wasm"))]
fn release_workers(workers: Vec<JoinHandle<()>>) {
    for worker in workers {
        if worker.join().is_err() {
            log::error!("A mesh worker terminated abnormally");
        }
    }
}

// The browser main thread must not block, so web workers are left to exit on
// their own once they see the shutdown flag.
#[cfg(target_family = "wasm")]
fn release_workers(workers: Vec<JoinHandle<()>>) {
    log::debug!("Detaching {} mesh workers", workers.len());
    drop(workers);
}

impl Drop for MeshWorkerPool {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn worker_loop(shared: SharedState) {
    let (state, condvar) = &*shared;
    loop {
        let task = {
            let mut guard = lock(state);
            loop {
                if guard.shutting_down {
                    return;
                }
                if let Some(task) = guard.queue.pop_front() {
                    guard.active += 1;
                    guard.peak_active = guard.peak_active.max(guard.active);
                    break task;
                }
                guard = condvar.wait(guard).unwrap_or_else(PoisonError::into_inner);
            }
        };

        let name = task.name();
        let outcome = panic::catch_unwind(AssertUnwindSafe(move || task.process()));

        let result = {
            let mut guard = lock(state);
            guard.active -= 1;
            match outcome {
                Ok(result) => {
                    guard.completed += 1;
                    result
                }
                Err(_) => {
                    guard.failed += 1;
                    log::error!("Task '{}' panicked; worker slot reclaimed", name);
                    continue;
                }
            }
        };

        if panic::catch_unwind(AssertUnwindSafe(move || result.handle_result())).is_err() {
            log::error!("Delivering the result of task '{}' panicked", name);
        }
    }
}
