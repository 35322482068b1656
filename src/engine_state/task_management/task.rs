//! # Task System Core Traits
//!
//! The building blocks of background work executed by the
//! [`MeshWorkerPool`](super::MeshWorkerPool).
//!
//! ## Core Components
//! - `Task`: a unit of work run on a worker thread
//! - `TaskResult`: what the task produced, delivered once the pool has
//!   finished its bookkeeping for the task
//!
//! ## Task Lifecycle
//! 1. A task is published via `MeshWorkerPool::publish_task()`
//! 2. It waits in the pool's FIFO queue until a worker is free
//! 3. `process()` runs on the worker and returns a boxed `TaskResult`
//! 4. The pool releases the worker slot and updates its counters
//! 5. `handle_result()` hands the output to whoever is waiting for it
//!
//! ## Thread Safety
//! - Both traits require `Send` so values can cross threads
//! - Tasks own all of their inputs; nothing is borrowed from the coordinator

/// A unit of work that can be executed on a worker thread.
///
/// # Implementation Guidelines
/// - Own every input, so the coordinator may keep mutating its state
/// - Keep delivery out of `process`; return it as a `TaskResult` instead
/// - A panic inside `process` is caught by the pool and counted as a failure.
///   Anything the task owned is dropped, which a waiting receiver observes as
///   a cancelled channel
pub trait Task: Send + 'static {
    /// Short description used in log messages.
    fn name(&self) -> String;

    /// Performs the work. Runs exactly once, on a worker thread.
    fn process(self: Box<Self>) -> Box<dyn TaskResult>;
}

/// The output of a processed `Task`.
pub trait TaskResult: Send + 'static {
    /// Delivers the output, typically by sending it on a channel.
    fn handle_result(self: Box<Self>);
}
