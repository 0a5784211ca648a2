// src/exec/pool.rs

//! The fixed worker pool and its queues.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::action::TargetId;
use crate::errors::{BuildError, Result};
use crate::events::EventBus;
use crate::exec::worker::worker_loop;
use crate::exec::{ActionTable, WorkerReport};

/// A fixed set of worker tasks consuming target identifiers from a shared
/// input queue.
///
/// The input side is unbounded: the driver must be able to enqueue a whole
/// ready batch without blocking, because every worker might be busy and the
/// only thing that drains the completion queue is the driver itself. The
/// completion side is bounded; the driver returns to draining it after each
/// dispatch, so workers never wait on it for long.
pub struct WorkerPool {
    input_tx: mpsc::UnboundedSender<TargetId>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers, numbered from 1.
    ///
    /// `table` is the read-only action table published to every worker;
    /// `report_tx` is the output queue the driver drains. The pool keeps no
    /// clone of `report_tx`, so the channel closes exactly when the last
    /// worker exits.
    pub fn spawn(
        size: usize,
        table: Arc<ActionTable>,
        bus: Arc<EventBus>,
        report_tx: mpsc::Sender<WorkerReport>,
    ) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel::<TargetId>();
        let shared_rx = Arc::new(Mutex::new(input_rx));

        let mut handles = Vec::with_capacity(size);
        for id in 1..=size {
            handles.push(tokio::spawn(worker_loop(
                id,
                Arc::clone(&shared_rx),
                Arc::clone(&table),
                Arc::clone(&bus),
                report_tx.clone(),
            )));
        }

        debug!(workers = size, "worker pool started");
        Self { input_tx, handles }
    }

    /// Enqueue a target for execution. Never blocks.
    pub fn dispatch(&self, target: TargetId) -> Result<()> {
        debug!(target = %target, "dispatching to worker pool");
        self.input_tx
            .send(target)
            .map_err(|_| BuildError::WorkerPoolClosed)
    }

    /// Tear the pool down. Idle workers see the closed input queue and
    /// exit; anything still executing is force-terminated.
    pub fn shutdown(self) {
        debug!(workers = self.handles.len(), "shutting down worker pool");
        // Drop aborts the handles.
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}
