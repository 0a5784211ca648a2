// src/exec/mod.rs

//! Worker pool: parallel execution of action payloads.
//!
//! - [`pool`] owns the fixed set of worker tasks and the two queues they
//!   communicate over.
//! - [`worker`] contains the per-worker loop and the payload invocation
//!   (shell command or in-process callable).
//!
//! Workers never touch the scheduler's state tables. They receive a
//! read-only action table at startup, consume target identifiers from the
//! shared input queue, publish a START event on dequeue, and post one
//! completion record per executed action on the output queue.

pub mod pool;
pub mod worker;

use std::collections::HashMap;
use std::sync::Arc;

use crate::action::{Action, TargetId};
use crate::events::WorkerId;

pub use pool::WorkerPool;

/// Read-only snapshot of every submitted action, published to the workers
/// when the pool starts. Never mutated afterwards.
pub type ActionTable = HashMap<TargetId, Arc<Action>>;

/// How an action's execution ended, from the worker's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    Failed(i32),
    /// The payload panicked (callable) or could not be spawned at all.
    Crashed,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success)
    }

    /// Integer exit status as carried on FINISH events.
    pub fn exit_status(&self) -> i32 {
        match self {
            ActionOutcome::Success => 0,
            ActionOutcome::Failed(code) => *code,
            ActionOutcome::Crashed => -1,
        }
    }
}

/// Completion record posted by a worker on the output queue.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub worker: WorkerId,
    pub target: TargetId,
    pub outcome: ActionOutcome,
}
