// src/scheduler/manager.rs

//! The central coordinator: accepts submitted actions, drives the graph to
//! completion over a worker pool, and publishes START/FINISH events.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::action::{Action, CommandPayload, Tags, TargetId};
use crate::errors::{BuildError, Result};
use crate::events::{AbortFlag, ActionEvent, DRIVER_WORKER_ID, EventBus};
use crate::exec::{ActionTable, WorkerPool, WorkerReport};
use crate::fs::FileSystem;
use crate::scheduler::tables::{ActionStatus, GraphTables};

/// Flags influencing a run, handed in at construction time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Execute every action regardless of timestamps.
    pub force: bool,
    /// Worker pool size; defaults to the host's logical CPU count.
    pub jobs: Option<usize>,
}

impl RunOptions {
    fn effective_jobs(&self) -> usize {
        self.jobs
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }
}

/// What a completed run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Actions dispatched to a worker and completed, including failures.
    pub executed: usize,
    /// Actions finalised through the skip path.
    pub skipped: usize,
    /// Targets whose command exited nonzero or crashed.
    pub failed: Vec<TargetId>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// How a pending action should be handled right now.
enum Disposition {
    /// Some source is still owned by an unfinished action.
    NotReady,
    /// Ready, and `decide` says the command must run.
    Execute,
    /// Ready, but the target is up to date.
    Skip,
}

/// Manages all submitted actions and drives their execution.
///
/// The manager is the single owner of the graph state tables. `submit` is
/// called while build scripts are interpreted; once `run` starts, the graph
/// is immutable and only the driver loop inside `run` touches the tables.
pub struct ActionManager {
    tables: GraphTables,
    /// Reverse dependency edges, keyed by source identifier. An entry may
    /// be keyed by an external file; such entries are simply never walked.
    provide: HashMap<TargetId, Vec<TargetId>>,
    options: RunOptions,
    bus: Arc<EventBus>,
    abort: AbortFlag,
    fs: Arc<dyn FileSystem>,
}

impl ActionManager {
    pub fn new(
        options: RunOptions,
        bus: EventBus,
        abort: AbortFlag,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            tables: GraphTables::new(),
            provide: HashMap::new(),
            options,
            bus: Arc::new(bus),
            abort,
            fs,
        }
    }

    /// Submit a new action for execution.
    ///
    /// Fails with [`BuildError::DuplicateTarget`] if the target was already
    /// submitted; callers that want to share work must reuse the same
    /// target identifier themselves. A failed submit leaves the state
    /// tables untouched.
    pub fn submit(
        &mut self,
        target: TargetId,
        sources: Vec<TargetId>,
        command: CommandPayload,
        tags: Tags,
    ) -> Result<()> {
        if self.tables.contains(&target) {
            return Err(BuildError::DuplicateTarget(target));
        }
        if sources.iter().any(|src| *src == target) {
            return Err(BuildError::Config(format!(
                "action '{target}' lists itself as a source"
            )));
        }

        for src in &sources {
            let successors = self.provide.entry(src.clone()).or_default();
            if !successors.contains(&target) {
                successors.push(target.clone());
            }
        }

        let action = Arc::new(Action::new(target, sources, command, tags));
        debug!(action = %action, "submitted");
        self.tables.insert_pending(action);
        Ok(())
    }

    /// Reset all tables. Used between build-target invocations; the queues
    /// are created per run, so there is nothing to drain here.
    pub fn clear(&mut self) {
        self.tables.clear();
        self.provide.clear();
    }

    /// Remove every registered target file instead of building. Targets
    /// that do not exist are ignored.
    pub fn clean(&self) -> usize {
        let mut removed = 0;
        for target in self.tables.pending().keys() {
            if self.fs.remove_file(Path::new(target)).is_ok() {
                debug!(target = %target, "removed target");
                removed += 1;
            }
        }
        removed
    }

    /// Diagnostic print of the three state tables.
    pub fn dump(&self) {
        self.tables.dump();
    }

    pub fn status_of(&self, target: &str) -> Option<ActionStatus> {
        self.tables.status_of(target)
    }

    pub fn submitted_count(&self) -> usize {
        self.tables.pending().len() + self.tables.running().len() + self.tables.finished().len()
    }

    pub fn is_drained(&self) -> bool {
        self.tables.is_drained()
    }

    /// Drive the graph to completion.
    ///
    /// Spawns the worker pool, seeds it with the initially ready actions,
    /// then alternates between draining completion records and scheduling
    /// newly unblocked work until both `pending` and `running` are empty.
    /// Workers are force-terminated on every exit path.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        if self.tables.is_drained() {
            debug!("no actions submitted; nothing to do");
            return Ok(summary);
        }

        self.tables.dump();

        // Read-only snapshot published to the workers, taken before any
        // promotion so it covers every submitted action.
        let table: Arc<ActionTable> = Arc::new(self.tables.pending().clone());

        let seed = self.collect_ready(&mut summary);

        if self.tables.is_drained() {
            info!(skipped = summary.skipped, "all targets up to date");
            return Ok(summary);
        }

        if seed.is_empty() {
            // Work remains but nothing can start: the graph is cyclic.
            return Err(BuildError::CyclicDependency(self.cycle_member()));
        }

        let (report_tx, mut report_rx) = mpsc::channel::<WorkerReport>(64);
        let pool = WorkerPool::spawn(
            self.options.effective_jobs(),
            table,
            Arc::clone(&self.bus),
            report_tx,
        );

        for target in seed {
            pool.dispatch(target)?;
        }

        while !self.tables.is_drained() {
            let Some(report) = report_rx.recv().await else {
                // Every worker is gone but work is still in flight.
                return Err(BuildError::WorkerPoolClosed);
            };

            let Some(action) = self.tables.settle(&report.target) else {
                warn!(target = %report.target, "completion record for a target not in running; ignoring");
                continue;
            };

            let status = report.outcome.exit_status();
            self.bus
                .publish(&ActionEvent::finished(report.worker, action, status));

            summary.executed += 1;
            if !report.outcome.is_success() {
                warn!(target = %report.target, exit_status = status, "action failed");
                summary.failed.push(report.target.clone());
            }

            if self.abort.is_signalled() {
                warn!("abort requested by observer; terminating workers");
                return Err(BuildError::Aborted);
            }

            let batch = self.release_successors(&report.target, &mut summary);

            if batch.is_empty()
                && self.tables.running().is_empty()
                && !self.tables.pending().is_empty()
            {
                return Err(BuildError::CyclicDependency(self.cycle_member()));
            }

            for target in batch {
                pool.dispatch(target)?;
            }
        }

        pool.shutdown();
        info!(
            executed = summary.executed,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            "graph drained"
        );
        Ok(summary)
    }

    /// Classify one pending action against the current tables.
    ///
    /// Returns `None` when the target is no longer pending (it was promoted
    /// or settled earlier in the same pass).
    fn classify(&self, target: &str) -> Option<Disposition> {
        let pending = self.tables.pending();
        let running = self.tables.running();
        let action = pending.get(target)?;

        if !action.ready(pending, running) {
            return Some(Disposition::NotReady);
        }
        if action.decide(pending, running, self.options.force, self.fs.as_ref()) {
            Some(Disposition::Execute)
        } else {
            Some(Disposition::Skip)
        }
    }

    /// Seeding pass: scan all of `pending` for actions that can start right
    /// now. Promotion order within the pass is not observable.
    fn collect_ready(&mut self, summary: &mut RunSummary) -> Vec<TargetId> {
        let mut batch = Vec::new();
        let snapshot: Vec<TargetId> = self.tables.pending().keys().cloned().collect();

        for target in snapshot {
            match self.classify(&target) {
                None | Some(Disposition::NotReady) => {}
                Some(Disposition::Execute) => {
                    self.tables.promote(&target);
                    batch.push(target);
                }
                Some(Disposition::Skip) => {
                    batch.extend(self.finalize_skipped(&target, summary));
                }
            }
        }

        batch
    }

    /// Skip path: settle the action without dispatching it, publish the
    /// synthetic FINISH so observers still see it exactly once, and
    /// propagate to its successors.
    fn finalize_skipped(&mut self, target: &str, summary: &mut RunSummary) -> Vec<TargetId> {
        let Some(action) = self.tables.settle_pending(target) else {
            return Vec::new();
        };

        debug!(target = %target, "target up to date; skipping");
        summary.skipped += 1;
        self.bus
            .publish(&ActionEvent::finished(DRIVER_WORKER_ID, action, 0));

        self.release_successors(target, summary)
    }

    /// Name a target that actually participates in a dependency cycle.
    ///
    /// Only called when nothing is running and no pending action is ready:
    /// every pending action then has at least one pending source, so
    /// following blocked edges must revisit a node, and the revisited node
    /// lies on a cycle.
    fn cycle_member(&self) -> TargetId {
        let pending = self.tables.pending();
        let Some(mut current) = pending.keys().next().cloned() else {
            return TargetId::default();
        };

        let mut seen: HashSet<TargetId> = HashSet::new();
        while seen.insert(current.clone()) {
            let next = pending.get(&current).and_then(|action| {
                action
                    .sources
                    .iter()
                    .find(|src| pending.contains_key(*src))
                    .cloned()
            });
            match next {
                Some(next) => current = next,
                None => break,
            }
        }

        current
    }

    /// Walk the provide list of a just-finished target and move every
    /// successor that became ready either into the returned dispatch batch
    /// or through the skip path.
    fn release_successors(&mut self, target: &str, summary: &mut RunSummary) -> Vec<TargetId> {
        let mut batch = Vec::new();
        let successors = self.provide.get(target).cloned().unwrap_or_default();

        for succ in successors {
            match self.classify(&succ) {
                None | Some(Disposition::NotReady) => {}
                Some(Disposition::Execute) => {
                    self.tables.promote(&succ);
                    batch.push(succ);
                }
                Some(Disposition::Skip) => {
                    batch.extend(self.finalize_skipped(&succ, summary));
                }
            }
        }

        batch
    }
}

impl std::fmt::Debug for ActionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionManager")
            .field("tables", &self.tables)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
