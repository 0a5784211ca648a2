// src/scheduler/tables.rs

//! The three graph state tables.
//!
//! At all times `pending`, `running` and `finished` are pairwise disjoint
//! and their union is exactly the set of submitted targets. All transitions
//! go through the methods here so the partition cannot be broken from the
//! outside.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::action::{Action, TargetId};

/// Where a submitted action currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// Submitted, not yet started.
    Pending,
    /// Dispatched to a worker, awaiting completion.
    Running,
    /// Completed: either executed or decided unnecessary.
    Finished,
}

#[derive(Debug, Default)]
pub struct GraphTables {
    pending: HashMap<TargetId, Arc<Action>>,
    running: HashMap<TargetId, Arc<Action>>,
    finished: HashMap<TargetId, Arc<Action>>,
}

impl GraphTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership in the union of all three tables.
    pub fn contains(&self, target: &str) -> bool {
        self.pending.contains_key(target)
            || self.running.contains_key(target)
            || self.finished.contains_key(target)
    }

    pub fn status_of(&self, target: &str) -> Option<ActionStatus> {
        if self.pending.contains_key(target) {
            Some(ActionStatus::Pending)
        } else if self.running.contains_key(target) {
            Some(ActionStatus::Running)
        } else if self.finished.contains_key(target) {
            Some(ActionStatus::Finished)
        } else {
            None
        }
    }

    /// Install a freshly submitted action. The caller has already checked
    /// for duplicates.
    pub fn insert_pending(&mut self, action: Arc<Action>) {
        self.pending.insert(action.target.clone(), action);
    }

    /// `pending -> running`: the action was ready and must execute.
    pub fn promote(&mut self, target: &str) -> Option<Arc<Action>> {
        let action = self.pending.remove(target)?;
        self.running.insert(target.to_string(), Arc::clone(&action));
        Some(action)
    }

    /// `running -> finished`: a completion record was drained.
    pub fn settle(&mut self, target: &str) -> Option<Arc<Action>> {
        let action = self.running.remove(target)?;
        self.finished.insert(target.to_string(), Arc::clone(&action));
        Some(action)
    }

    /// `pending -> finished` directly: the skip path. The action never
    /// enters `running` because no worker will touch it.
    pub fn settle_pending(&mut self, target: &str) -> Option<Arc<Action>> {
        let action = self.pending.remove(target)?;
        self.finished.insert(target.to_string(), Arc::clone(&action));
        Some(action)
    }

    pub fn pending(&self) -> &HashMap<TargetId, Arc<Action>> {
        &self.pending
    }

    pub fn running(&self) -> &HashMap<TargetId, Arc<Action>> {
        &self.running
    }

    pub fn finished(&self) -> &HashMap<TargetId, Arc<Action>> {
        &self.finished
    }

    /// True when no work remains: both `pending` and `running` are empty.
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.running.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.running.clear();
        self.finished.clear();
    }

    /// Diagnostic dump of all three tables.
    pub fn dump(&self) {
        debug!(count = self.pending.len(), "pending:");
        for (target, action) in &self.pending {
            debug!("  {} <- {:?}", target, action.sources);
        }
        debug!(count = self.running.len(), "running:");
        for target in self.running.keys() {
            debug!("  {}", target);
        }
        debug!(count = self.finished.len(), "finished:");
        for target in self.finished.keys() {
            debug!("  {}", target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{CommandPayload, Tags};

    fn action(target: &str) -> Arc<Action> {
        Arc::new(Action::new(
            target.to_string(),
            Vec::new(),
            CommandPayload::from("true"),
            Tags::new(),
        ))
    }

    #[test]
    fn transitions_keep_the_partition() {
        let mut tables = GraphTables::new();
        tables.insert_pending(action("a"));

        assert_eq!(tables.status_of("a"), Some(ActionStatus::Pending));
        assert!(tables.contains("a"));

        tables.promote("a").unwrap();
        assert_eq!(tables.status_of("a"), Some(ActionStatus::Running));
        assert!(tables.pending().is_empty());

        tables.settle("a").unwrap();
        assert_eq!(tables.status_of("a"), Some(ActionStatus::Finished));
        assert!(tables.is_drained());
    }

    #[test]
    fn skip_path_never_passes_through_running() {
        let mut tables = GraphTables::new();
        tables.insert_pending(action("a"));

        tables.settle_pending("a").unwrap();
        assert_eq!(tables.status_of("a"), Some(ActionStatus::Finished));
        assert!(tables.running().is_empty());
    }

    #[test]
    fn promote_of_unknown_target_is_none() {
        let mut tables = GraphTables::new();
        assert!(tables.promote("ghost").is_none());
    }
}
