// src/action/mod.rs

//! The unit of work: an immutable [`Action`] describing one command, the
//! target it produces and the sources it depends on.
//!
//! An action carries two predicates the scheduler consults:
//!
//! - [`Action::ready`] answers the *ordering* question: may this action run
//!   now, or is some source still owned by an unfinished action?
//! - [`Action::decide`] answers the *necessity* question: given the current
//!   file timestamps and the force flag, does this action have to execute
//!   at all, or can it be finalised as up-to-date?
//!
//! Keeping the two separate lets the scheduler propagate skipped actions
//! through the graph exactly like executed ones.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::fs::FileSystem;

/// Canonical target identifier: the absolute path string produced by the
/// path discipline module. Doubles as the graph key.
pub type TargetId = String;

/// The payload executed for an action: either a shell command string or an
/// in-process callable. Workers dispatch on the variant.
#[derive(Clone)]
pub enum CommandPayload {
    /// Executed through the platform shell; the process exit code is the
    /// action's exit status.
    Shell(String),
    /// Invoked in-process with the action; the returned integer is the
    /// exit status (0 = success).
    Func(Arc<dyn Fn(&Action) -> i32 + Send + Sync>),
}

impl fmt::Debug for CommandPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandPayload::Shell(cmd) => f.debug_tuple("Shell").field(cmd).finish(),
            CommandPayload::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<&str> for CommandPayload {
    fn from(cmd: &str) -> Self {
        CommandPayload::Shell(cmd.to_string())
    }
}

impl From<String> for CommandPayload {
    fn from(cmd: String) -> Self {
        CommandPayload::Shell(cmd)
    }
}

/// Free-form tag value. Observers interpret tags; the engine itself only
/// ever reads `quiet` (worker output suppression).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::Str(s.to_string())
    }
}

impl From<bool> for TagValue {
    fn from(b: bool) -> Self {
        TagValue::Bool(b)
    }
}

/// Tag map attached to an action.
pub type Tags = BTreeMap<String, TagValue>;

/// One unit of work. Immutable once submitted; the scheduler tracks all
/// mutable state (pending/running/finished membership) outside the action.
#[derive(Debug, Clone)]
pub struct Action {
    /// Canonical target identifier. Unique within one build invocation.
    pub target: TargetId,
    /// Identifiers this action depends on. Each may be another action's
    /// target or a pre-existing source file.
    pub sources: Vec<TargetId>,
    /// What to execute.
    pub command: CommandPayload,
    /// Free-form tags for observers (`pretty_name`, `required`, `quiet`, ...).
    pub tags: Tags,
}

impl Action {
    /// Construct an action. No filesystem validation happens here; that is
    /// deferred to [`Action::decide`].
    pub fn new(
        target: TargetId,
        sources: Vec<TargetId>,
        command: CommandPayload,
        tags: Tags,
    ) -> Self {
        Self {
            target,
            sources,
            command,
            tags,
        }
    }

    /// Value of the `pretty_name` tag, if present.
    pub fn pretty_name(&self) -> Option<&str> {
        match self.tags.get("pretty_name") {
            Some(TagValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// True if the named tag is present and set to `true`.
    pub fn tag_bool(&self, key: &str) -> bool {
        matches!(self.tags.get(key), Some(TagValue::Bool(true)))
    }

    /// Ordering test: true iff none of the sources names an identifier
    /// still present in `pending` or `running`.
    ///
    /// A source that appears in neither table (nor in `finished`) is an
    /// external file; external files never block readiness.
    pub fn ready(
        &self,
        pending: &HashMap<TargetId, Arc<Action>>,
        running: &HashMap<TargetId, Arc<Action>>,
    ) -> bool {
        !self
            .sources
            .iter()
            .any(|src| pending.contains_key(src) || running.contains_key(src))
    }

    /// Necessity test: true iff this action must actually execute, false if
    /// its target is up to date and the skip path applies.
    ///
    /// - `force` short-circuits to true.
    /// - A target that cannot be stat'd must be built.
    /// - A source still in `pending`/`running` forces execution; the
    ///   timestamp comparison would race against the upstream rebuild.
    /// - A source newer than the target forces execution.
    /// - A source that cannot be stat'd forces execution; the command
    ///   itself will surface the real error.
    pub fn decide(
        &self,
        pending: &HashMap<TargetId, Arc<Action>>,
        running: &HashMap<TargetId, Arc<Action>>,
        force: bool,
        fs: &dyn FileSystem,
    ) -> bool {
        if force {
            return true;
        }

        let target_mtime = match fs.mtime(Path::new(&self.target)) {
            Ok(t) => t,
            Err(_) => return true,
        };

        for src in &self.sources {
            if pending.contains_key(src) || running.contains_key(src) {
                return true;
            }

            match fs.mtime(Path::new(src)) {
                Ok(src_mtime) if src_mtime > target_mtime => return true,
                Ok(_) => {}
                Err(_) => return true,
            }
        }

        false
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {:?} [{:?}]", self.target, self.sources, self.command)
    }
}
