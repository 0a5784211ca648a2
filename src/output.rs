// src/output.rs

//! Console observers for the event bus.
//!
//! These live on the host side of the engine: the engine publishes events,
//! the host decides what to print and when to pull the emergency brake.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::warn;

use crate::events::{AbortFlag, ActionEvent, EventKind, Observer};

/// Prints one progress line per started action, plus a failure line for
/// every nonzero FINISH:
///
/// ```text
/// [ 3/10]   CC  /proj/build/obj/main.o
/// [ 4/10]   LD  /proj/build/prog
/// ```
///
/// The label comes from the `pretty_name` tag when present. Skipped actions
/// produce no progress line; they only ever FINISH with status 0.
pub struct ProgressObserver {
    total: usize,
    started: AtomicUsize,
}

impl ProgressObserver {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            started: AtomicUsize::new(0),
        }
    }
}

impl Observer for ProgressObserver {
    fn on_event(&self, event: &ActionEvent) {
        match event.kind {
            EventKind::Start => {
                let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
                let label = event.action.pretty_name().unwrap_or("RUN");
                println!("[{:>2}/{}] {:>4}  {}", n, self.total, label, event.action.target);
            }
            EventKind::Finish => {
                if let Some(status) = event.exit_status {
                    if status != 0 {
                        println!("FAILED ({}): {}", status, event.action.target);
                    }
                }
            }
        }
    }
}

/// Aborts the whole build when an action tagged `required = true` finishes
/// with a nonzero status. Used for configure-style checks whose failure
/// makes everything downstream meaningless.
pub struct RequiredCheckObserver {
    abort: AbortFlag,
}

impl RequiredCheckObserver {
    pub fn new(abort: AbortFlag) -> Self {
        Self { abort }
    }
}

impl Observer for RequiredCheckObserver {
    fn on_event(&self, event: &ActionEvent) {
        if event.kind != EventKind::Finish {
            return;
        }
        let failed = matches!(event.exit_status, Some(status) if status != 0);
        if failed && event.action.tag_bool("required") {
            warn!(
                target = %event.action.target,
                exit_status = ?event.exit_status,
                "required action failed; signalling abort"
            );
            self.abort.signal();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, CommandPayload, TagValue, Tags};
    use std::sync::Arc;

    fn required_action(target: &str) -> Arc<Action> {
        let mut tags = Tags::new();
        tags.insert("required".to_string(), TagValue::Bool(true));
        Arc::new(Action::new(
            target.to_string(),
            Vec::new(),
            CommandPayload::from("true"),
            tags,
        ))
    }

    #[test]
    fn required_failure_signals_abort() {
        let abort = AbortFlag::new();
        let observer = RequiredCheckObserver::new(abort.clone());

        observer.on_event(&ActionEvent::finished(1, required_action("check"), 1));
        assert!(abort.is_signalled());
    }

    #[test]
    fn required_success_does_not_abort() {
        let abort = AbortFlag::new();
        let observer = RequiredCheckObserver::new(abort.clone());

        observer.on_event(&ActionEvent::finished(1, required_action("check"), 0));
        assert!(!abort.is_signalled());
    }

    #[test]
    fn unrequired_failure_does_not_abort() {
        let abort = AbortFlag::new();
        let observer = RequiredCheckObserver::new(abort.clone());

        let action = Arc::new(Action::new(
            "x".to_string(),
            Vec::new(),
            CommandPayload::from("true"),
            Tags::new(),
        ));
        observer.on_event(&ActionEvent::finished(1, action, 2));
        assert!(!abort.is_signalled());
    }
}
