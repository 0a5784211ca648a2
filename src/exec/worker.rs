// src/exec/worker.rs

//! The per-worker loop and payload invocation.

use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, warn};

use crate::action::{Action, CommandPayload, TargetId};
use crate::events::{ActionEvent, EventBus, WorkerId};
use crate::exec::{ActionOutcome, ActionTable, WorkerReport};

/// Main loop of one worker.
///
/// Dequeue a target, publish START, invoke the payload, post the completion
/// record. Exits when the input queue closes or the driver goes away.
pub(crate) async fn worker_loop(
    id: WorkerId,
    input: Arc<Mutex<mpsc::UnboundedReceiver<TargetId>>>,
    table: Arc<ActionTable>,
    bus: Arc<EventBus>,
    report_tx: mpsc::Sender<WorkerReport>,
) {
    debug!(worker = id, "worker started");

    loop {
        // Holding the lock across the recv serialises the dequeue; at most
        // one worker waits on the queue itself, the rest wait on the lock.
        let target = {
            let mut rx = input.lock().await;
            rx.recv().await
        };

        let Some(target) = target else {
            break;
        };

        let Some(action) = table.get(&target) else {
            // The driver only enqueues targets it installed in the table.
            warn!(worker = id, target = %target, "unknown target on work queue; ignoring");
            continue;
        };

        bus.publish(&ActionEvent::started(id, Arc::clone(action)));

        let outcome = invoke(id, action).await;
        debug!(worker = id, target = %target, ?outcome, "action finished");

        let report = WorkerReport {
            worker: id,
            target,
            outcome,
        };
        if report_tx.send(report).await.is_err() {
            // Driver is gone; nothing left to report to.
            break;
        }
    }

    debug!(worker = id, "worker exiting (queue closed)");
}

/// Invoke an action's payload and map the result to an [`ActionOutcome`].
async fn invoke(worker: WorkerId, action: &Arc<Action>) -> ActionOutcome {
    match &action.command {
        CommandPayload::Shell(cmd) => run_shell(worker, action, cmd).await,
        CommandPayload::Func(func) => {
            let func = Arc::clone(func);
            let action = Arc::clone(action);

            // Callables may block; keep them off the async workers. A panic
            // inside the callable surfaces as a JoinError rather than
            // tearing down the worker.
            match tokio::task::spawn_blocking(move || func(&action)).await {
                Ok(0) => ActionOutcome::Success,
                Ok(code) => ActionOutcome::Failed(code),
                Err(err) => {
                    error!(worker, error = %err, "callable payload crashed");
                    ActionOutcome::Crashed
                }
            }
        }
    }
}

/// Run a shell command payload through the platform shell.
async fn run_shell(worker: WorkerId, action: &Arc<Action>, cmd: &str) -> ActionOutcome {
    debug!(worker, target = %action.target, cmd = %cmd, "starting shell command");

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    if action.tag_bool("quiet") {
        command.stdout(Stdio::null()).stderr(Stdio::null());
    }
    command.kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            error!(worker, target = %action.target, error = %err, "failed to spawn command");
            return ActionOutcome::Crashed;
        }
    };

    match child.wait().await {
        Ok(status) if status.success() => ActionOutcome::Success,
        Ok(status) => ActionOutcome::Failed(status.code().unwrap_or(-1)),
        Err(err) => {
            error!(worker, target = %action.target, error = %err, "failed to wait for command");
            ActionOutcome::Crashed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Tags;

    fn shell_action(target: &str, cmd: &str) -> Arc<Action> {
        Arc::new(Action::new(
            target.to_string(),
            Vec::new(),
            CommandPayload::from(cmd),
            Tags::new(),
        ))
    }

    #[tokio::test]
    async fn shell_exit_codes_map_to_outcomes() {
        let ok = shell_action("t1", "true");
        assert_eq!(invoke(1, &ok).await, ActionOutcome::Success);

        let fail = shell_action("t2", "exit 3");
        assert_eq!(invoke(1, &fail).await, ActionOutcome::Failed(3));
    }

    #[tokio::test]
    async fn callable_return_value_is_the_exit_status() {
        let action = Arc::new(Action::new(
            "t".to_string(),
            Vec::new(),
            CommandPayload::Func(Arc::new(|_| 7)),
            Tags::new(),
        ));
        assert_eq!(invoke(1, &action).await, ActionOutcome::Failed(7));
    }

    #[tokio::test]
    async fn panicking_callable_is_reported_as_crashed() {
        let action = Arc::new(Action::new(
            "t".to_string(),
            Vec::new(),
            CommandPayload::Func(Arc::new(|_| panic!("boom"))),
            Tags::new(),
        ));
        assert_eq!(invoke(1, &action).await, ActionOutcome::Crashed);
    }
}
