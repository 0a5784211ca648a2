// src/events.rs

//! Event bus: START / FINISH records published to registered observers.
//!
//! Observers are registered once, before the build runs; after that the bus
//! is shared read-only between the driver and the workers. Delivery is
//! synchronous in the publisher's context, so events for a single action
//! always arrive in START-then-FINISH order, while events for independent
//! actions may interleave freely.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::action::Action;

/// Numeric worker identifier. Workers are numbered from 1; id 0 is the
/// driver itself, used to stamp synthetic FINISH events for skipped actions.
pub type WorkerId = usize;

/// Worker id used on the skip path.
pub const DRIVER_WORKER_ID: WorkerId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Start,
    Finish,
}

/// One record published per state transition of an action.
#[derive(Debug, Clone)]
pub struct ActionEvent {
    pub kind: EventKind,
    pub worker: WorkerId,
    pub action: Arc<Action>,
    /// Present only for [`EventKind::Finish`]; 0 means success.
    pub exit_status: Option<i32>,
}

impl ActionEvent {
    pub fn started(worker: WorkerId, action: Arc<Action>) -> Self {
        Self {
            kind: EventKind::Start,
            worker,
            action,
            exit_status: None,
        }
    }

    pub fn finished(worker: WorkerId, action: Arc<Action>, exit_status: i32) -> Self {
        Self {
            kind: EventKind::Finish,
            worker,
            action,
            exit_status: Some(exit_status),
        }
    }
}

/// Something that wants to see the build happen: a progress printer, a
/// logger, a post-build check.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &ActionEvent);
}

/// Multi-cast publish channel for [`ActionEvent`]s.
///
/// No ordering is promised between observers for a single event; each
/// observer sees events in publish order.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn Observer>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Must happen before the build starts; the bus
    /// is immutable once shared with the worker pool.
    pub fn register(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn publish(&self, event: &ActionEvent) {
        trace!(
            kind = ?event.kind,
            worker = event.worker,
            target = %event.action.target,
            exit_status = ?event.exit_status,
            "publishing action event"
        );

        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Shared flag observers use to request a fatal abort of the whole build.
///
/// The driver checks it after draining each completion record; when set, it
/// tears down the worker pool and returns [`BuildError::Aborted`].
///
/// [`BuildError::Aborted`]: crate::errors::BuildError::Aborted
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_signalled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{CommandPayload, Tags};
    use std::sync::Mutex;

    struct Recorder(Arc<Mutex<Vec<(EventKind, String)>>>);

    impl Observer for Recorder {
        fn on_event(&self, event: &ActionEvent) {
            self.0
                .lock()
                .unwrap()
                .push((event.kind, event.action.target.clone()));
        }
    }

    fn dummy_action(target: &str) -> Arc<Action> {
        Arc::new(Action::new(
            target.to_string(),
            Vec::new(),
            CommandPayload::from("true"),
            Tags::new(),
        ))
    }

    #[test]
    fn every_registered_observer_sees_each_event() {
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));

        let mut bus = EventBus::new();
        bus.register(Box::new(Recorder(seen_a.clone())));
        bus.register(Box::new(Recorder(seen_b.clone())));

        let action = dummy_action("x");
        bus.publish(&ActionEvent::started(1, action.clone()));
        bus.publish(&ActionEvent::finished(1, action, 0));

        for seen in [&seen_a, &seen_b] {
            let seen = seen.lock().unwrap();
            assert_eq!(
                *seen,
                vec![
                    (EventKind::Start, "x".to_string()),
                    (EventKind::Finish, "x".to_string())
                ]
            );
        }
    }

    #[test]
    fn abort_flag_is_shared_between_clones() {
        let flag = AbortFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_signalled());
        clone.signal();
        assert!(flag.is_signalled());
    }
}
