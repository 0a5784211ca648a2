use std::sync::{Arc, Mutex};

use buildag::events::{ActionEvent, EventKind, Observer, WorkerId};

/// One event as seen by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub kind: EventKind,
    pub worker: WorkerId,
    pub target: String,
    pub exit_status: Option<i32>,
}

/// Observer that records every event in publish order.
///
/// The clone handed to the event bus and the one kept by the test share the
/// same buffer, so assertions can be made after the run completes.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, in delivery order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Targets of START events, in delivery order.
    pub fn starts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.kind == EventKind::Start)
            .map(|e| e.target)
            .collect()
    }

    /// Targets of FINISH events, in delivery order.
    pub fn finishes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.kind == EventKind::Finish)
            .map(|e| e.target)
            .collect()
    }

    /// Position of the START event for `target` in the overall log.
    pub fn start_index(&self, target: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| e.kind == EventKind::Start && e.target == target)
    }

    /// Position of the FINISH event for `target` in the overall log.
    pub fn finish_index(&self, target: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| e.kind == EventKind::Finish && e.target == target)
    }

    pub fn count_for(&self, kind: EventKind, target: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.kind == kind && e.target == target)
            .count()
    }
}

impl Observer for RecordingObserver {
    fn on_event(&self, event: &ActionEvent) {
        self.events.lock().unwrap().push(RecordedEvent {
            kind: event.kind,
            worker: event.worker,
            target: event.action.target.clone(),
            exit_status: event.exit_status,
        });
    }
}
