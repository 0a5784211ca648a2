use std::path::Path;
use std::sync::Arc;

use buildag::action::CommandPayload;
use buildag::events::{AbortFlag, EventBus, Observer};
use buildag::fs::FileSystem;
use buildag::fs::mock::MockFileSystem;
use buildag::scheduler::{ActionManager, RunOptions};

use crate::observers::RecordingObserver;

/// Builder for an [`ActionManager`] wired to a mock filesystem and a
/// recording observer, to simplify test setup.
pub struct ManagerBuilder {
    options: RunOptions,
    fs: Arc<MockFileSystem>,
    recorder: RecordingObserver,
    abort: AbortFlag,
    extra_observers: Vec<Box<dyn Observer>>,
}

impl ManagerBuilder {
    pub fn new() -> Self {
        Self {
            options: RunOptions::default(),
            fs: Arc::new(MockFileSystem::new()),
            recorder: RecordingObserver::new(),
            abort: AbortFlag::new(),
            extra_observers: Vec::new(),
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.options.force = force;
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.options.jobs = Some(jobs);
        self
    }

    pub fn observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.extra_observers.push(observer);
        self
    }

    /// The mock filesystem the manager will consult. Seed fixture files on
    /// it before calling `build()` or afterwards; it is shared.
    pub fn fs(&self) -> Arc<MockFileSystem> {
        Arc::clone(&self.fs)
    }

    /// The recording observer registered on the bus.
    pub fn recorder(&self) -> RecordingObserver {
        self.recorder.clone()
    }

    /// The abort flag handed to the manager.
    pub fn abort(&self) -> AbortFlag {
        self.abort.clone()
    }

    pub fn build(self) -> ActionManager {
        let mut bus = EventBus::new();
        bus.register(Box::new(self.recorder.clone()));
        for observer in self.extra_observers {
            bus.register(observer);
        }

        ActionManager::new(self.options, bus, self.abort, self.fs)
    }
}

impl Default for ManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Callable payload that writes the action's target into the given mock
/// filesystem and succeeds, imitating a compiler producing its output.
pub fn produce_target(fs: &Arc<MockFileSystem>) -> CommandPayload {
    let fs = Arc::clone(fs);
    CommandPayload::Func(Arc::new(move |action| {
        match fs.write(Path::new(&action.target), b"out") {
            Ok(()) => 0,
            Err(_) => 1,
        }
    }))
}

/// Callable payload that succeeds without touching anything.
pub fn succeed() -> CommandPayload {
    CommandPayload::Func(Arc::new(|_| 0))
}

/// Callable payload that fails with the given exit code.
pub fn fail(code: i32) -> CommandPayload {
    CommandPayload::Func(Arc::new(move |_| code))
}

/// Callable payload that panics, simulating a crashed worker payload.
pub fn crash() -> CommandPayload {
    CommandPayload::Func(Arc::new(|_| panic!("payload crashed")))
}
