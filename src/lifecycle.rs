use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Running,
    /// Stop was requested; output streams are still draining.
    Stopping,
    Stopped,
}

impl LifecycleState {
    pub fn label(self) -> &'static str {
        match self {
            LifecycleState::NotStarted => "not started",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            LifecycleState::NotStarted => 0,
            LifecycleState::Running => 1,
            LifecycleState::Stopping => 2,
            LifecycleState::Stopped => 3,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => LifecycleState::Running,
            2 => LifecycleState::Stopping,
            3 => LifecycleState::Stopped,
            _ => LifecycleState::NotStarted,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// State shared between one supervised process and its stream pumps.
///
/// Every process instance gets its own cell, so pumps that outlive a replaced
/// process never touch the state of its successor.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
    open_streams: AtomicUsize,
}

impl Lifecycle {
    pub fn running(open_streams: usize) -> Self {
        let initial = if open_streams == 0 {
            LifecycleState::Stopped
        } else {
            LifecycleState::Running
        };
        Self {
            state: AtomicU8::new(initial.to_raw()),
            open_streams: AtomicUsize::new(open_streams),
        }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Moves `Running` to `Stopping`; returns false from any other state.
    pub fn begin_stopping(&self) -> bool {
        self.state
            .compare_exchange(
                LifecycleState::Running.to_raw(),
                LifecycleState::Stopping.to_raw(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Records one stream reaching end-of-stream and returns how many remain open.
    pub fn stream_closed(&self) -> usize {
        let previous = self
            .open_streams
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |open| {
                Some(open.saturating_sub(1))
            })
            .unwrap_or(0);
        let remaining = previous.saturating_sub(1);
        if remaining == 0 {
            self.state
                .store(LifecycleState::Stopped.to_raw(), Ordering::Release);
        }
        remaining
    }

    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::Acquire)
    }
}
