//! Worker lifecycle phases and the transitions host events drive.

use std::fmt;

use crate::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Lifecycle phase of one worker instance.
pub enum WorkerPhase {
    /// Script evaluated; no lifecycle event handled yet.
    Parsed,
    /// Install completed; the current cache generation exists.
    Installed,
    /// Activate completed; stale generations are gone and pages are controlled.
    Activated,
}

impl WorkerPhase {
    /// Returns a stable string token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installed => "installed",
            Self::Activated => "activated",
        }
    }
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Host event kinds, as seen by the lifecycle.
pub enum LifecycleEvent {
    /// `install`
    Install,
    /// `activate`
    Activate,
    /// `fetch`
    Fetch,
    /// `sync`
    Sync,
}

impl LifecycleEvent {
    /// Returns the host event name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Fetch => "fetch",
            Self::Sync => "sync",
        }
    }

    const fn required_phase(self) -> WorkerPhase {
        match self {
            Self::Install => WorkerPhase::Parsed,
            Self::Activate => WorkerPhase::Installed,
            Self::Fetch | Self::Sync => WorkerPhase::Activated,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks that `event` may run in `phase`.
///
/// # Errors
///
/// Returns [`WorkerError::Lifecycle`] when the worker has not reached the phase `event` needs.
pub fn admit(phase: WorkerPhase, event: LifecycleEvent) -> Result<(), WorkerError> {
    let required = event.required_phase();
    if phase < required {
        return Err(WorkerError::Lifecycle {
            event,
            phase,
            required,
        });
    }
    Ok(())
}

/// Returns the phase reached once `event` completes in `phase`. Phases never move backwards.
pub fn completed(phase: WorkerPhase, event: LifecycleEvent) -> WorkerPhase {
    let reached = match event {
        LifecycleEvent::Install => WorkerPhase::Installed,
        LifecycleEvent::Activate => WorkerPhase::Activated,
        LifecycleEvent::Fetch | LifecycleEvent::Sync => phase,
    };
    phase.max(reached)
}
