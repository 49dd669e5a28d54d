use thiserror::Error;

use crate::lifecycle::{LifecycleEvent, WorkerPhase};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failures surfaced to the host, which may retry the event.
pub enum WorkerError {
    /// The configuration is unusable.
    #[error("invalid worker config: {0}")]
    Config(String),
    /// An event arrived before the worker reached the phase it needs.
    #[error("{event} event requires the worker to be {required}, but it is {phase}")]
    Lifecycle {
        /// Event that was rejected.
        event: LifecycleEvent,
        /// Phase at the time of the event.
        phase: WorkerPhase,
        /// Minimum phase the event needs.
        required: WorkerPhase,
    },
    /// The response cache rejected an operation.
    #[error("cache operation failed: {0}")]
    Cache(String),
    /// The submission store could not be opened, queried or written.
    #[error("submission store failed: {0}")]
    Store(String),
    /// Open pages could not be notified.
    #[error("client broadcast failed: {0}")]
    Broadcast(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Why one queued submission stayed unsynced. Counted, never propagated.
pub enum SubmissionFailure {
    /// The relay request produced no response.
    #[error("transport error: {0}")]
    Transport(String),
    /// The endpoint answered with a body that is not JSON.
    #[error("response (status {status}) is not JSON: {reason}")]
    MalformedBody {
        /// HTTP status of the response.
        status: u16,
        /// Decoder message.
        reason: String,
    },
    /// The endpoint answered without `success: true`.
    #[error("endpoint did not acknowledge the submission (status {status})")]
    NotAcknowledged {
        /// HTTP status of the response.
        status: u16,
    },
    /// The endpoint acknowledged but the record could not be flagged.
    #[error("marking the record synced failed: {0}")]
    MarkSynced(String),
}
