//! Relay of queued form submissions when connectivity returns.

use serde_json::Value;
use worker_host::{
    ClientMessage, ClientRegistry, NetworkTransport, PendingSubmission, SubmissionStore,
    WorkerRequest,
};

use crate::{SubmissionFailure, WorkerError};

/// Form field carrying the queued payload.
pub const SUBMISSION_DATA_FIELD: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Tally of one sync run.
pub struct SyncReport {
    /// Records the endpoint acknowledged and that are now flagged synced.
    pub synced: u32,
    /// Records left queued for the next run.
    pub failed: u32,
}

impl SyncReport {
    /// Message broadcast to open pages for this run.
    pub fn message(self) -> ClientMessage {
        ClientMessage::SyncComplete {
            synced: self.synced,
            failed: self.failed,
        }
    }
}

/// Queues a submission for the next sync run; returns its id.
///
/// # Errors
///
/// Returns [`WorkerError::Store`] when the store cannot be opened or written.
pub async fn enqueue_submission(
    store: &dyn SubmissionStore,
    data: &str,
    script_url: &str,
) -> Result<u64, WorkerError> {
    store.open().await.map_err(WorkerError::Store)?;
    store
        .add_submission(data, script_url)
        .await
        .map_err(WorkerError::Store)
}

/// Posts one submission to its endpoint and flags it synced on acknowledgement.
///
/// # Errors
///
/// Returns the [`SubmissionFailure`] that kept the record queued.
pub async fn relay_submission(
    network: &dyn NetworkTransport,
    store: &dyn SubmissionStore,
    submission: &PendingSubmission,
) -> Result<(), SubmissionFailure> {
    let request = WorkerRequest::form_post(
        &submission.script_url,
        &[(SUBMISSION_DATA_FIELD, submission.data.as_str())],
    );
    let response = network
        .fetch(&request)
        .await
        .map_err(SubmissionFailure::Transport)?;
    let ack: Value = response
        .json()
        .map_err(|reason| SubmissionFailure::MalformedBody {
            status: response.status,
            reason,
        })?;
    if ack.get("success") != Some(&Value::Bool(true)) {
        return Err(SubmissionFailure::NotAcknowledged {
            status: response.status,
        });
    }
    store
        .mark_synced(submission.id)
        .await
        .map_err(SubmissionFailure::MarkSynced)
}

/// Relays every unsynced submission, one at a time, then notifies every open page.
///
/// Per-record failures are counted in the report and leave the record queued.
///
/// # Errors
///
/// Returns [`WorkerError::Store`] when the queue cannot be opened or read, and
/// [`WorkerError::Broadcast`] when pages cannot be notified.
pub async fn sync_pending_submissions(
    store: &dyn SubmissionStore,
    network: &dyn NetworkTransport,
    clients: &dyn ClientRegistry,
) -> Result<SyncReport, WorkerError> {
    store.open().await.map_err(WorkerError::Store)?;
    let pending = store
        .pending_submissions()
        .await
        .map_err(WorkerError::Store)?;

    let mut report = SyncReport::default();
    for submission in &pending {
        match relay_submission(network, store, submission).await {
            Ok(()) => report.synced += 1,
            Err(failure) => {
                log::warn!("submission {} stays queued: {failure}", submission.id);
                report.failed += 1;
            }
        }
    }

    let recipients = clients
        .broadcast(&report.message())
        .await
        .map_err(WorkerError::Broadcast)?;
    log::info!(
        "sync complete: {} synced, {} failed, {recipients} pages notified",
        report.synced,
        report.failed
    );
    Ok(report)
}
