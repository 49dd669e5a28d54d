//! IndexedDB-backed pending-submission store implementation.

use worker_host::{PendingSubmission, SubmissionStore, SubmissionStoreFuture};

#[derive(Debug, Clone, Copy, Default)]
/// Submission queue backed by the `QRScoutDB` IndexedDB database.
pub struct WebSubmissionStore;

impl SubmissionStore for WebSubmissionStore {
    fn open<'a>(&'a self) -> SubmissionStoreFuture<'a, Result<(), String>> {
        Box::pin(async move { crate::bridge::submissions_open().await })
    }

    fn add_submission<'a>(
        &'a self,
        data: &'a str,
        script_url: &'a str,
    ) -> SubmissionStoreFuture<'a, Result<u64, String>> {
        Box::pin(async move { crate::bridge::submissions_add(data, script_url).await })
    }

    fn pending_submissions<'a>(
        &'a self,
    ) -> SubmissionStoreFuture<'a, Result<Vec<PendingSubmission>, String>> {
        Box::pin(async move { crate::bridge::submissions_pending().await })
    }

    fn get_submission<'a>(
        &'a self,
        id: u64,
    ) -> SubmissionStoreFuture<'a, Result<Option<PendingSubmission>, String>> {
        Box::pin(async move { crate::bridge::submissions_get(id).await })
    }

    fn mark_synced<'a>(&'a self, id: u64) -> SubmissionStoreFuture<'a, Result<(), String>> {
        Box::pin(async move { crate::bridge::submissions_mark_synced(id).await })
    }
}
