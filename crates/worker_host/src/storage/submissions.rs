//! Pending-submission record store contracts, schema constants, and adapters.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    future::Future,
    pin::Pin,
    rc::Rc,
};

use serde::{Deserialize, Serialize};

/// Database holding queued form submissions.
pub const SUBMISSIONS_DB_NAME: &str = "QRScoutDB";
/// Schema version of [`SUBMISSIONS_DB_NAME`].
pub const SUBMISSIONS_DB_VERSION: u32 = 1;
/// Record collection for queued submissions (key path `id`, auto-increment).
pub const SUBMISSIONS_STORE_NAME: &str = "submissions";
/// Secondary index over the `synced` field.
pub const SYNCED_INDEX_NAME: &str = "synced";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Form payload queued by the page while the network was unreachable.
pub struct PendingSubmission {
    /// Auto-incremented primary key.
    pub id: u64,
    /// Opaque payload relayed as the `data` form field. Absent in damaged records.
    #[serde(default)]
    pub data: String,
    /// Destination endpoint for the relay POST.
    #[serde(default)]
    pub script_url: String,
    /// Whether the endpoint has acknowledged the payload.
    #[serde(default)]
    pub synced: bool,
}

/// Object-safe boxed future used by [`SubmissionStore`] async methods.
pub type SubmissionStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Durable queue of pending submissions.
///
/// Each method runs in its own atomic transaction and resolves only once that transaction has
/// committed.
pub trait SubmissionStore {
    /// Opens the store, creating the schema when absent.
    fn open<'a>(&'a self) -> SubmissionStoreFuture<'a, Result<(), String>>;

    /// Appends an unsynced record and returns its id.
    fn add_submission<'a>(
        &'a self,
        data: &'a str,
        script_url: &'a str,
    ) -> SubmissionStoreFuture<'a, Result<u64, String>>;

    /// Returns every record with `synced == false`, in id order.
    fn pending_submissions<'a>(
        &'a self,
    ) -> SubmissionStoreFuture<'a, Result<Vec<PendingSubmission>, String>>;

    /// Loads one record by id.
    fn get_submission<'a>(
        &'a self,
        id: u64,
    ) -> SubmissionStoreFuture<'a, Result<Option<PendingSubmission>, String>>;

    /// Flips `synced` to true. Unknown ids are ignored.
    fn mark_synced<'a>(&'a self, id: u64) -> SubmissionStoreFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op store for unsupported targets and baseline tests.
pub struct NoopSubmissionStore;

impl SubmissionStore for NoopSubmissionStore {
    fn open<'a>(&'a self) -> SubmissionStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn add_submission<'a>(
        &'a self,
        _data: &'a str,
        _script_url: &'a str,
    ) -> SubmissionStoreFuture<'a, Result<u64, String>> {
        Box::pin(async { Err("submission store is not available".to_string()) })
    }

    fn pending_submissions<'a>(
        &'a self,
    ) -> SubmissionStoreFuture<'a, Result<Vec<PendingSubmission>, String>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn get_submission<'a>(
        &'a self,
        _id: u64,
    ) -> SubmissionStoreFuture<'a, Result<Option<PendingSubmission>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn mark_synced<'a>(&'a self, _id: u64) -> SubmissionStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug)]
struct SubmissionTable {
    next_id: u64,
    records: BTreeMap<u64, PendingSubmission>,
    unsynced: BTreeSet<u64>,
}

impl Default for SubmissionTable {
    fn default() -> Self {
        Self {
            next_id: 1,
            records: BTreeMap::new(),
            unsynced: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory store with an explicit `synced == false` index.
pub struct MemorySubmissionStore {
    inner: Rc<RefCell<SubmissionTable>>,
}

impl MemorySubmissionStore {
    /// Returns every record regardless of sync state, in id order.
    pub fn all_submissions(&self) -> Vec<PendingSubmission> {
        self.inner.borrow().records.values().cloned().collect()
    }
}

impl SubmissionStore for MemorySubmissionStore {
    fn open<'a>(&'a self) -> SubmissionStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn add_submission<'a>(
        &'a self,
        data: &'a str,
        script_url: &'a str,
    ) -> SubmissionStoreFuture<'a, Result<u64, String>> {
        Box::pin(async move {
            let mut table = self.inner.borrow_mut();
            let id = table.next_id;
            table.next_id += 1;
            table.records.insert(
                id,
                PendingSubmission {
                    id,
                    data: data.to_string(),
                    script_url: script_url.to_string(),
                    synced: false,
                },
            );
            table.unsynced.insert(id);
            Ok(id)
        })
    }

    fn pending_submissions<'a>(
        &'a self,
    ) -> SubmissionStoreFuture<'a, Result<Vec<PendingSubmission>, String>> {
        Box::pin(async move {
            let table = self.inner.borrow();
            Ok(table
                .unsynced
                .iter()
                .filter_map(|id| table.records.get(id).cloned())
                .collect())
        })
    }

    fn get_submission<'a>(
        &'a self,
        id: u64,
    ) -> SubmissionStoreFuture<'a, Result<Option<PendingSubmission>, String>> {
        Box::pin(async move { Ok(self.inner.borrow().records.get(&id).cloned()) })
    }

    fn mark_synced<'a>(&'a self, id: u64) -> SubmissionStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let mut table = self.inner.borrow_mut();
            let table = &mut *table;
            if let Some(record) = table.records.get_mut(&id) {
                record.synced = true;
                table.unsynced.remove(&id);
            }
            Ok(())
        })
    }
}
