//! Typed host-domain contracts and shared models used by the offline worker and its browser
//! adapters.
//!
//! This crate is the API-first boundary for the services a service worker borrows from its host:
//! the response cache, the pending-submission record store, the network transport and the client
//! registry. Concrete browser adapters live in `worker_host_web`; the in-memory adapters here back
//! tests and non-browser targets.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod cache;
pub mod clients;
pub mod host;
pub mod http;
pub mod storage;
pub mod transport;

pub use cache::{
    cache_add_all_with, MemoryResponseCache, NoopResponseCache, ResponseCache,
    ResponseCacheFuture,
};
pub use clients::{
    ClientMessage, ClientRegistry, ClientRegistryFuture, MemoryClientRegistry,
    NoopClientRegistry,
};
pub use host::WorkerHostServices;
pub use http::{
    normalize_url, HttpMethod, RequestKey, ResponseKind, WorkerRequest, WorkerResponse,
    FORM_URLENCODED, NULL_BODY_STATUSES,
};
pub use storage::submissions::{
    MemorySubmissionStore, NoopSubmissionStore, PendingSubmission, SubmissionStore,
    SubmissionStoreFuture, SUBMISSIONS_DB_NAME, SUBMISSIONS_DB_VERSION, SUBMISSIONS_STORE_NAME,
    SYNCED_INDEX_NAME,
};
pub use transport::{
    MemoryNetworkTransport, NetworkTransport, NetworkTransportFuture, NoopNetworkTransport,
};
