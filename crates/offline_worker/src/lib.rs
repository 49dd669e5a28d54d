//! Offline proxy service worker for the QRScout scouting app.
//!
//! The worker pre-caches the app shell at install, prunes stale cache generations at activate,
//! answers same-origin `GET` requests cache-first with an offline fallback to the HTML entry
//! point, and relays queued form submissions to their endpoint when the `sync-pending-data`
//! background sync fires.
//!
//! Handlers run over a [`worker_host::WorkerHostServices`] bundle, so the same code drives the
//! browser adapters from `worker_host_web` and the in-memory adapters used by tests. The `wasm32`
//! build exports `worker_*` entry points that [`append_worker_listeners`] wires to the
//! service-worker events.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod background_sync;
pub mod cache_first;
pub mod config;
mod error;
pub mod generations;
pub mod lifecycle;
pub mod listeners;
pub mod scope;
#[cfg(target_arch = "wasm32")]
mod web_entry;
mod worker;

pub use background_sync::{
    enqueue_submission, relay_submission, sync_pending_submissions, SyncReport,
    SUBMISSION_DATA_FIELD,
};
pub use cache_first::{respond_cache_first, FetchOutcome};
pub use config::{
    WorkerConfig, DEFAULT_CACHE_NAME, DEFAULT_LOCAL_HOSTS, DEFAULT_OFFLINE_FALLBACK_PATH,
    DEFAULT_PUBLIC_PAGES_DOMAINS, DEFAULT_SEED_PATHS, SYNC_PENDING_DATA_TAG,
};
pub use error::{SubmissionFailure, WorkerError};
pub use generations::{prune_generations, seed_generation, SeedOutcome};
pub use lifecycle::{LifecycleEvent, WorkerPhase};
pub use listeners::append_worker_listeners;
pub use scope::{InterceptDecision, PassThroughReason, WorkerScope};
pub use worker::{OfflineWorker, WorkerEvent, WorkerEventOutcome};
