//! Browser (`wasm32`) implementations of [`worker_host`] service contracts.
//!
//! This crate is the concrete service-worker wiring layer for the response cache (Cache
//! Storage), the pending-submission queue (IndexedDB), the fetch transport, and the client
//! registry. All JS interop lives in `bridge`; on non-wasm targets the bridge is a shim that
//! reports the browser APIs as unavailable.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host-strategy selection and the host-service bundle factory.
pub mod adapters;
mod bridge;
pub mod cache;
pub mod clients;
pub mod logging;
pub mod storage;
pub mod transport;

pub use adapters::{build_host_services, host_strategy_name, selected_host_strategy, HostStrategy};
pub use cache::cache_storage::WebResponseCache;
pub use clients::WebClientRegistry;
pub use logging::init_console_logging;
pub use storage::indexed_db::WebSubmissionStore;
pub use transport::WebNetworkTransport;
