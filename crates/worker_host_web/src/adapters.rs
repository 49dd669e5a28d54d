use std::rc::Rc;

use worker_host::WorkerHostServices;

use crate::{WebClientRegistry, WebNetworkTransport, WebResponseCache, WebSubmissionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Compile-time selected host strategy for `worker_host_web` adapters.
pub enum HostStrategy {
    /// Service-worker global scope adapters.
    Browser,
    /// No-op adapters for builds that must not touch browser storage.
    Stub,
}

/// Returns the compile-time selected host strategy for the active build.
pub const fn selected_host_strategy() -> HostStrategy {
    #[cfg(feature = "worker-host-stub")]
    {
        HostStrategy::Stub
    }

    #[cfg(not(feature = "worker-host-stub"))]
    {
        HostStrategy::Browser
    }
}

/// Returns the selected host strategy as a stable string token.
pub fn host_strategy_name() -> &'static str {
    match selected_host_strategy() {
        HostStrategy::Browser => "browser",
        HostStrategy::Stub => "stub",
    }
}

/// Builds the host-service bundle for the compile-time selected host strategy.
pub fn build_host_services() -> WorkerHostServices {
    match selected_host_strategy() {
        HostStrategy::Browser => WorkerHostServices {
            cache: Rc::new(WebResponseCache),
            submissions: Rc::new(WebSubmissionStore),
            network: Rc::new(WebNetworkTransport),
            clients: Rc::new(WebClientRegistry),
        },
        HostStrategy::Stub => WorkerHostServices::noop(),
    }
}
