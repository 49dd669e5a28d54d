//! Host-service bundle injected into the offline worker.

use std::rc::Rc;

use crate::{
    ClientRegistry, MemoryClientRegistry, MemoryNetworkTransport, MemoryResponseCache,
    MemorySubmissionStore, NetworkTransport, NoopClientRegistry, NoopNetworkTransport,
    NoopResponseCache, NoopSubmissionStore, ResponseCache, SubmissionStore,
};

/// Runtime-selected host services the worker composes.
///
/// All environment-specific adapter selection happens before this bundle reaches the worker, so
/// the handlers never import browser adapter types.
#[derive(Clone)]
pub struct WorkerHostServices {
    /// Named response-cache generations.
    pub cache: Rc<dyn ResponseCache>,
    /// Durable pending-submission queue.
    pub submissions: Rc<dyn SubmissionStore>,
    /// Live fetch pipeline.
    pub network: Rc<dyn NetworkTransport>,
    /// Controlled pages and activation control.
    pub clients: Rc<dyn ClientRegistry>,
}

impl WorkerHostServices {
    /// Bundle of no-op adapters: empty cache, empty queue, offline network, no pages.
    pub fn noop() -> Self {
        Self {
            cache: Rc::new(NoopResponseCache),
            submissions: Rc::new(NoopSubmissionStore),
            network: Rc::new(NoopNetworkTransport),
            clients: Rc::new(NoopClientRegistry),
        }
    }

    /// Bundle backed by the given in-memory adapters; the caller keeps handles for inspection.
    pub fn memory(
        cache: &MemoryResponseCache,
        submissions: &MemorySubmissionStore,
        network: &MemoryNetworkTransport,
        clients: &MemoryClientRegistry,
    ) -> Self {
        Self {
            cache: Rc::new(cache.clone()),
            submissions: Rc::new(submissions.clone()),
            network: Rc::new(network.clone()),
            clients: Rc::new(clients.clone()),
        }
    }
}
