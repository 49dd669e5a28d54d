//! `fetch`-backed network transport implementation.

use worker_host::{NetworkTransport, NetworkTransportFuture, WorkerRequest, WorkerResponse};

#[derive(Debug, Clone, Copy, Default)]
/// Network transport backed by the worker-global `fetch`.
pub struct WebNetworkTransport;

impl NetworkTransport for WebNetworkTransport {
    fn fetch<'a>(
        &'a self,
        request: &'a WorkerRequest,
    ) -> NetworkTransportFuture<'a, Result<WorkerResponse, String>> {
        Box::pin(async move { crate::bridge::network_fetch(request).await })
    }
}
