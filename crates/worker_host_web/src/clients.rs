//! `self.clients`-backed client registry implementation.

use worker_host::{ClientMessage, ClientRegistry, ClientRegistryFuture};

#[derive(Debug, Clone, Copy, Default)]
/// Client registry backed by the service-worker global scope.
pub struct WebClientRegistry;

impl ClientRegistry for WebClientRegistry {
    fn skip_waiting<'a>(&'a self) -> ClientRegistryFuture<'a, Result<(), String>> {
        Box::pin(async move { crate::bridge::clients_skip_waiting().await })
    }

    fn claim<'a>(&'a self) -> ClientRegistryFuture<'a, Result<(), String>> {
        Box::pin(async move { crate::bridge::clients_claim().await })
    }

    fn broadcast<'a>(
        &'a self,
        message: &'a ClientMessage,
    ) -> ClientRegistryFuture<'a, Result<usize, String>> {
        Box::pin(async move { crate::bridge::clients_broadcast(message).await })
    }
}
