//! Cache Storage-backed response cache implementation.

use worker_host::{ResponseCache, ResponseCacheFuture, WorkerRequest, WorkerResponse};

#[derive(Debug, Clone, Copy, Default)]
/// Service-worker response cache backed by the Cache Storage API.
pub struct WebResponseCache;

impl ResponseCache for WebResponseCache {
    fn open<'a>(&'a self, cache_name: &'a str) -> ResponseCacheFuture<'a, Result<(), String>> {
        Box::pin(async move { crate::bridge::cache_open(cache_name).await })
    }

    fn cache_names<'a>(&'a self) -> ResponseCacheFuture<'a, Result<Vec<String>, String>> {
        Box::pin(async move { crate::bridge::cache_names().await })
    }

    fn delete_cache<'a>(
        &'a self,
        cache_name: &'a str,
    ) -> ResponseCacheFuture<'a, Result<bool, String>> {
        Box::pin(async move { crate::bridge::cache_delete(cache_name).await })
    }

    fn put<'a>(
        &'a self,
        cache_name: &'a str,
        request: &'a WorkerRequest,
        response: &'a WorkerResponse,
    ) -> ResponseCacheFuture<'a, Result<(), String>> {
        Box::pin(async move { crate::bridge::cache_put(cache_name, request, response).await })
    }

    fn match_request<'a>(
        &'a self,
        request: &'a WorkerRequest,
    ) -> ResponseCacheFuture<'a, Result<Option<WorkerResponse>, String>> {
        Box::pin(async move { crate::bridge::cache_match(request).await })
    }
}
