//! Cache-first response pipeline with an offline fallback entry.

use worker_host::{NetworkTransport, ResponseCache, WorkerRequest, WorkerResponse};

use crate::scope::PassThroughReason;

#[derive(Debug, Clone, PartialEq, Eq)]
/// What the worker does with one fetch event.
pub enum FetchOutcome {
    /// The host performs the request itself.
    PassThrough(PassThroughReason),
    /// The worker answers with this response.
    Respond(WorkerResponse),
}

/// Answers `request` from the cache, then the network, then the cached `fallback` entry.
///
/// Fresh `200` responses are written into `cache_name` before being returned. Cache-write
/// failures are logged and do not affect the response.
pub async fn respond_cache_first(
    cache: &dyn ResponseCache,
    network: &dyn NetworkTransport,
    cache_name: &str,
    fallback: &WorkerRequest,
    request: &WorkerRequest,
) -> WorkerResponse {
    match cache.match_request(request).await {
        Ok(Some(hit)) => return hit,
        Ok(None) => {}
        Err(err) => {
            log::warn!("cache lookup for {} failed: {err}", request.url);
            return offline_fallback(cache, fallback).await;
        }
    }

    match network.fetch(request).await {
        Ok(response) => {
            if response.is_cacheable_success() {
                if let Err(err) = cache.put(cache_name, request, &response).await {
                    log::warn!("cache write for {} failed: {err}", request.url);
                }
            }
            response
        }
        Err(err) => {
            log::info!("fetch for {} failed, serving offline entry: {err}", request.url);
            offline_fallback(cache, fallback).await
        }
    }
}

async fn offline_fallback(cache: &dyn ResponseCache, fallback: &WorkerRequest) -> WorkerResponse {
    match cache.match_request(fallback).await {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            log::warn!("offline entry {} is not cached", fallback.url);
            WorkerResponse::network_error()
        }
        Err(err) => {
            log::warn!("offline entry lookup failed: {err}");
            WorkerResponse::network_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use worker_host::{MemoryNetworkTransport, MemoryResponseCache, ResponseCacheFuture};

    use super::*;

    const CACHE: &str = "qrscout-v4";

    fn fallback() -> WorkerRequest {
        WorkerRequest::get("https://app.example/index.html")
    }

    fn respond(
        cache: &MemoryResponseCache,
        network: &MemoryNetworkTransport,
        url: &str,
    ) -> WorkerResponse {
        block_on(respond_cache_first(
            cache,
            network,
            CACHE,
            &fallback(),
            &WorkerRequest::get(url),
        ))
    }

    #[test]
    fn cache_hit_skips_network() {
        let cache = MemoryResponseCache::default();
        let network = MemoryNetworkTransport::default();
        let request = WorkerRequest::get("https://app.example/app.js");
        block_on(cache.put(CACHE, &request, &WorkerResponse::new(200, "cached"))).expect("put");
        network.respond(&request.url, WorkerResponse::new(200, "fresh"));

        let response = respond(&cache, &network, &request.url);

        assert_eq!(response.body, b"cached".to_vec());
        assert_eq!(network.call_count(), 0);
    }

    #[test]
    fn miss_fetches_and_stores_success() {
        let cache = MemoryResponseCache::default();
        let network = MemoryNetworkTransport::default();
        network.respond("https://app.example/app.js", WorkerResponse::new(200, "fresh"));

        let first = respond(&cache, &network, "https://app.example/app.js");
        network.go_offline();
        let second = respond(&cache, &network, "https://app.example/app.js");

        assert_eq!(first.body, b"fresh".to_vec());
        assert_eq!(second, first);
        assert_eq!(network.call_count(), 1);
    }

    #[test]
    fn non_200_responses_are_returned_but_not_cached() {
        let cache = MemoryResponseCache::default();
        let network = MemoryNetworkTransport::default();
        network.respond("https://app.example/missing", WorkerResponse::new(404, "nope"));

        let response = respond(&cache, &network, "https://app.example/missing");

        assert_eq!(response.status, 404);
        assert_eq!(cache.entry_count(CACHE), None);
    }

    #[test]
    fn network_failure_serves_offline_entry_for_any_path() {
        let cache = MemoryResponseCache::default();
        let network = MemoryNetworkTransport::default();
        block_on(cache.put(CACHE, &fallback(), &WorkerResponse::new(200, "<html>app</html>")))
            .expect("put");

        let response = respond(&cache, &network, "https://app.example/deep/route.css");

        assert_eq!(response.body, b"<html>app</html>".to_vec());
    }

    #[test]
    fn missing_offline_entry_yields_network_error() {
        let cache = MemoryResponseCache::default();
        let network = MemoryNetworkTransport::default();

        let response = respond(&cache, &network, "https://app.example/app.js");

        assert!(response.is_network_error());
    }

    struct ReadOnlyCache(MemoryResponseCache);

    impl ResponseCache for ReadOnlyCache {
        fn open<'a>(&'a self, name: &'a str) -> ResponseCacheFuture<'a, Result<(), String>> {
            self.0.open(name)
        }

        fn cache_names<'a>(&'a self) -> ResponseCacheFuture<'a, Result<Vec<String>, String>> {
            self.0.cache_names()
        }

        fn delete_cache<'a>(
            &'a self,
            name: &'a str,
        ) -> ResponseCacheFuture<'a, Result<bool, String>> {
            self.0.delete_cache(name)
        }

        fn put<'a>(
            &'a self,
            _name: &'a str,
            _request: &'a WorkerRequest,
            _response: &'a WorkerResponse,
        ) -> ResponseCacheFuture<'a, Result<(), String>> {
            Box::pin(async { Err("quota exceeded".to_string()) })
        }

        fn match_request<'a>(
            &'a self,
            request: &'a WorkerRequest,
        ) -> ResponseCacheFuture<'a, Result<Option<WorkerResponse>, String>> {
            self.0.match_request(request)
        }
    }

    #[test]
    fn cache_write_failure_still_returns_fresh_response() {
        let cache = ReadOnlyCache(MemoryResponseCache::default());
        let network = MemoryNetworkTransport::default();
        network.respond("https://app.example/app.js", WorkerResponse::new(200, "fresh"));

        let response = block_on(respond_cache_first(
            &cache,
            &network,
            CACHE,
            &fallback(),
            &WorkerRequest::get("https://app.example/app.js"),
        ));

        assert_eq!(response.body, b"fresh".to_vec());
    }
}
