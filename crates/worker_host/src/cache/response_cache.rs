//! Named response-cache service contracts and adapters.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use crate::{NetworkTransport, RequestKey, WorkerRequest, WorkerResponse};

/// Object-safe boxed future used by [`ResponseCache`] async methods.
pub type ResponseCacheFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host cache service holding named generations of request/response pairs.
pub trait ResponseCache {
    /// Opens `cache_name`, creating it when absent.
    fn open<'a>(&'a self, cache_name: &'a str) -> ResponseCacheFuture<'a, Result<(), String>>;

    /// Lists existing cache names in creation order.
    fn cache_names<'a>(&'a self) -> ResponseCacheFuture<'a, Result<Vec<String>, String>>;

    /// Deletes a whole cache; resolves to whether it existed.
    fn delete_cache<'a>(
        &'a self,
        cache_name: &'a str,
    ) -> ResponseCacheFuture<'a, Result<bool, String>>;

    /// Stores `response` under the key of `request` in `cache_name`, overwriting any prior entry.
    fn put<'a>(
        &'a self,
        cache_name: &'a str,
        request: &'a WorkerRequest,
        response: &'a WorkerResponse,
    ) -> ResponseCacheFuture<'a, Result<(), String>>;

    /// Finds the first entry matching `request` across all caches, oldest cache first.
    fn match_request<'a>(
        &'a self,
        request: &'a WorkerRequest,
    ) -> ResponseCacheFuture<'a, Result<Option<WorkerResponse>, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op cache adapter for unsupported targets and baseline tests.
pub struct NoopResponseCache;

impl ResponseCache for NoopResponseCache {
    fn open<'a>(&'a self, _cache_name: &'a str) -> ResponseCacheFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn cache_names<'a>(&'a self) -> ResponseCacheFuture<'a, Result<Vec<String>, String>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn delete_cache<'a>(
        &'a self,
        _cache_name: &'a str,
    ) -> ResponseCacheFuture<'a, Result<bool, String>> {
        Box::pin(async { Ok(false) })
    }

    fn put<'a>(
        &'a self,
        _cache_name: &'a str,
        _request: &'a WorkerRequest,
        _response: &'a WorkerResponse,
    ) -> ResponseCacheFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn match_request<'a>(
        &'a self,
        _request: &'a WorkerRequest,
    ) -> ResponseCacheFuture<'a, Result<Option<WorkerResponse>, String>> {
        Box::pin(async { Ok(None) })
    }
}

#[derive(Debug, Default)]
struct CacheGeneration {
    name: String,
    entries: HashMap<RequestKey, WorkerResponse>,
}

#[derive(Debug, Clone, Default)]
/// In-memory cache adapter keeping generations in creation order.
pub struct MemoryResponseCache {
    inner: Rc<RefCell<Vec<CacheGeneration>>>,
}

impl MemoryResponseCache {
    /// Returns the number of entries stored in `cache_name`, or `None` when it does not exist.
    pub fn entry_count(&self, cache_name: &str) -> Option<usize> {
        self.inner
            .borrow()
            .iter()
            .find(|generation| generation.name == cache_name)
            .map(|generation| generation.entries.len())
    }
}

impl ResponseCache for MemoryResponseCache {
    fn open<'a>(&'a self, cache_name: &'a str) -> ResponseCacheFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let mut generations = self.inner.borrow_mut();
            if !generations.iter().any(|g| g.name == cache_name) {
                generations.push(CacheGeneration {
                    name: cache_name.to_string(),
                    entries: HashMap::new(),
                });
            }
            Ok(())
        })
    }

    fn cache_names<'a>(&'a self) -> ResponseCacheFuture<'a, Result<Vec<String>, String>> {
        Box::pin(async move {
            Ok(self
                .inner
                .borrow()
                .iter()
                .map(|generation| generation.name.clone())
                .collect())
        })
    }

    fn delete_cache<'a>(
        &'a self,
        cache_name: &'a str,
    ) -> ResponseCacheFuture<'a, Result<bool, String>> {
        Box::pin(async move {
            let mut generations = self.inner.borrow_mut();
            let before = generations.len();
            generations.retain(|generation| generation.name != cache_name);
            Ok(generations.len() != before)
        })
    }

    fn put<'a>(
        &'a self,
        cache_name: &'a str,
        request: &'a WorkerRequest,
        response: &'a WorkerResponse,
    ) -> ResponseCacheFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let mut generations = self.inner.borrow_mut();
            let index = match generations.iter().position(|g| g.name == cache_name) {
                Some(index) => index,
                None => {
                    generations.push(CacheGeneration {
                        name: cache_name.to_string(),
                        entries: HashMap::new(),
                    });
                    generations.len() - 1
                }
            };
            generations[index]
                .entries
                .insert(request.key(), response.clone());
            Ok(())
        })
    }

    fn match_request<'a>(
        &'a self,
        request: &'a WorkerRequest,
    ) -> ResponseCacheFuture<'a, Result<Option<WorkerResponse>, String>> {
        Box::pin(async move {
            let key = request.key();
            Ok(self
                .inner
                .borrow()
                .iter()
                .find_map(|generation| generation.entries.get(&key).cloned()))
        })
    }
}

/// Fetches every request and stores all responses in `cache_name`, or stores none of them.
///
/// # Errors
///
/// Returns an error when any fetch fails, any response is not a 2xx, or a cache write fails.
pub async fn cache_add_all_with<C, N>(
    cache: &C,
    network: &N,
    cache_name: &str,
    requests: &[WorkerRequest],
) -> Result<(), String>
where
    C: ResponseCache + ?Sized,
    N: NetworkTransport + ?Sized,
{
    let mut fetched = Vec::with_capacity(requests.len());
    for request in requests {
        let response = network.fetch(request).await?;
        if !response.is_ok() {
            return Err(format!(
                "request for `{}` returned status {}",
                request.url, response.status
            ));
        }
        fetched.push(response);
    }

    cache.open(cache_name).await?;
    for (request, response) in requests.iter().zip(&fetched) {
        cache.put(cache_name, request, response).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::MemoryNetworkTransport;

    #[test]
    fn memory_cache_put_match_and_overwrite() {
        let cache = MemoryResponseCache::default();
        let cache_obj: &dyn ResponseCache = &cache;
        let request = WorkerRequest::get("https://app.example/index.html");

        block_on(cache_obj.put("gen-1", &request, &WorkerResponse::new(200, "v1"))).expect("put");
        assert_eq!(
            block_on(cache_obj.match_request(&request)).expect("match"),
            Some(WorkerResponse::new(200, "v1"))
        );

        block_on(cache_obj.put("gen-1", &request, &WorkerResponse::new(200, "v2"))).expect("put");
        assert_eq!(
            block_on(cache_obj.match_request(&request))
                .expect("match")
                .map(|r| r.body),
            Some(b"v2".to_vec())
        );
        assert_eq!(cache.entry_count("gen-1"), Some(1));
    }

    #[test]
    fn memory_cache_names_keep_creation_order_and_delete() {
        let cache = MemoryResponseCache::default();
        let cache_obj: &dyn ResponseCache = &cache;
        block_on(cache_obj.open("b")).expect("open");
        block_on(cache_obj.open("a")).expect("open");
        block_on(cache_obj.open("b")).expect("reopen");

        assert_eq!(
            block_on(cache_obj.cache_names()).expect("names"),
            vec!["b".to_string(), "a".to_string()]
        );
        assert!(block_on(cache_obj.delete_cache("b")).expect("delete"));
        assert!(!block_on(cache_obj.delete_cache("b")).expect("delete again"));
        assert_eq!(
            block_on(cache_obj.cache_names()).expect("names"),
            vec!["a".to_string()]
        );
    }

    #[test]
    fn memory_cache_match_searches_oldest_generation_first() {
        let cache = MemoryResponseCache::default();
        let cache_obj: &dyn ResponseCache = &cache;
        let request = WorkerRequest::get("https://app.example/");
        block_on(cache_obj.put("old", &request, &WorkerResponse::new(200, "old"))).expect("put");
        block_on(cache_obj.put("new", &request, &WorkerResponse::new(200, "new"))).expect("put");

        let hit = block_on(cache_obj.match_request(&request))
            .expect("match")
            .expect("hit");
        assert_eq!(hit.body, b"old".to_vec());
    }

    #[test]
    fn add_all_is_all_or_nothing() {
        let cache = MemoryResponseCache::default();
        let network = MemoryNetworkTransport::default();
        network.respond("https://app.example/", WorkerResponse::new(200, "root"));
        network.respond("https://app.example/manifest.json", WorkerResponse::new(404, ""));
        let requests = vec![
            WorkerRequest::get("https://app.example/"),
            WorkerRequest::get("https://app.example/manifest.json"),
        ];

        let err = block_on(cache_add_all_with(&cache, &network, "gen", &requests))
            .expect_err("404 should reject");
        assert!(err.contains("status 404"));
        assert_eq!(cache.entry_count("gen"), None);

        network.respond("https://app.example/manifest.json", WorkerResponse::new(200, "{}"));
        block_on(cache_add_all_with(&cache, &network, "gen", &requests)).expect("add all");
        assert_eq!(cache.entry_count("gen"), Some(2));
    }

    #[test]
    fn noop_response_cache_is_empty_and_successful() {
        let cache = NoopResponseCache;
        let cache_obj: &dyn ResponseCache = &cache;
        let request = WorkerRequest::get("https://app.example/");
        block_on(cache_obj.open("x")).expect("open");
        block_on(cache_obj.put("x", &request, &WorkerResponse::new(200, "y"))).expect("put");
        assert_eq!(block_on(cache_obj.match_request(&request)).expect("match"), None);
        assert!(block_on(cache_obj.cache_names()).expect("names").is_empty());
        assert!(!block_on(cache_obj.delete_cache("x")).expect("delete"));
    }
}
