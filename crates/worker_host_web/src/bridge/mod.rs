//! Service-worker capability bridge for `worker_host_web` service adapters.
//!
//! Calls route to the `wasm32` JS interop or to the non-wasm shim while preserving one API for
//! the cache, submissions, transport and clients adapters.

use worker_host::{ClientMessage, PendingSubmission, WorkerRequest, WorkerResponse};

#[cfg(not(target_arch = "wasm32"))]
mod non_wasm;
#[cfg(target_arch = "wasm32")]
mod wasm;
#[cfg(any(target_arch = "wasm32", test))]
mod wire;

#[cfg(not(target_arch = "wasm32"))]
use non_wasm as imp;
#[cfg(target_arch = "wasm32")]
use wasm as imp;

pub async fn cache_open(cache_name: &str) -> Result<(), String> {
    imp::cache_open(cache_name).await
}

pub async fn cache_names() -> Result<Vec<String>, String> {
    imp::cache_names().await
}

pub async fn cache_delete(cache_name: &str) -> Result<bool, String> {
    imp::cache_delete(cache_name).await
}

pub async fn cache_put(
    cache_name: &str,
    request: &WorkerRequest,
    response: &WorkerResponse,
) -> Result<(), String> {
    imp::cache_put(cache_name, request, response).await
}

pub async fn cache_match(request: &WorkerRequest) -> Result<Option<WorkerResponse>, String> {
    imp::cache_match(request).await
}

pub async fn submissions_open() -> Result<(), String> {
    imp::submissions_open().await
}

pub async fn submissions_add(data: &str, script_url: &str) -> Result<u64, String> {
    imp::submissions_add(data, script_url).await
}

pub async fn submissions_pending() -> Result<Vec<PendingSubmission>, String> {
    imp::submissions_pending().await
}

pub async fn submissions_get(id: u64) -> Result<Option<PendingSubmission>, String> {
    imp::submissions_get(id).await
}

pub async fn submissions_mark_synced(id: u64) -> Result<(), String> {
    imp::submissions_mark_synced(id).await
}

pub async fn network_fetch(request: &WorkerRequest) -> Result<WorkerResponse, String> {
    imp::network_fetch(request).await
}

pub async fn clients_skip_waiting() -> Result<(), String> {
    imp::clients_skip_waiting().await
}

pub async fn clients_claim() -> Result<(), String> {
    imp::clients_claim().await
}

pub async fn clients_broadcast(message: &ClientMessage) -> Result<usize, String> {
    imp::clients_broadcast(message).await
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn cache_public_api_non_wasm_parity() {
        let request = WorkerRequest::get("https://app.example/");
        block_on(cache_open("gen")).expect("open");
        assert_eq!(block_on(cache_names()).expect("names"), Vec::<String>::new());
        assert!(!block_on(cache_delete("gen")).expect("delete"));
        block_on(cache_put("gen", &request, &WorkerResponse::new(200, "x"))).expect("put");
        assert_eq!(block_on(cache_match(&request)).expect("match"), None);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn submissions_public_api_non_wasm_parity() {
        let expected = "Service worker APIs are only available when compiled for wasm32".to_string();

        block_on(submissions_open()).expect("open");
        assert!(block_on(submissions_pending()).expect("pending").is_empty());
        assert_eq!(block_on(submissions_get(1)).expect("get"), None);
        block_on(submissions_mark_synced(1)).expect("mark");
        assert_eq!(
            block_on(submissions_add("data", "https://s.example/exec"))
                .expect_err("add should fail"),
            expected
        );
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn transport_and_clients_public_api_non_wasm_parity() {
        let expected = "Service worker APIs are only available when compiled for wasm32".to_string();

        assert_eq!(
            block_on(network_fetch(&WorkerRequest::get("https://app.example/")))
                .expect_err("fetch should fail"),
            expected
        );
        block_on(clients_skip_waiting()).expect("skip waiting");
        block_on(clients_claim()).expect("claim");
        assert_eq!(
            block_on(clients_broadcast(&ClientMessage::SyncComplete {
                synced: 1,
                failed: 0,
            }))
            .expect("broadcast"),
            0
        );
    }
}
