use super::*;

fn unsupported() -> String {
    "Service worker APIs are only available when compiled for wasm32".to_string()
}

pub async fn cache_open(_cache_name: &str) -> Result<(), String> {
    Ok(())
}

pub async fn cache_names() -> Result<Vec<String>, String> {
    Ok(Vec::new())
}

pub async fn cache_delete(_cache_name: &str) -> Result<bool, String> {
    Ok(false)
}

pub async fn cache_put(
    _cache_name: &str,
    _request: &WorkerRequest,
    _response: &WorkerResponse,
) -> Result<(), String> {
    Ok(())
}

pub async fn cache_match(_request: &WorkerRequest) -> Result<Option<WorkerResponse>, String> {
    Ok(None)
}

pub async fn submissions_open() -> Result<(), String> {
    Ok(())
}

pub async fn submissions_add(_data: &str, _script_url: &str) -> Result<u64, String> {
    Err(unsupported())
}

pub async fn submissions_pending() -> Result<Vec<PendingSubmission>, String> {
    Ok(Vec::new())
}

pub async fn submissions_get(_id: u64) -> Result<Option<PendingSubmission>, String> {
    Ok(None)
}

pub async fn submissions_mark_synced(_id: u64) -> Result<(), String> {
    Ok(())
}

pub async fn network_fetch(_request: &WorkerRequest) -> Result<WorkerResponse, String> {
    Err(unsupported())
}

pub async fn clients_skip_waiting() -> Result<(), String> {
    Ok(())
}

pub async fn clients_claim() -> Result<(), String> {
    Ok(())
}

pub async fn clients_broadcast(_message: &ClientMessage) -> Result<usize, String> {
    Ok(0)
}
