//! Request/response heads exchanged with the JS glue. Bodies travel beside them as `Uint8Array`s.

use serde::{Deserialize, Serialize};
use worker_host::{ResponseKind, WorkerRequest, WorkerResponse};

#[derive(Debug, Serialize)]
pub(crate) struct RequestHead<'a> {
    method: &'a str,
    url: &'a str,
    headers: &'a [(String, String)],
}

impl<'a> RequestHead<'a> {
    pub(crate) fn of(request: &'a WorkerRequest) -> Self {
        Self {
            method: request.method.as_str(),
            url: &request.url,
            headers: &request.headers,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ResponseHead {
    status: u16,
    #[serde(default)]
    kind: ResponseKind,
    #[serde(default)]
    headers: Vec<(String, String)>,
}

impl ResponseHead {
    pub(crate) fn of(response: &WorkerResponse) -> Self {
        Self {
            status: response.status,
            kind: response.kind,
            headers: response.headers.clone(),
        }
    }

    pub(crate) fn with_body(self, body: Vec<u8>) -> WorkerResponse {
        WorkerResponse {
            status: self.status,
            kind: self.kind,
            headers: self.headers,
            body,
        }
    }
}
