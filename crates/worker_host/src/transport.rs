//! Network transport contracts and scripted adapters.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use crate::{http::normalize_url, WorkerRequest, WorkerResponse};

/// Object-safe boxed future used by [`NetworkTransport`] async methods.
pub type NetworkTransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host fetch pipeline.
///
/// `Err` means the request never produced a response (offline, DNS, CORS rejection). HTTP error
/// statuses are `Ok` responses.
pub trait NetworkTransport {
    /// Performs a live network request.
    fn fetch<'a>(
        &'a self,
        request: &'a WorkerRequest,
    ) -> NetworkTransportFuture<'a, Result<WorkerResponse, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Transport that is permanently offline.
pub struct NoopNetworkTransport;

impl NetworkTransport for NoopNetworkTransport {
    fn fetch<'a>(
        &'a self,
        request: &'a WorkerRequest,
    ) -> NetworkTransportFuture<'a, Result<WorkerResponse, String>> {
        Box::pin(async move { Err(format!("network unavailable for `{}`", request.url)) })
    }
}

#[derive(Debug, Clone)]
enum Route {
    Respond(WorkerResponse),
    Fail(String),
}

#[derive(Debug, Default)]
struct TransportState {
    routes: HashMap<String, Route>,
    calls: Vec<WorkerRequest>,
}

#[derive(Debug, Clone, Default)]
/// Scripted transport answering by URL (any method) and recording every request.
///
/// Unrouted URLs fail like an offline network.
pub struct MemoryNetworkTransport {
    inner: Rc<RefCell<TransportState>>,
}

impl MemoryNetworkTransport {
    /// Answers requests for `url` with `response`.
    pub fn respond(&self, url: &str, response: WorkerResponse) {
        self.inner
            .borrow_mut()
            .routes
            .insert(normalize_url(url), Route::Respond(response));
    }

    /// Fails requests for `url` with a transport error.
    pub fn fail(&self, url: &str, message: impl Into<String>) {
        self.inner
            .borrow_mut()
            .routes
            .insert(normalize_url(url), Route::Fail(message.into()));
    }

    /// Removes every route so all requests fail.
    pub fn go_offline(&self) {
        self.inner.borrow_mut().routes.clear();
    }

    /// Returns every request seen so far.
    pub fn calls(&self) -> Vec<WorkerRequest> {
        self.inner.borrow().calls.clone()
    }

    /// Returns the number of requests seen so far.
    pub fn call_count(&self) -> usize {
        self.inner.borrow().calls.len()
    }
}

impl NetworkTransport for MemoryNetworkTransport {
    fn fetch<'a>(
        &'a self,
        request: &'a WorkerRequest,
    ) -> NetworkTransportFuture<'a, Result<WorkerResponse, String>> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            state.calls.push(request.clone());
            match state.routes.get(&normalize_url(&request.url)) {
                Some(Route::Respond(response)) => Ok(response.clone()),
                Some(Route::Fail(message)) => Err(message.clone()),
                None => Err(format!("Failed to fetch `{}`", request.url)),
            }
        })
    }
}
