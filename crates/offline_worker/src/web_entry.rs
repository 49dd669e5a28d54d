//! `wasm-bindgen` exports invoked by the listener glue in the service-worker global scope.

use std::{cell::RefCell, fmt, rc::Rc};

use js_sys::{Array, Promise, Reflect, Uint8Array};
use wasm_bindgen::{prelude::*, JsCast};
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{
    ExtendableEvent, FetchEvent, Headers, Request, Response, ResponseInit, ServiceWorkerGlobalScope,
};
use worker_host::{HttpMethod, WorkerRequest, WorkerResponse};
use worker_host_web::{build_host_services, host_strategy_name, init_console_logging};

use crate::{FetchOutcome, OfflineWorker, WorkerConfig};

thread_local! {
    static WORKER: RefCell<Option<Rc<OfflineWorker>>> = const { RefCell::new(None) };
}

/// Builds the worker instance from a JSON `WorkerConfig`. Missing fields take their defaults.
#[wasm_bindgen]
pub fn worker_configure(config_json: &str) -> Result<(), JsValue> {
    let config = WorkerConfig::from_json(config_json).map_err(to_js_error)?;
    install_worker(config).map(|_| ())
}

/// Handles `install`; the glue passes the returned promise to `waitUntil`.
#[wasm_bindgen]
pub fn worker_install(_event: ExtendableEvent) -> Result<Promise, JsValue> {
    let worker = current_worker()?;
    Ok(future_to_promise(async move {
        let outcome = worker.install().await.map_err(to_js_error)?;
        log::debug!("install finished: {outcome:?}");
        Ok(JsValue::UNDEFINED)
    }))
}

/// Handles `activate`; the glue passes the returned promise to `waitUntil`.
#[wasm_bindgen]
pub fn worker_activate(_event: ExtendableEvent) -> Result<Promise, JsValue> {
    let worker = current_worker()?;
    Ok(future_to_promise(async move {
        worker.activate().await.map_err(to_js_error)?;
        Ok(JsValue::UNDEFINED)
    }))
}

/// Handles a `fetch` the glue already claimed; resolves to the `Response` to answer with.
///
/// Requests the worker does not serve are forwarded to the network unchanged.
#[wasm_bindgen]
pub fn worker_fetch(event: FetchEvent) -> Result<Promise, JsValue> {
    let worker = current_worker()?;
    worker.resume_activated();
    let web_request = event.request();
    let request = to_worker_request(&web_request)?;
    if !worker.classify(&request).is_intercept() {
        return Ok(global_scope()?.fetch_with_request(&web_request));
    }
    Ok(future_to_promise(async move {
        match worker.handle_fetch(&request).await {
            FetchOutcome::Respond(response) => to_web_response(&response).map(JsValue::from),
            FetchOutcome::PassThrough(_) => {
                JsFuture::from(global_scope()?.fetch_with_request(&web_request)).await
            }
        }
    }))
}

/// Handles `sync`; the glue passes the returned promise to `waitUntil`.
#[wasm_bindgen]
pub fn worker_sync(event: ExtendableEvent) -> Result<Promise, JsValue> {
    let worker = current_worker()?;
    worker.resume_activated();
    let tag = Reflect::get(&event, &JsValue::from_str("tag"))?
        .as_string()
        .unwrap_or_default();
    Ok(future_to_promise(async move {
        worker.handle_sync(&tag).await.map_err(to_js_error)?;
        Ok(JsValue::UNDEFINED)
    }))
}

/// Queues a submission for the next sync run; resolves to the record id.
#[wasm_bindgen]
pub fn worker_enqueue_submission(data: String, script_url: String) -> Result<Promise, JsValue> {
    let worker = current_worker()?;
    Ok(future_to_promise(async move {
        let id = worker
            .enqueue(&data, &script_url)
            .await
            .map_err(to_js_error)?;
        Ok(JsValue::from_f64(id as f64))
    }))
}

fn current_worker() -> Result<Rc<OfflineWorker>, JsValue> {
    if let Some(worker) = WORKER.with(|slot| slot.borrow().clone()) {
        return Ok(worker);
    }
    install_worker(WorkerConfig::default())
}

fn install_worker(config: WorkerConfig) -> Result<Rc<OfflineWorker>, JsValue> {
    console_error_panic_hook::set_once();
    init_console_logging(log::LevelFilter::Info);
    let worker = Rc::new(
        OfflineWorker::new(config, &worker_origin()?, build_host_services())
            .map_err(to_js_error)?,
    );
    log::info!(
        "offline worker ready for {} ({} host)",
        worker.scope().origin(),
        host_strategy_name()
    );
    WORKER.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&worker)));
    Ok(worker)
}

fn global_scope() -> Result<ServiceWorkerGlobalScope, JsValue> {
    js_sys::global().dyn_into()
}

fn worker_origin() -> Result<String, JsValue> {
    Ok(global_scope()?.location().origin())
}

fn to_worker_request(request: &Request) -> Result<WorkerRequest, JsValue> {
    let mut converted = WorkerRequest::new(HttpMethod::parse(&request.method()), request.url());
    if let Some(entries) = js_sys::try_iter(&request.headers())? {
        for entry in entries {
            let pair = Array::from(&entry?);
            if let (Some(name), Some(value)) = (pair.get(0).as_string(), pair.get(1).as_string()) {
                converted.headers.push((name, value));
            }
        }
    }
    Ok(converted)
}

fn to_web_response(response: &WorkerResponse) -> Result<Response, JsValue> {
    if response.is_network_error() || !(200..=599).contains(&response.status) {
        return Ok(Response::error());
    }
    let headers = Headers::new()?;
    for (name, value) in &response.headers {
        headers.append(name, value)?;
    }
    let init = ResponseInit::new();
    init.set_status(response.status);
    init.set_headers(&headers);
    let Some(body) = response.wire_body() else {
        return Response::new_with_opt_buffer_source_and_init(None, &init);
    };
    let bytes = Uint8Array::from(body);
    let body: &js_sys::Object = &bytes;
    Response::new_with_opt_buffer_source_and_init(Some(body), &init)
}

fn to_js_error(err: impl fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}
