use js_sys::{Array, Promise, Uint8Array};
use serde::{de::DeserializeOwned, Serialize};
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::{
    wire::{RequestHead, ResponseHead},
    *,
};

#[wasm_bindgen(inline_js = r#"
const DB_NAME = 'QRScoutDB';
const DB_VERSION = 1;
const SUBMISSIONS_STORE = 'submissions';
const SYNCED_INDEX = 'synced';

function fail(message) {
  throw new Error(message);
}

function requestToPromise(req) {
  return new Promise((resolve, reject) => {
    req.onsuccess = () => resolve(req.result);
    req.onerror = () => reject(req.error || new Error('IndexedDB request failed'));
  });
}

function txDone(tx) {
  return new Promise((resolve, reject) => {
    tx.oncomplete = () => resolve();
    tx.onabort = () => reject(tx.error || new Error('IndexedDB transaction aborted'));
    tx.onerror = () => reject(tx.error || new Error('IndexedDB transaction error'));
  });
}

async function openDb() {
  if (typeof indexedDB === 'undefined') {
    fail('IndexedDB is unavailable in this worker context');
  }
  return await new Promise((resolve, reject) => {
    const req = indexedDB.open(DB_NAME, DB_VERSION);
    req.onupgradeneeded = () => {
      const db = req.result;
      if (!db.objectStoreNames.contains(SUBMISSIONS_STORE)) {
        const store = db.createObjectStore(SUBMISSIONS_STORE, { keyPath: 'id', autoIncrement: true });
        store.createIndex(SYNCED_INDEX, SYNCED_INDEX, { unique: false });
      }
    };
    req.onsuccess = () => resolve(req.result);
    req.onerror = () => reject(req.error || new Error('Failed to open IndexedDB'));
  });
}

async function withStore(mode, fn) {
  const db = await openDb();
  try {
    const tx = db.transaction(SUBMISSIONS_STORE, mode);
    const done = txDone(tx);
    const result = await fn(tx.objectStore(SUBMISSIONS_STORE));
    await done;
    return result;
  } finally {
    db.close();
  }
}

function textField(value) {
  if (typeof value === 'string') {
    return value;
  }
  if (value === undefined || value === null) {
    return '';
  }
  const json = JSON.stringify(value);
  return json === undefined ? String(value) : json;
}

function toRecord(raw) {
  return {
    id: raw.id,
    data: textField(raw.data),
    scriptUrl: textField(raw.scriptUrl),
    synced: raw.synced === true,
  };
}

async function submissionsOpen() {
  const db = await openDb();
  db.close();
  return null;
}

async function submissionsAdd(data, scriptUrl) {
  return await withStore('readwrite', async (store) => {
    return await requestToPromise(store.add({ data, scriptUrl, synced: false }));
  });
}

// Booleans are not valid IndexedDB keys, so the synced index never holds entries.
async function submissionsPending() {
  return await withStore('readonly', async (store) => {
    const all = await requestToPromise(store.getAll());
    return all.filter((raw) => raw.synced !== true).map(toRecord);
  });
}

async function submissionsGet(id) {
  return await withStore('readonly', async (store) => {
    const raw = await requestToPromise(store.get(id));
    return raw ? toRecord(raw) : null;
  });
}

async function submissionsMarkSynced(id) {
  return await withStore('readwrite', async (store) => {
    const raw = await requestToPromise(store.get(id));
    if (raw) {
      raw.synced = true;
      await requestToPromise(store.put(raw));
    }
    return null;
  });
}

function toRequest(head, body) {
  const init = { method: head.method, headers: head.headers || [] };
  if (body) {
    init.body = body;
  }
  return new Request(head.url, init);
}

// `body` is null for empty bodies and null-body statuses.
function toResponse(head, body) {
  return new Response(body, { status: head.status, headers: head.headers || [] });
}

async function fromResponse(res) {
  const buf = await res.arrayBuffer();
  const head = { status: res.status, kind: res.type, headers: Array.from(res.headers.entries()) };
  return [head, new Uint8Array(buf)];
}

async function cacheOpen(cacheName) {
  await caches.open(cacheName);
  return null;
}

async function cacheNames() {
  return await caches.keys();
}

async function cacheDelete(cacheName) {
  return await caches.delete(cacheName);
}

async function cachePut(cacheName, reqHead, reqBody, resHead, resBody) {
  const cache = await caches.open(cacheName);
  await cache.put(toRequest(reqHead, reqBody), toResponse(resHead, resBody));
  return null;
}

async function cacheMatch(reqHead, reqBody) {
  const hit = await caches.match(toRequest(reqHead, reqBody));
  return hit ? await fromResponse(hit) : null;
}

async function networkFetch(reqHead, reqBody) {
  return await fromResponse(await fetch(toRequest(reqHead, reqBody)));
}

async function clientsSkipWaiting() {
  await self.skipWaiting();
  return null;
}

async function clientsClaim() {
  await self.clients.claim();
  return null;
}

async function clientsBroadcast(message) {
  const pages = await self.clients.matchAll();
  pages.forEach((page) => page.postMessage(message));
  return pages.length;
}

export async function jsCacheOpen(cacheName) { return await cacheOpen(cacheName); }
export async function jsCacheNames() { return await cacheNames(); }
export async function jsCacheDelete(cacheName) { return await cacheDelete(cacheName); }
export async function jsCachePut(cacheName, reqHead, reqBody, resHead, resBody) { return await cachePut(cacheName, reqHead, reqBody, resHead, resBody); }
export async function jsCacheMatch(reqHead, reqBody) { return await cacheMatch(reqHead, reqBody); }

export async function jsSubmissionsOpen() { return await submissionsOpen(); }
export async function jsSubmissionsAdd(data, scriptUrl) { return await submissionsAdd(data, scriptUrl); }
export async function jsSubmissionsPending() { return await submissionsPending(); }
export async function jsSubmissionsGet(id) { return await submissionsGet(id); }
export async function jsSubmissionsMarkSynced(id) { return await submissionsMarkSynced(id); }

export async function jsNetworkFetch(reqHead, reqBody) { return await networkFetch(reqHead, reqBody); }

export async function jsClientsSkipWaiting() { return await clientsSkipWaiting(); }
export async function jsClientsClaim() { return await clientsClaim(); }
export async function jsClientsBroadcast(message) { return await clientsBroadcast(message); }
"#)]
extern "C" {
    #[wasm_bindgen(js_name = jsCacheOpen)]
    fn js_cache_open(cache_name: &str) -> Promise;
    #[wasm_bindgen(js_name = jsCacheNames)]
    fn js_cache_names() -> Promise;
    #[wasm_bindgen(js_name = jsCacheDelete)]
    fn js_cache_delete(cache_name: &str) -> Promise;
    #[wasm_bindgen(js_name = jsCachePut)]
    fn js_cache_put(
        cache_name: &str,
        req_head: JsValue,
        req_body: JsValue,
        res_head: JsValue,
        res_body: JsValue,
    ) -> Promise;
    #[wasm_bindgen(js_name = jsCacheMatch)]
    fn js_cache_match(req_head: JsValue, req_body: JsValue) -> Promise;

    #[wasm_bindgen(js_name = jsSubmissionsOpen)]
    fn js_submissions_open() -> Promise;
    #[wasm_bindgen(js_name = jsSubmissionsAdd)]
    fn js_submissions_add(data: &str, script_url: &str) -> Promise;
    #[wasm_bindgen(js_name = jsSubmissionsPending)]
    fn js_submissions_pending() -> Promise;
    #[wasm_bindgen(js_name = jsSubmissionsGet)]
    fn js_submissions_get(id: f64) -> Promise;
    #[wasm_bindgen(js_name = jsSubmissionsMarkSynced)]
    fn js_submissions_mark_synced(id: f64) -> Promise;

    #[wasm_bindgen(js_name = jsNetworkFetch)]
    fn js_network_fetch(req_head: JsValue, req_body: JsValue) -> Promise;

    #[wasm_bindgen(js_name = jsClientsSkipWaiting)]
    fn js_clients_skip_waiting() -> Promise;
    #[wasm_bindgen(js_name = jsClientsClaim)]
    fn js_clients_claim() -> Promise;
    #[wasm_bindgen(js_name = jsClientsBroadcast)]
    fn js_clients_broadcast(message: JsValue) -> Promise;
}

async fn await_promise(promise: Promise) -> Result<JsValue, String> {
    JsFuture::from(promise).await.map_err(js_error_to_string)
}

fn js_error_to_string(err: JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    if let Ok(message) = js_sys::Reflect::get(&err, &JsValue::from_str("message")) {
        if let Some(text) = message.as_string() {
            return text;
        }
    }
    format!("{err:?}")
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, String> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| e.to_string())
}

fn bytes_to_js(bytes: Option<&[u8]>) -> JsValue {
    bytes.map_or(JsValue::NULL, |bytes| Uint8Array::from(bytes).into())
}

fn response_from_js(value: JsValue) -> Result<WorkerResponse, String> {
    let pair = Array::from(&value);
    let head: ResponseHead = from_value(pair.get(0)).map_err(|e| e.to_string())?;
    Ok(head.with_body(Uint8Array::new(&pair.get(1)).to_vec()))
}

async fn promise_to_json<T: DeserializeOwned>(promise: Promise) -> Result<T, String> {
    let value = await_promise(promise).await?;
    from_value(value).map_err(|e| e.to_string())
}

async fn promise_to_optional_json<T: DeserializeOwned>(
    promise: Promise,
) -> Result<Option<T>, String> {
    let value = await_promise(promise).await?;
    if value.is_null() || value.is_undefined() {
        Ok(None)
    } else {
        from_value(value).map(Some).map_err(|e| e.to_string())
    }
}

pub async fn cache_open(cache_name: &str) -> Result<(), String> {
    let _ = await_promise(js_cache_open(cache_name)).await?;
    Ok(())
}

pub async fn cache_names() -> Result<Vec<String>, String> {
    promise_to_json(js_cache_names()).await
}

pub async fn cache_delete(cache_name: &str) -> Result<bool, String> {
    let value = await_promise(js_cache_delete(cache_name)).await?;
    Ok(value.as_bool().unwrap_or(false))
}

pub async fn cache_put(
    cache_name: &str,
    request: &WorkerRequest,
    response: &WorkerResponse,
) -> Result<(), String> {
    let promise = js_cache_put(
        cache_name,
        to_js(&RequestHead::of(request))?,
        bytes_to_js(request.body.as_deref()),
        to_js(&ResponseHead::of(response))?,
        bytes_to_js(response.wire_body()),
    );
    let _ = await_promise(promise).await?;
    Ok(())
}

pub async fn cache_match(request: &WorkerRequest) -> Result<Option<WorkerResponse>, String> {
    let value = await_promise(js_cache_match(
        to_js(&RequestHead::of(request))?,
        bytes_to_js(request.body.as_deref()),
    ))
    .await?;
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }
    response_from_js(value).map(Some)
}

pub async fn submissions_open() -> Result<(), String> {
    let _ = await_promise(js_submissions_open()).await?;
    Ok(())
}

pub async fn submissions_add(data: &str, script_url: &str) -> Result<u64, String> {
    let key = await_promise(js_submissions_add(data, script_url)).await?;
    key.as_f64()
        .map(|id| id as u64)
        .ok_or_else(|| "IndexedDB returned a non-numeric submission key".to_string())
}

pub async fn submissions_pending() -> Result<Vec<PendingSubmission>, String> {
    promise_to_json(js_submissions_pending()).await
}

pub async fn submissions_get(id: u64) -> Result<Option<PendingSubmission>, String> {
    promise_to_optional_json(js_submissions_get(id as f64)).await
}

pub async fn submissions_mark_synced(id: u64) -> Result<(), String> {
    let _ = await_promise(js_submissions_mark_synced(id as f64)).await?;
    Ok(())
}

pub async fn network_fetch(request: &WorkerRequest) -> Result<WorkerResponse, String> {
    let value = await_promise(js_network_fetch(
        to_js(&RequestHead::of(request))?,
        bytes_to_js(request.body.as_deref()),
    ))
    .await?;
    response_from_js(value)
}

pub async fn clients_skip_waiting() -> Result<(), String> {
    let _ = await_promise(js_clients_skip_waiting()).await?;
    Ok(())
}

pub async fn clients_claim() -> Result<(), String> {
    let _ = await_promise(js_clients_claim()).await?;
    Ok(())
}

pub async fn clients_broadcast(message: &ClientMessage) -> Result<usize, String> {
    let count = await_promise(js_clients_broadcast(to_js(message)?)).await?;
    Ok(count.as_f64().unwrap_or(0.0) as usize)
}
