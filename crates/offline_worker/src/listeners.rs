//! Service-worker listener glue appended to the generated `wasm-bindgen` bindings.
//!
//! Listeners must be registered synchronously during script evaluation, before the module is
//! instantiated, so each one waits on the shared `ready` promise. The module is loaded from the
//! current cache generation first, so a worker restarted while offline still boots; its path is
//! therefore added to the install seed list. Same-origin `GET` requests are claimed synchronously
//! and answered once the module is ready, falling back to the network if it never loads.

use crate::{WorkerConfig, WorkerError};

static PRELUDE_TEMPLATE: &str = r#"const WORKER_CACHE = 'CACHE_NAME';
const WORKER_WASM_URL = new URL('WASM_PATH', self.location.origin).href;
async function loadWorkerWasm() {
  try {
    const cached = await (await caches.open(WORKER_CACHE)).match(WORKER_WASM_URL);
    if (cached) {
      return cached;
    }
  } catch (err) {
    console.warn('worker module cache lookup failed', err);
  }
  return fetch(WORKER_WASM_URL);
}
const ready = __wbg_init({ module_or_path: loadWorkerWasm() }).then(() => worker_configure('CONFIG'));
function claimedByWorker(request) {
  return request.method === 'GET' && new URL(request.url).origin === self.location.origin;
}
"#;
static LISTENER_TEMPLATE: &str = "self.addEventListener('NAME', event => LISTENER);\n";
static WORKER_LISTENERS: [(&str, &str); 4] = [
    ("install", "event.waitUntil(ready.then(() => worker_install(event)))"),
    ("activate", "event.waitUntil(ready.then(() => worker_activate(event)))"),
    (
        "fetch",
        "{ if (claimedByWorker(event.request)) event.respondWith(ready.then(() => worker_fetch(event), () => fetch(event.request))); }",
    ),
    ("sync", "event.waitUntil(ready.then(() => worker_sync(event)))"),
];

/// Appends the module bootstrap and the `install`/`activate`/`fetch`/`sync` listeners to
/// `bindings`.
///
/// `wasm_path` is the root-relative URL the module is served from. It is added to the embedded
/// config's seed paths when missing.
///
/// # Errors
///
/// Returns [`WorkerError::Config`] when `wasm_path` is not root-relative or `config` is invalid.
pub fn append_worker_listeners(
    mut bindings: String,
    wasm_path: &str,
    config: &WorkerConfig,
) -> Result<String, WorkerError> {
    if !wasm_path.starts_with('/') {
        return Err(WorkerError::Config(format!(
            "module path `{wasm_path}` must start with `/`"
        )));
    }
    let mut config = config.clone();
    if !config.seed_paths.iter().any(|path| path == wasm_path) {
        config.seed_paths.push(wasm_path.to_string());
    }
    config.validate()?;
    let config_json =
        serde_json::to_string(&config).map_err(|e| WorkerError::Config(e.to_string()))?;

    bindings += PRELUDE_TEMPLATE
        .replace("CACHE_NAME", &escape_single_quoted(&config.cache_name))
        .replace("WASM_PATH", &escape_single_quoted(wasm_path))
        .replace("CONFIG", &escape_single_quoted(&config_json))
        .as_str();
    for (name, listener) in WORKER_LISTENERS {
        bindings += LISTENER_TEMPLATE
            .replace("NAME", name)
            .replace("LISTENER", listener)
            .as_str();
    }
    Ok(bindings)
}

fn escape_single_quoted(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const WASM: &str = "/offline_worker_bg.wasm";

    fn glue(config: &WorkerConfig) -> String {
        append_worker_listeners("// bindings\n".to_string(), WASM, config).expect("glue")
    }

    fn embedded_config(script: &str) -> WorkerConfig {
        let start = script.find("worker_configure('").expect("configure call") + 18;
        let end = start + script[start..].find("')").expect("closing quote");
        WorkerConfig::from_json(&script[start..end].replace("\\'", "'")).expect("embedded config")
    }

    #[test]
    fn every_handled_event_gets_one_listener() {
        let script = glue(&WorkerConfig::default());

        assert!(script.starts_with("// bindings\n"));
        for name in ["install", "activate", "fetch", "sync"] {
            let needle = format!("self.addEventListener('{name}'");
            assert_eq!(script.matches(&needle).count(), 1, "{name}");
        }
    }

    #[test]
    fn module_loads_from_current_generation_before_network() {
        let script = glue(&WorkerConfig::default());

        assert!(script.contains("const WORKER_CACHE = 'qrscout-v4';"));
        assert!(script.contains("new URL('/offline_worker_bg.wasm', self.location.origin)"));
        let cache_lookup = script.find("caches.open(WORKER_CACHE)").expect("cache lookup");
        let network = script.find("return fetch(WORKER_WASM_URL)").expect("network fallback");
        assert!(cache_lookup < network);
        assert!(script.contains("__wbg_init({ module_or_path: loadWorkerWasm() })"));
    }

    #[test]
    fn module_path_is_seeded_once_at_install() {
        let seeded = embedded_config(&glue(&WorkerConfig::default()));
        assert_eq!(
            seeded.seed_paths,
            vec!["/", "/index.html", "/manifest.json", WASM]
        );

        let already = WorkerConfig {
            seed_paths: vec!["/".to_string(), WASM.to_string()],
            ..WorkerConfig::default()
        };
        assert_eq!(embedded_config(&glue(&already)).seed_paths, already.seed_paths);
    }

    #[test]
    fn early_fetch_events_are_claimed_not_dropped() {
        let script = glue(&WorkerConfig::default());

        assert!(!script.contains("workerReady"));
        assert!(script.contains(
            "if (claimedByWorker(event.request)) event.respondWith(ready.then(() => worker_fetch(event), () => fetch(event.request)));"
        ));
        assert!(script.contains(
            "request.method === 'GET' && new URL(request.url).origin === self.location.origin"
        ));
    }

    #[test]
    fn embedded_config_is_quoted_safely() {
        let config = WorkerConfig {
            cache_name: "team's-cache".to_string(),
            ..WorkerConfig::default()
        };

        let script = glue(&config);

        assert!(script.contains("const WORKER_CACHE = 'team\\'s-cache';"));
        assert!(script.contains(r#""cache_name":"team\'s-cache""#));
        assert_eq!(embedded_config(&script).cache_name, "team's-cache");
    }

    #[test]
    fn relative_module_path_is_rejected() {
        assert!(matches!(
            append_worker_listeners(String::new(), "./sw.wasm", &WorkerConfig::default()),
            Err(WorkerError::Config(_))
        ));
    }
}
