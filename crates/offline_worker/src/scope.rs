//! Origin scope and the interception policy for fetch events.

use url::{Origin, Url};
use worker_host::{HttpMethod, WorkerRequest};

use crate::{WorkerConfig, WorkerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Why a fetch event is left to the network untouched.
pub enum PassThroughReason {
    /// Only `GET` is intercepted.
    NonGetMethod,
    /// The URL does not parse.
    InvalidUrl,
    /// The host is neither the worker's own, a local host, nor a public-pages domain.
    ExternalHost,
    /// The host is recognized but the origin (scheme, host, port) differs from the worker's.
    CrossOrigin,
    /// The worker is not activated yet.
    NotActivated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Routing decision for one fetch event.
pub enum InterceptDecision {
    /// Answer the request from the cache-first pipeline.
    Intercept,
    /// Let the host fetch the request itself.
    PassThrough(PassThroughReason),
}

impl InterceptDecision {
    /// Returns whether the worker answers the request.
    pub fn is_intercept(self) -> bool {
        matches!(self, Self::Intercept)
    }
}

#[derive(Debug, Clone)]
/// Origin the worker controls plus the hosts it recognizes as first-party.
pub struct WorkerScope {
    base: Url,
    origin: Origin,
    local_hosts: Vec<String>,
    public_pages_domains: Vec<String>,
}

impl WorkerScope {
    /// Builds the scope for a worker served from `origin` (for example `https://team.github.io`).
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Config`] when `origin` is not an absolute URL with a host.
    pub fn new(origin: &str, config: &WorkerConfig) -> Result<Self, WorkerError> {
        let base = Url::parse(origin)
            .map_err(|e| WorkerError::Config(format!("invalid worker origin `{origin}`: {e}")))?;
        if base.host_str().is_none() {
            return Err(WorkerError::Config(format!(
                "worker origin `{origin}` has no host"
            )));
        }
        Ok(Self {
            origin: base.origin(),
            base,
            local_hosts: config
                .local_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            public_pages_domains: config
                .public_pages_domains
                .iter()
                .map(|d| d.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        })
    }

    /// Returns the worker origin serialized as `scheme://host[:port]`.
    pub fn origin(&self) -> String {
        self.origin.ascii_serialization()
    }

    /// Resolves a root-relative path against the worker origin.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Config`] when the path cannot be joined.
    pub fn resolve(&self, path: &str) -> Result<String, WorkerError> {
        self.base
            .join(path)
            .map(|url| url.to_string())
            .map_err(|e| WorkerError::Config(format!("cannot resolve `{path}`: {e}")))
    }

    /// Decides whether the worker answers `request`.
    pub fn classify(&self, request: &WorkerRequest) -> InterceptDecision {
        if request.method != HttpMethod::Get {
            return InterceptDecision::PassThrough(PassThroughReason::NonGetMethod);
        }
        let Ok(url) = request.parsed_url() else {
            return InterceptDecision::PassThrough(PassThroughReason::InvalidUrl);
        };
        let Some(host) = url.host_str() else {
            return InterceptDecision::PassThrough(PassThroughReason::InvalidUrl);
        };
        if !self.is_recognized_host(host) {
            return InterceptDecision::PassThrough(PassThroughReason::ExternalHost);
        }
        if url.origin() != self.origin {
            return InterceptDecision::PassThrough(PassThroughReason::CrossOrigin);
        }
        InterceptDecision::Intercept
    }

    fn is_recognized_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        if self.base.host_str() == Some(host.as_str()) {
            return true;
        }
        if self.local_hosts.iter().any(|local| *local == host) {
            return true;
        }
        self.public_pages_domains
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn scope(origin: &str) -> WorkerScope {
        WorkerScope::new(origin, &WorkerConfig::default()).expect("scope")
    }

    #[test]
    fn same_origin_get_is_intercepted() {
        let scope = scope("https://team.github.io");
        assert_eq!(
            scope.classify(&WorkerRequest::get("https://team.github.io/app.js")),
            InterceptDecision::Intercept
        );
    }

    #[test]
    fn non_get_methods_pass_through() {
        let scope = scope("https://team.github.io");
        let post = WorkerRequest::form_post("https://team.github.io/submit", &[("data", "x")]);
        assert_eq!(
            scope.classify(&post),
            InterceptDecision::PassThrough(PassThroughReason::NonGetMethod)
        );
    }

    #[test]
    fn external_hosts_pass_through() {
        let scope = scope("https://team.github.io");
        assert_eq!(
            scope.classify(&WorkerRequest::get("https://script.google.com/macros/s/x/exec")),
            InterceptDecision::PassThrough(PassThroughReason::ExternalHost)
        );
        assert_eq!(
            scope.classify(&WorkerRequest::get("https://notgithub.io.evil.example/")),
            InterceptDecision::PassThrough(PassThroughReason::ExternalHost)
        );
    }

    #[test]
    fn recognized_hosts_on_another_origin_are_not_answered() {
        let scope = scope("http://localhost:5173");
        assert_eq!(
            scope.classify(&WorkerRequest::get("http://localhost:3000/api")),
            InterceptDecision::PassThrough(PassThroughReason::CrossOrigin)
        );
        assert_eq!(
            scope.classify(&WorkerRequest::get("https://other.github.io/")),
            InterceptDecision::PassThrough(PassThroughReason::CrossOrigin)
        );
        assert_eq!(
            scope.classify(&WorkerRequest::get("http://localhost:5173/index.html")),
            InterceptDecision::Intercept
        );
    }

    #[test]
    fn unparseable_urls_pass_through() {
        let scope = scope("https://team.github.io");
        assert_eq!(
            scope.classify(&WorkerRequest::get("/relative")),
            InterceptDecision::PassThrough(PassThroughReason::InvalidUrl)
        );
    }

    #[test]
    fn resolve_joins_against_origin() {
        let scope = scope("https://team.github.io");
        assert_eq!(
            scope.resolve("/index.html").expect("resolve"),
            "https://team.github.io/index.html"
        );
        assert_eq!(scope.origin(), "https://team.github.io");
    }

    #[test]
    fn origin_without_host_is_rejected() {
        assert!(WorkerScope::new("data:text/plain,hi", &WorkerConfig::default()).is_err());
    }
}
