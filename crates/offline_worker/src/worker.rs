//! The offline proxy worker: lifecycle-gated handlers over an injected host-service bundle.

use std::cell::Cell;

use worker_host::{WorkerHostServices, WorkerRequest};

use crate::{
    background_sync::{enqueue_submission, sync_pending_submissions, SyncReport},
    cache_first::{respond_cache_first, FetchOutcome},
    generations::{prune_generations, seed_generation, SeedOutcome},
    lifecycle::{self, LifecycleEvent, WorkerPhase},
    scope::{InterceptDecision, PassThroughReason, WorkerScope},
    WorkerConfig, WorkerError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Host event delivered to [`OfflineWorker::dispatch`].
pub enum WorkerEvent {
    /// `install`
    Install,
    /// `activate`
    Activate,
    /// `fetch` for one request.
    Fetch(WorkerRequest),
    /// `sync` with its registration tag.
    Sync {
        /// Tag the page registered the sync under.
        tag: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of one dispatched event.
pub enum WorkerEventOutcome {
    /// Install finished.
    Installed(SeedOutcome),
    /// Activate finished.
    Activated {
        /// Stale generations removed.
        deleted_generations: Vec<String>,
    },
    /// Fetch routing and, when intercepted, the response.
    Fetch(FetchOutcome),
    /// Sync finished; `None` when the tag is not the worker's.
    Synced(Option<SyncReport>),
}

/// Offline proxy worker instance.
///
/// One instance lives per evaluated worker script. Handlers run to completion on the host's
/// single-threaded event loop.
pub struct OfflineWorker {
    config: WorkerConfig,
    scope: WorkerScope,
    seed_requests: Vec<WorkerRequest>,
    fallback_request: WorkerRequest,
    services: WorkerHostServices,
    phase: Cell<WorkerPhase>,
}

impl OfflineWorker {
    /// Creates a worker for `origin` with a validated `config`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Config`] when the config or origin is invalid.
    pub fn new(
        config: WorkerConfig,
        origin: &str,
        services: WorkerHostServices,
    ) -> Result<Self, WorkerError> {
        config.validate()?;
        let scope = WorkerScope::new(origin, &config)?;
        let seed_requests = config
            .seed_paths
            .iter()
            .map(|path| scope.resolve(path).map(WorkerRequest::get))
            .collect::<Result<Vec<_>, _>>()?;
        let fallback_request = WorkerRequest::get(scope.resolve(&config.offline_fallback_path)?);
        Ok(Self {
            config,
            scope,
            seed_requests,
            fallback_request,
            services,
            phase: Cell::new(WorkerPhase::Parsed),
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Returns the origin scope.
    pub fn scope(&self) -> &WorkerScope {
        &self.scope
    }

    /// Returns the current lifecycle phase.
    pub fn phase(&self) -> WorkerPhase {
        self.phase.get()
    }

    /// Marks a freshly evaluated instance as activated.
    ///
    /// The host re-evaluates the script of an already-active registration after terminating it,
    /// and then delivers fetch/sync events without repeating install/activate.
    pub fn resume_activated(&self) {
        if self.phase.get() == WorkerPhase::Parsed {
            log::debug!("resuming already-active registration");
            self.phase.set(WorkerPhase::Activated);
        }
    }

    /// Handles `install`: seeds the current generation, then skips the waiting phase.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Cache`] when the current generation cannot be opened. Seeding
    /// failures are not errors.
    pub async fn install(&self) -> Result<SeedOutcome, WorkerError> {
        lifecycle::admit(self.phase.get(), LifecycleEvent::Install)?;
        let outcome = seed_generation(
            self.services.cache.as_ref(),
            self.services.network.as_ref(),
            &self.config.cache_name,
            &self.seed_requests,
        )
        .await?;
        if let Err(err) = self.services.clients.skip_waiting().await {
            log::warn!("skip waiting failed: {err}");
        }
        self.complete(LifecycleEvent::Install);
        Ok(outcome)
    }

    /// Handles `activate`: deletes every other generation, then claims open pages.
    ///
    /// A freshly evaluated instance may receive `activate` after the host stopped the one that
    /// ran `install`; its install result lives in the cache, so it activates from `Parsed` too.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Cache`] when generations cannot be listed or deleted.
    pub async fn activate(&self) -> Result<Vec<String>, WorkerError> {
        if self.phase.get() == WorkerPhase::Parsed {
            log::debug!("activating an instance that did not run install");
            self.phase.set(WorkerPhase::Installed);
        }
        lifecycle::admit(self.phase.get(), LifecycleEvent::Activate)?;
        let deleted =
            prune_generations(self.services.cache.as_ref(), &self.config.cache_name).await?;
        if let Err(err) = self.services.clients.claim().await {
            log::warn!("claiming clients failed: {err}");
        }
        self.complete(LifecycleEvent::Activate);
        Ok(deleted)
    }

    /// Decides whether a fetch event is answered by the worker.
    pub fn classify(&self, request: &WorkerRequest) -> InterceptDecision {
        if lifecycle::admit(self.phase.get(), LifecycleEvent::Fetch).is_err() {
            return InterceptDecision::PassThrough(PassThroughReason::NotActivated);
        }
        self.scope.classify(request)
    }

    /// Handles `fetch`.
    pub async fn handle_fetch(&self, request: &WorkerRequest) -> FetchOutcome {
        match self.classify(request) {
            InterceptDecision::PassThrough(reason) => {
                log::debug!("passing {} {} through: {reason:?}", request.method, request.url);
                FetchOutcome::PassThrough(reason)
            }
            InterceptDecision::Intercept => FetchOutcome::Respond(
                respond_cache_first(
                    self.services.cache.as_ref(),
                    self.services.network.as_ref(),
                    &self.config.cache_name,
                    &self.fallback_request,
                    request,
                )
                .await,
            ),
        }
    }

    /// Handles `sync`. Tags other than the configured one are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError`] when the whole run fails; the host may retry the event later.
    pub async fn handle_sync(&self, tag: &str) -> Result<Option<SyncReport>, WorkerError> {
        if tag != self.config.sync_tag {
            log::debug!("ignoring sync tag {tag}");
            return Ok(None);
        }
        lifecycle::admit(self.phase.get(), LifecycleEvent::Sync)?;
        match sync_pending_submissions(
            self.services.submissions.as_ref(),
            self.services.network.as_ref(),
            self.services.clients.as_ref(),
        )
        .await
        {
            Ok(report) => Ok(Some(report)),
            Err(err) => {
                log::error!("sync failed: {err}");
                Err(err)
            }
        }
    }

    /// Queues a submission in the worker's store for the next sync run.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Store`] when the store rejects the write.
    pub async fn enqueue(&self, data: &str, script_url: &str) -> Result<u64, WorkerError> {
        enqueue_submission(self.services.submissions.as_ref(), data, script_url).await
    }

    /// Routes one host event to its handler.
    ///
    /// # Errors
    ///
    /// Propagates the handler's [`WorkerError`]; fetch events never fail.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<WorkerEventOutcome, WorkerError> {
        match event {
            WorkerEvent::Install => self.install().await.map(WorkerEventOutcome::Installed),
            WorkerEvent::Activate => self.activate().await.map(|deleted_generations| {
                WorkerEventOutcome::Activated {
                    deleted_generations,
                }
            }),
            WorkerEvent::Fetch(request) => {
                Ok(WorkerEventOutcome::Fetch(self.handle_fetch(&request).await))
            }
            WorkerEvent::Sync { tag } => self.handle_sync(&tag).await.map(WorkerEventOutcome::Synced),
        }
    }

    fn complete(&self, event: LifecycleEvent) {
        let next = lifecycle::completed(self.phase.get(), event);
        if next != self.phase.get() {
            log::info!("worker {} -> {next}", self.phase.get());
        }
        self.phase.set(next);
    }
}
