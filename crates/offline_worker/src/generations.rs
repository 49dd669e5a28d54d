//! Cache-generation seeding (install) and pruning (activate).

use worker_host::{cache_add_all_with, NetworkTransport, ResponseCache, WorkerRequest};

use crate::WorkerError;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of populating the current generation at install.
pub enum SeedOutcome {
    /// Every seed path was fetched and stored.
    Seeded {
        /// Number of entries written.
        entries: usize,
    },
    /// Population failed; the generation exists but holds none of the seed entries.
    Incomplete {
        /// Failure message from the cache or network.
        reason: String,
    },
}

/// Opens `cache_name` and fills it with `seed_requests`.
///
/// Population failures are logged and reported as [`SeedOutcome::Incomplete`].
///
/// # Errors
///
/// Returns [`WorkerError::Cache`] only when the generation itself cannot be opened.
pub async fn seed_generation(
    cache: &dyn ResponseCache,
    network: &dyn NetworkTransport,
    cache_name: &str,
    seed_requests: &[WorkerRequest],
) -> Result<SeedOutcome, WorkerError> {
    cache.open(cache_name).await.map_err(WorkerError::Cache)?;
    match cache_add_all_with(cache, network, cache_name, seed_requests).await {
        Ok(()) => {
            log::info!(
                "cache {cache_name} seeded with {} entries",
                seed_requests.len()
            );
            Ok(SeedOutcome::Seeded {
                entries: seed_requests.len(),
            })
        }
        Err(reason) => {
            log::warn!("cache {cache_name} seeding failed: {reason}");
            Ok(SeedOutcome::Incomplete { reason })
        }
    }
}

/// Deletes every cache generation except `current`; returns the deleted names.
///
/// # Errors
///
/// Returns [`WorkerError::Cache`] when the generations cannot be listed or one cannot be deleted.
pub async fn prune_generations(
    cache: &dyn ResponseCache,
    current: &str,
) -> Result<Vec<String>, WorkerError> {
    let names = cache.cache_names().await.map_err(WorkerError::Cache)?;
    let mut deleted = Vec::new();
    for name in names.into_iter().filter(|name| name != current) {
        cache.delete_cache(&name).await.map_err(WorkerError::Cache)?;
        log::info!("deleted stale cache generation {name}");
        deleted.push(name);
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use worker_host::{MemoryNetworkTransport, MemoryResponseCache, WorkerResponse};

    use super::*;

    #[test]
    fn seeding_stores_every_path() {
        let cache = MemoryResponseCache::default();
        let network = MemoryNetworkTransport::default();
        network.respond("https://app.example/", WorkerResponse::new(200, "root"));
        network.respond("https://app.example/index.html", WorkerResponse::new(200, "index"));

        let outcome = block_on(seed_generation(
            &cache,
            &network,
            "gen-2",
            &[
                WorkerRequest::get("https://app.example/"),
                WorkerRequest::get("https://app.example/index.html"),
            ],
        ))
        .expect("seed");

        assert_eq!(outcome, SeedOutcome::Seeded { entries: 2 });
        assert_eq!(cache.entry_count("gen-2"), Some(2));
    }

    #[test]
    fn seeding_failure_is_swallowed_and_leaves_empty_generation() {
        let cache = MemoryResponseCache::default();
        let network = MemoryNetworkTransport::default();

        let outcome = block_on(seed_generation(
            &cache,
            &network,
            "gen-2",
            &[WorkerRequest::get("https://app.example/")],
        ))
        .expect("seed failure is not an error");

        assert!(matches!(outcome, SeedOutcome::Incomplete { .. }));
        assert_eq!(cache.entry_count("gen-2"), Some(0));
    }

    #[test]
    fn prune_keeps_only_current_generation() {
        let cache = MemoryResponseCache::default();
        for name in ["qrscout-v2", "qrscout-v4", "other"] {
            block_on(cache.open(name)).expect("open");
        }

        let deleted = block_on(prune_generations(&cache, "qrscout-v4")).expect("prune");

        assert_eq!(deleted, vec!["qrscout-v2".to_string(), "other".to_string()]);
        assert_eq!(
            block_on(cache.cache_names()).expect("names"),
            vec!["qrscout-v4".to_string()]
        );
    }
}
