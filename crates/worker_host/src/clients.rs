//! Client-registry contracts: worker activation control and page messaging.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use serde::{Deserialize, Serialize};

/// Object-safe boxed future used by [`ClientRegistry`] async methods.
pub type ClientRegistryFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
/// Message posted from the worker to open pages.
pub enum ClientMessage {
    /// A background-sync run finished.
    SyncComplete {
        /// Records acknowledged by the endpoint in this run.
        synced: u32,
        /// Records left queued in this run.
        failed: u32,
    },
}

/// Host registry of pages controlled by the worker.
pub trait ClientRegistry {
    /// Activates this worker without waiting for older instances to release their pages.
    fn skip_waiting<'a>(&'a self) -> ClientRegistryFuture<'a, Result<(), String>>;

    /// Takes control of every open page in scope.
    fn claim<'a>(&'a self) -> ClientRegistryFuture<'a, Result<(), String>>;

    /// Posts `message` to every open page; resolves to the number of recipients.
    fn broadcast<'a>(
        &'a self,
        message: &'a ClientMessage,
    ) -> ClientRegistryFuture<'a, Result<usize, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Registry with no pages attached.
pub struct NoopClientRegistry;

impl ClientRegistry for NoopClientRegistry {
    fn skip_waiting<'a>(&'a self) -> ClientRegistryFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn claim<'a>(&'a self) -> ClientRegistryFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn broadcast<'a>(
        &'a self,
        _message: &'a ClientMessage,
    ) -> ClientRegistryFuture<'a, Result<usize, String>> {
        Box::pin(async { Ok(0) })
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    open_pages: usize,
    skip_waiting_calls: usize,
    claimed: bool,
    inboxes: Vec<Vec<ClientMessage>>,
}

#[derive(Debug, Clone, Default)]
/// In-memory registry that records lifecycle calls and delivered messages per page.
pub struct MemoryClientRegistry {
    inner: Rc<RefCell<RegistryState>>,
}

impl MemoryClientRegistry {
    /// Creates a registry with `open_pages` pages attached.
    pub fn with_open_pages(open_pages: usize) -> Self {
        let registry = Self::default();
        {
            let mut state = registry.inner.borrow_mut();
            state.open_pages = open_pages;
            state.inboxes = vec![Vec::new(); open_pages];
        }
        registry
    }

    /// Returns how many times `skip_waiting` ran.
    pub fn skip_waiting_calls(&self) -> usize {
        self.inner.borrow().skip_waiting_calls
    }

    /// Returns whether `claim` ran.
    pub fn is_claimed(&self) -> bool {
        self.inner.borrow().claimed
    }

    /// Returns the messages delivered to page `index`.
    pub fn inbox(&self, index: usize) -> Vec<ClientMessage> {
        self.inner
            .borrow()
            .inboxes
            .get(index)
            .cloned()
            .unwrap_or_default()
    }
}

impl ClientRegistry for MemoryClientRegistry {
    fn skip_waiting<'a>(&'a self) -> ClientRegistryFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().skip_waiting_calls += 1;
            Ok(())
        })
    }

    fn claim<'a>(&'a self) -> ClientRegistryFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().claimed = true;
            Ok(())
        })
    }

    fn broadcast<'a>(
        &'a self,
        message: &'a ClientMessage,
    ) -> ClientRegistryFuture<'a, Result<usize, String>> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            for inbox in &mut state.inboxes {
                inbox.push(*message);
            }
            Ok(state.open_pages)
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn sync_complete_message_wire_shape() {
        let message = ClientMessage::SyncComplete {
            synced: 2,
            failed: 1,
        };
        assert_eq!(
            serde_json::to_value(message).expect("serialize"),
            json!({"type": "sync-complete", "synced": 2, "failed": 1})
        );
    }

    #[test]
    fn memory_registry_delivers_to_every_page() {
        let registry = MemoryClientRegistry::with_open_pages(2);
        let registry_obj: &dyn ClientRegistry = &registry;
        let message = ClientMessage::SyncComplete {
            synced: 0,
            failed: 0,
        };

        assert_eq!(block_on(registry_obj.broadcast(&message)).expect("broadcast"), 2);
        assert_eq!(registry.inbox(0), vec![message]);
        assert_eq!(registry.inbox(1), vec![message]);
        assert!(registry.inbox(2).is_empty());
    }

    #[test]
    fn memory_registry_records_lifecycle_calls() {
        let registry = MemoryClientRegistry::default();
        block_on(registry.skip_waiting()).expect("skip waiting");
        block_on(registry.claim()).expect("claim");
        assert_eq!(registry.skip_waiting_calls(), 1);
        assert!(registry.is_claimed());
    }
}
