//! Response-cache contracts and lightweight test adapters.

mod response_cache;

pub use response_cache::{
    cache_add_all_with, MemoryResponseCache, NoopResponseCache, ResponseCache,
    ResponseCacheFuture,
};
