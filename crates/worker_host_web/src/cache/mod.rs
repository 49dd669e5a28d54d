//! Response-cache adapters.

pub mod cache_storage;
