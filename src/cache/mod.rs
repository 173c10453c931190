pub mod disk;
pub mod memory;

pub use disk::{clear_cache, get_cache_path, DiskCache};
pub use memory::MemoryCache;

use std::time::Duration;

/// A key-value store with per-entry time-to-live.
///
/// Expiry is lazy: an expired entry is dropped when it is next read.
/// Implementations never fail loudly; a broken cache behaves like an
/// empty one.
pub trait Cache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;
    fn set(&self, key: &str, value: V, ttl: Duration);
    fn clear(&self);
}
