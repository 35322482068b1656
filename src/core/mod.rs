//! # Core Module
//!
//! Shared primitives used throughout the terrain engine.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking.
//!   The chunk store and the mesh cache are each wrapped in one, which keeps the
//!   two caches independently guarded.
//! - `LruTtlCache`: Capacity-bounded cache with least-recently-used eviction and
//!   idle-time expiry, backing both caches.

pub mod lru_ttl_cache;
pub mod mt_resource;

pub use lru_ttl_cache::LruTtlCache;
pub use mt_resource::MtResource;
