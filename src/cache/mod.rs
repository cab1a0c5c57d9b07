//! Gallery snapshot cache.
//!
//! Holds one timestamped snapshot per collection in process memory. Entries
//! are replaced wholesale on refresh and cleared by mutations; there is no
//! partial update.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! stale_after_seconds = 30
//! ```

mod config;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use keys::CollectionKey;
pub use store::{CacheEntry, CacheStore};
