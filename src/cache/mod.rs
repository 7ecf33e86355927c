//! Read-through cache for the two hot public lists.
//!
//! The full menu and the category list are cached in dedicated typed slots
//! with a long TTL. Any menu or category write evicts both slots, and a
//! background sweeper drops expired entries.
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 604800
//! sweep_interval_seconds = 600
//! ```

mod config;
mod lock;
mod store;
mod sweeper;

pub use config::CacheConfig;
pub use store::{Generation, ReadCache};
pub use sweeper::spawn_sweeper;
