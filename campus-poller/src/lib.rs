//! Campus Poller
//!
//! Keeps a cached query fresh by periodically invalidating it, and gives up
//! quietly after a run of consecutive failures.
//!
//! Architecture:
//! - Configuration: settings from environment or defaults
//! - Repository: HTTP fetches of API resources named by query keys
//! - Cache: query cache that refetches entries when they are invalidated
//! - Scheduler: the polling controller driving invalidation on a timer

pub mod cache;
pub mod config;
pub mod error;
pub mod repository;
pub mod scheduler;

pub use cache::{CachedQuery, QueryCache};
pub use error::{InvalidationFailure, PollError};
pub use scheduler::{Invalidator, PollingController};
