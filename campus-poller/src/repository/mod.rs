//! Repository layer
//!
//! Repositories are stateless HTTP adapters that load the data behind a
//! query key. They hold no cache and no business logic.
//!
//! All repositories are trait-based to enable testing and mocking.

mod queries;

pub use queries::{HttpQueryFetcher, QueryFetcher, is_not_found};
