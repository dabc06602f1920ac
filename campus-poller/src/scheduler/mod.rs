//! Scheduler layer
//!
//! Drives periodic invalidation of a cached query. The controller owns the
//! timer and the retry counter; the cache behind [`Invalidator`] owns the
//! data.

pub mod controller;
mod invalidator;

pub use controller::PollingController;
pub use invalidator::Invalidator;
