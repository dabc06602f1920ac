//! Cache invalidation capability

use async_trait::async_trait;
use campus_core::QueryKey;
use std::sync::Arc;

use crate::error::InvalidationFailure;

/// Marks a cached association as stale so its owner refreshes it
///
/// Implementations must resolve `Ok` on success and `Err` on any failure, and
/// must tolerate repeated calls with the same key.
#[async_trait]
pub trait Invalidator: Send + Sync {
    async fn invalidate(&self, key: &QueryKey) -> Result<(), InvalidationFailure>;
}

#[async_trait]
impl<T: Invalidator + ?Sized> Invalidator for Arc<T> {
    async fn invalidate(&self, key: &QueryKey) -> Result<(), InvalidationFailure> {
        (**self).invalidate(key).await
    }
}
