//! Query repository
//!
//! Loads the resource named by a query key from the Campus API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use campus_client::{CampusClient, ClientError, Resource};
use campus_core::QueryKey;

/// Repository trait for loading query data
#[async_trait]
pub trait QueryFetcher: Send + Sync {
    /// Fetches the current data for `key`
    ///
    /// # Arguments
    /// * `key` - The query key naming the resource
    async fn fetch(&self, key: &QueryKey) -> Result<serde_json::Value>;
}

/// HTTP implementation of QueryFetcher
pub struct HttpQueryFetcher {
    client: CampusClient,
}

impl HttpQueryFetcher {
    /// Creates a new HTTP query fetcher
    ///
    /// # Arguments
    /// * `client` - Client for the Campus API
    pub fn new(client: CampusClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueryFetcher for HttpQueryFetcher {
    async fn fetch(&self, key: &QueryKey) -> Result<serde_json::Value> {
        let resource = Resource::from_key(key)
            .with_context(|| format!("Failed to resolve query key '{}'", key))?;

        self.client
            .fetch_resource(&resource)
            .await
            .with_context(|| format!("Failed to fetch {}", resource.path()))
    }
}

/// Whether a fetch failed because the API has no resource behind the key
///
/// Retrying such a key never helps, unlike transport or server errors.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ClientError>()
        .is_some_and(ClientError::is_not_found)
}
