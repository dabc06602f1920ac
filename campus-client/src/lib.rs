//! Campus HTTP Client
//!
//! A small, type-safe HTTP client for the Campus course-management REST API.
//!
//! Besides the typed endpoints, the client can resolve a [`QueryKey`] into a
//! [`Resource`] and fetch it as raw JSON, which is what the query cache uses
//! to refresh an invalidated entry.
//!
//! # Example
//!
//! ```no_run
//! use campus_client::CampusClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), campus_client::ClientError> {
//!     let client = CampusClient::new("http://localhost:3000");
//!
//!     for course in client.list_courses().await? {
//!         println!("{}: {}", course.id, course.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`QueryKey`]: campus_core::QueryKey

mod courses;
mod discussions;
mod enrollments;
pub mod error;
pub mod resource;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use resource::Resource;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP client for the Campus API
///
/// Endpoints are organized into logical groups:
/// - Course catalog and lesson outlines
/// - Enrollment status
/// - Lesson discussion boards
#[derive(Debug, Clone)]
pub struct CampusClient {
    /// Base URL of the API (e.g., "http://localhost:3000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl CampusClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use campus_client::CampusClient;
    ///
    /// let client = CampusClient::new("http://localhost:3000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use campus_client::CampusClient;
    /// use reqwest::{Client, StatusCode};
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(10))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = CampusClient::with_client("http://localhost:3000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a resource through its typed endpoint and return it as JSON
    ///
    /// Payloads that do not decode into the resource's record type are
    /// reported as [`ClientError::ParseError`].
    pub async fn fetch_resource(&self, resource: &Resource) -> Result<serde_json::Value> {
        match *resource {
            Resource::Courses => to_value(self.list_courses().await?),
            Resource::Course { course_id } => to_value(self.get_course(course_id).await?),
            Resource::Lessons { course_id } => to_value(self.list_lessons(course_id).await?),
            Resource::Lesson {
                course_id,
                lesson_id,
            } => to_value(self.get_lesson(course_id, lesson_id).await?),
            Resource::Enrollment { course_id } => {
                to_value(self.get_enrollment(course_id).await?)
            }
            Resource::Comments { lesson_id } => to_value(self.list_comments(lesson_id).await?),
        }
    }

    // =============================================================================
    // Request Helpers
    // =============================================================================

    /// Issue a GET for an API path and deserialize the JSON body
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        self.handle_response(path, response).await
    }

    /// Handle an API response and deserialize JSON
    ///
    /// A 404 becomes [`ClientError::NotFound`] naming `path`. Other
    /// non-success statuses are turned into [`ClientError::ApiError`]
    /// carrying the response body as the message.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

fn to_value<T: serde::Serialize>(record: T) -> Result<serde_json::Value> {
    serde_json::to_value(record)
        .map_err(|e| ClientError::ParseError(format!("Failed to encode record: {}", e)))
}
