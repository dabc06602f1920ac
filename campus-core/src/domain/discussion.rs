//! Discussion board domain types

use serde::{Deserialize, Serialize};

/// A post on a lesson's discussion board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub lesson_id: i64,
    pub author: String,
    pub body: String,
    /// Parent comment for threaded replies
    pub parent_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
