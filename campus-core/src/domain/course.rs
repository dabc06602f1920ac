//! Course and lesson domain types

use serde::{Deserialize, Serialize};

/// A published course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub instructor: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published: bool,
    pub rating: Option<f32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A lesson within a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    /// Position of the lesson in the course outline, starting at 1
    pub position: u32,
    pub video_url: Option<String>,
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub has_quiz: bool,
}
