//! Enrollment domain types

use serde::{Deserialize, Serialize};

/// A learner's enrollment in a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub course_id: i64,
    pub status: EnrollmentStatus,
    pub enrolled_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Completed lesson ids
    #[serde(default)]
    pub completed_lessons: Vec<i64>,
}

impl Enrollment {
    /// Fraction of `total_lessons` completed, in `0.0..=1.0`
    pub fn progress(&self, total_lessons: usize) -> f32 {
        if total_lessons == 0 {
            return 0.0;
        }
        (self.completed_lessons.len() as f32 / total_lessons as f32).min(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    NotEnrolled,
    Pending,
    Active,
    Completed,
}
