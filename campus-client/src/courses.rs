//! Course catalog endpoints

use crate::CampusClient;
use crate::error::Result;
use crate::resource::Resource;
use campus_core::domain::course::{Course, Lesson};

impl CampusClient {
    /// List all published courses
    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        self.get_json(&Resource::Courses.path()).await
    }

    /// Get a course by ID
    pub async fn get_course(&self, course_id: i64) -> Result<Course> {
        self.get_json(&Resource::Course { course_id }.path()).await
    }

    /// List the lessons of a course, in outline order
    pub async fn list_lessons(&self, course_id: i64) -> Result<Vec<Lesson>> {
        let mut lessons: Vec<Lesson> = self.get_json(&Resource::Lessons { course_id }.path()).await?;
        lessons.sort_by_key(|lesson| lesson.position);
        Ok(lessons)
    }

    /// Get a single lesson
    pub async fn get_lesson(&self, course_id: i64, lesson_id: i64) -> Result<Lesson> {
        self.get_json(
            &Resource::Lesson {
                course_id,
                lesson_id,
            }
            .path(),
        )
        .await
    }
}
