//! Resource addressing
//!
//! Maps query keys onto API endpoints. The key layout follows the URL
//! layout, so `courses/42/lessons` is served by `GET /api/courses/42/lessons`.

use campus_core::{KeyPart, QueryKey};

use crate::error::{ClientError, Result};

/// An addressable API resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Courses,
    Course { course_id: i64 },
    Lessons { course_id: i64 },
    Lesson { course_id: i64, lesson_id: i64 },
    Enrollment { course_id: i64 },
    Comments { lesson_id: i64 },
}

/// Borrowed view of a key part, so keys can be matched with slice patterns
enum Segment<'a> {
    Text(&'a str),
    Id(i64),
}

impl Resource {
    /// Resolve a query key to the resource it names
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidRequest`] when the key does not name a
    /// known resource.
    pub fn from_key(key: &QueryKey) -> Result<Self> {
        let segments: Vec<Segment<'_>> = key
            .parts()
            .iter()
            .map(|part| match part {
                KeyPart::Text(s) => Segment::Text(s.as_str()),
                KeyPart::Number(n) => Segment::Id(*n),
            })
            .collect();

        let resource = match segments.as_slice() {
            [Segment::Text("courses")] => Self::Courses,
            [Segment::Text("courses"), Segment::Id(course_id)] => Self::Course {
                course_id: *course_id,
            },
            [Segment::Text("courses"), Segment::Id(course_id), Segment::Text("lessons")] => {
                Self::Lessons {
                    course_id: *course_id,
                }
            }
            [
                Segment::Text("courses"),
                Segment::Id(course_id),
                Segment::Text("lessons"),
                Segment::Id(lesson_id),
            ] => Self::Lesson {
                course_id: *course_id,
                lesson_id: *lesson_id,
            },
            [Segment::Text("courses"), Segment::Id(course_id), Segment::Text("enrollment")] => {
                Self::Enrollment {
                    course_id: *course_id,
                }
            }
            [Segment::Text("lessons"), Segment::Id(lesson_id), Segment::Text("comments")] => {
                Self::Comments {
                    lesson_id: *lesson_id,
                }
            }
            _ => {
                return Err(ClientError::InvalidRequest(format!(
                    "no resource for key '{}'",
                    key
                )));
            }
        };

        Ok(resource)
    }

    /// API path of this resource, relative to the base URL
    pub fn path(&self) -> String {
        match self {
            Self::Courses => "/api/courses".to_string(),
            Self::Course { course_id } => format!("/api/courses/{}", course_id),
            Self::Lessons { course_id } => format!("/api/courses/{}/lessons", course_id),
            Self::Lesson {
                course_id,
                lesson_id,
            } => format!("/api/courses/{}/lessons/{}", course_id, lesson_id),
            Self::Enrollment { course_id } => format!("/api/courses/{}/enrollment", course_id),
            Self::Comments { lesson_id } => format!("/api/lessons/{}/comments", lesson_id),
        }
    }
}
