//! Core domain types
//!
//! Records returned by the course-management backend. They are plain
//! structures; the backend owns persistence and validation.

pub mod course;
pub mod discussion;
pub mod enrollment;
