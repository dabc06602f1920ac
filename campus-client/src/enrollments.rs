//! Enrollment endpoints

use crate::CampusClient;
use crate::error::Result;
use crate::resource::Resource;
use campus_core::domain::enrollment::Enrollment;

impl CampusClient {
    /// Get the current learner's enrollment in a course
    pub async fn get_enrollment(&self, course_id: i64) -> Result<Enrollment> {
        self.get_json(&Resource::Enrollment { course_id }.path()).await
    }
}
