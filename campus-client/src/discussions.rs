//! Discussion board endpoints

use crate::CampusClient;
use crate::error::Result;
use crate::resource::Resource;
use campus_core::domain::discussion::Comment;

impl CampusClient {
    /// List the comments posted on a lesson, oldest first
    pub async fn list_comments(&self, lesson_id: i64) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> =
            self.get_json(&Resource::Comments { lesson_id }.path()).await?;
        comments.sort_by_key(|comment| comment.created_at);
        Ok(comments)
    }
}
