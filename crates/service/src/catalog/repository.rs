use async_trait::async_trait;
use models::{course, user};
use uuid::Uuid;

use crate::errors::ServiceError;

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Active courses, newest first, for a 0-based page; also returns the active total.
    async fn list_active(&self, page_idx: u64, per_page: u64) -> Result<(Vec<course::Model>, u64), ServiceError>;
    /// Active courses matching `query`, best rank first.
    async fn search(&self, query: &str, limit: u64) -> Result<Vec<course::Model>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<course::Model>, ServiceError>;
    async fn create(&self, input: course::NewCourse) -> Result<course::Model, ServiceError>;
    async fn update(&self, id: Uuid, changes: course::CourseChanges) -> Result<course::Model, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
    async fn users_by_ids(&self, ids: Vec<Uuid>) -> Result<Vec<user::Model>, ServiceError>;
}
