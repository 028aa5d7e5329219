use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{StaffMember, Task, TaskDraft, TaskId, TaskPatch};

#[derive(Error, Debug, Clone)]
pub enum RepositoryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// One server page of a singly-paginated feed.
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub items: Vec<Task>,
    pub page: u32,
    pub total_pages: u32,
}

impl TaskPage {
    pub fn has_more(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

/// One sub-feed slice of the combined by-date payload.
#[derive(Debug, Clone)]
pub struct SubFeedPage {
    pub items: Vec<Task>,
    pub page: u32,
    pub has_more: bool,
}

/// Combined response for the date-scoped view: the caller's own tasks and
/// everyone else's, each with its own page cursor.
#[derive(Debug, Clone)]
pub struct DatePage {
    pub user_tasks: SubFeedPage,
    pub other_tasks: SubFeedPage,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn user_tasks(&self, page: u32, size: u32) -> RepositoryResult<TaskPage>;

    async fn others_incoming(
        &self,
        date: NaiveDate,
        page: u32,
        size: u32,
    ) -> RepositoryResult<TaskPage>;

    async fn history(&self, page: u32, size: u32) -> RepositoryResult<TaskPage>;

    async fn by_date_detailed(
        &self,
        date: NaiveDate,
        user_page: u32,
        other_page: u32,
        size: u32,
    ) -> RepositoryResult<DatePage>;

    async fn by_date(&self, date: NaiveDate) -> RepositoryResult<Vec<Task>>;

    async fn calendar(&self, start: NaiveDate, end: NaiveDate) -> RepositoryResult<Vec<Task>>;

    async fn assign(&self, draft: &TaskDraft) -> RepositoryResult<Task>;

    async fn get_task(&self, id: TaskId) -> RepositoryResult<Task>;

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepositoryResult<Task>;

    async fn delete_task(&self, id: TaskId) -> RepositoryResult<()>;

    async fn staff(&self) -> RepositoryResult<Vec<StaffMember>>;
}
