use chrono::NaiveDate;
use std::sync::Arc;

use super::{AppError, AppResult, FeedBoard};
use crate::adapters::cache::TaskCache;
use crate::domain::{
    build_calendar_index, month_window, CalendarIndex, StaffMember, Task, TaskDraft, TaskId,
    TaskPatch,
};
use crate::ports::TaskRepository;

/// Mutations plus the single-task detail path. List feeds live on the
/// `FeedBoard`; this service keeps them consistent after a delete.
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
    board: Arc<FeedBoard>,
    cache: TaskCache,
    current_username: String,
}

impl TaskService {
    pub fn new(
        repo: Arc<dyn TaskRepository>,
        board: Arc<FeedBoard>,
        cache: TaskCache,
        current_username: String,
    ) -> Self {
        Self {
            repo,
            board,
            cache,
            current_username,
        }
    }

    /// Create does not insert locally; callers refresh the affected feeds.
    pub async fn assign(&self, draft: &TaskDraft) -> AppResult<Task> {
        let task = self.repo.assign(draft).await?;
        Ok(task)
    }

    pub async fn get_task(&self, id: TaskId, use_cache: bool) -> AppResult<Task> {
        if use_cache {
            if let Some(task) = self.cache.get(id).await {
                return Ok(task);
            }
        }

        let task = self.repo.get_task(id).await?;
        self.cache.insert(task.clone()).await;
        Ok(task)
    }

    /// The server's echoed representation is authoritative; it replaces the
    /// cached copy rather than the optimistic local patch.
    pub async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> AppResult<Task> {
        let updated = self.repo.update_task(id, patch).await?;
        self.cache.insert(updated.clone()).await;
        Ok(updated)
    }

    /// On success the id is removed from every loaded feed without a
    /// refetch. The calendar index is built per fetch, so it picks the
    /// deletion up on its next build. On failure nothing local changes.
    pub async fn delete_task(&self, id: TaskId) -> AppResult<()> {
        self.repo.delete_task(id).await?;
        self.cache.remove(id).await;
        self.board.remove_task(id);
        Ok(())
    }

    /// Flat listing for one day (the original calendar's day modal).
    pub async fn tasks_on(&self, date: NaiveDate) -> AppResult<Vec<Task>> {
        Ok(self.repo.by_date(date).await?)
    }

    /// Month presence index for calendar highlighting.
    pub async fn calendar_index(&self, year: i32, month: u32) -> AppResult<CalendarIndex> {
        let (start, end) = month_window(year, month)
            .ok_or_else(|| AppError::Application(format!("invalid month: {year}-{month:02}")))?;
        let tasks = self.repo.calendar(start, end).await?;
        Ok(build_calendar_index(tasks, &self.current_username))
    }

    pub async fn staff(&self) -> AppResult<Vec<StaffMember>> {
        Ok(self.repo.staff().await?)
    }

    pub fn current_username(&self) -> &str {
        &self.current_username
    }
}
