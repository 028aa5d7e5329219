use async_trait::async_trait;
use chrono::NaiveDate;

use super::dto::{into_tasks, DetailedDateDto, PageDto, TaskDto};
use super::ApiClient;
use crate::domain::{StaffMember, Task, TaskDraft, TaskId, TaskPatch};
use crate::ports::{DatePage, RepositoryResult, TaskPage, TaskRepository};

pub struct HttpTaskRepository {
    client: ApiClient,
}

impl HttpTaskRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn query_string(params: &[(&str, String)]) -> String {
        if params.is_empty() {
            return String::new();
        }

        format!(
            "?{}",
            params
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&")
        )
    }
}

#[async_trait]
impl TaskRepository for HttpTaskRepository {
    async fn user_tasks(&self, page: u32, size: u32) -> RepositoryResult<TaskPage> {
        let query = Self::query_string(&[("page", page.to_string()), ("size", size.to_string())]);
        let dto: PageDto = self.client.get(&format!("/tasks/user-tasks{query}")).await?;
        dto.try_into()
    }

    async fn others_incoming(
        &self,
        date: NaiveDate,
        page: u32,
        size: u32,
    ) -> RepositoryResult<TaskPage> {
        let query = Self::query_string(&[
            ("date", date.to_string()),
            ("page", page.to_string()),
            ("size", size.to_string()),
        ]);
        let dto: PageDto = self
            .client
            .get(&format!("/tasks/others-incoming{query}"))
            .await?;
        dto.try_into()
    }

    async fn history(&self, page: u32, size: u32) -> RepositoryResult<TaskPage> {
        let query = Self::query_string(&[("page", page.to_string()), ("size", size.to_string())]);
        let dto: PageDto = self.client.get(&format!("/tasks/history{query}")).await?;
        dto.try_into()
    }

    async fn by_date_detailed(
        &self,
        date: NaiveDate,
        user_page: u32,
        other_page: u32,
        size: u32,
    ) -> RepositoryResult<DatePage> {
        let query = Self::query_string(&[
            ("date", date.to_string()),
            ("userTasksPage", user_page.to_string()),
            ("otherTasksPage", other_page.to_string()),
            ("size", size.to_string()),
        ]);
        let dto: DetailedDateDto = self
            .client
            .get(&format!("/tasks/by-date-detailed{query}"))
            .await?;
        dto.try_into()
    }

    async fn by_date(&self, date: NaiveDate) -> RepositoryResult<Vec<Task>> {
        let query = Self::query_string(&[("date", date.to_string())]);
        let dtos: Vec<TaskDto> = self.client.get(&format!("/tasks/by-date{query}")).await?;
        into_tasks(dtos)
    }

    async fn calendar(&self, start: NaiveDate, end: NaiveDate) -> RepositoryResult<Vec<Task>> {
        let query = Self::query_string(&[
            ("startDate", start.to_string()),
            ("endDate", end.to_string()),
        ]);
        let dtos: Vec<TaskDto> = self.client.get(&format!("/tasks/calendar{query}")).await?;
        into_tasks(dtos)
    }

    async fn assign(&self, draft: &TaskDraft) -> RepositoryResult<Task> {
        let dto: TaskDto = self.client.post("/tasks/assign", draft).await?;
        dto.try_into()
    }

    async fn get_task(&self, id: TaskId) -> RepositoryResult<Task> {
        let dto: TaskDto = self.client.get(&format!("/tasks/{id}")).await?;
        dto.try_into()
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepositoryResult<Task> {
        let dto: TaskDto = self.client.put(&format!("/tasks/{id}"), patch).await?;
        dto.try_into()
    }

    async fn delete_task(&self, id: TaskId) -> RepositoryResult<()> {
        self.client.delete(&format!("/tasks/{id}")).await
    }

    async fn staff(&self) -> RepositoryResult<Vec<StaffMember>> {
        self.client.get("/tasks/staff").await
    }
}
