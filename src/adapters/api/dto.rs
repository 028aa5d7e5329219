use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::{Task, TaskId, TaskPriority, TaskStatus};
use crate::ports::{DatePage, RepositoryError, SubFeedPage, TaskPage};

/// Error body the backend attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBodyDto {
    pub error: String,
}

/// Calendar dates usually arrive as ISO strings, but the calendar endpoint
/// can leak Java `LocalDate` objects when serialization is misconfigured.
/// Accept both.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum WireDate {
    Iso(NaiveDate),
    #[serde(rename_all = "camelCase")]
    Fields {
        year: i32,
        month_value: u32,
        day_of_month: u32,
    },
}

impl WireDate {
    fn resolve(self) -> Option<NaiveDate> {
        match self {
            WireDate::Iso(date) => Some(date),
            WireDate::Fields {
                year,
                month_value,
                day_of_month,
            } => NaiveDate::from_ymd_opt(year, month_value, day_of_month),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: i64,
    pub assigned_user: String,
    #[serde(default)]
    pub assigned_by: Option<String>,
    #[serde(default)]
    pub date: Option<WireDate>,
    #[serde(default)]
    pub due_date: Option<WireDate>,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
}

impl TryFrom<TaskDto> for Task {
    type Error = RepositoryError;

    fn try_from(dto: TaskDto) -> Result<Self, Self::Error> {
        // `date` is the primary field; older records only carry `dueDate`.
        let date = dto
            .date
            .or(dto.due_date)
            .and_then(WireDate::resolve)
            .ok_or_else(|| {
                RepositoryError::Serialization(format!("Task {} has no usable date", dto.id))
            })?;

        Ok(Self {
            id: TaskId(dto.id),
            assigned_user: dto.assigned_user,
            assigned_by: dto.assigned_by,
            date,
            description: dto.description,
            status: dto.status,
            priority: dto.priority,
        })
    }
}

pub fn into_tasks(dtos: Vec<TaskDto>) -> Result<Vec<Task>, RepositoryError> {
    dtos.into_iter().map(Task::try_from).collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDto {
    #[serde(default)]
    pub items: Vec<TaskDto>,
    pub page: u32,
    pub total_pages: u32,
}

impl TryFrom<PageDto> for TaskPage {
    type Error = RepositoryError;

    fn try_from(dto: PageDto) -> Result<Self, Self::Error> {
        Ok(Self {
            items: into_tasks(dto.items)?,
            page: dto.page,
            total_pages: dto.total_pages,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubFeedDto {
    #[serde(default)]
    pub items: Vec<TaskDto>,
    pub page: u32,
    pub has_more: bool,
}

impl TryFrom<SubFeedDto> for SubFeedPage {
    type Error = RepositoryError;

    fn try_from(dto: SubFeedDto) -> Result<Self, Self::Error> {
        Ok(Self {
            items: into_tasks(dto.items)?,
            page: dto.page,
            has_more: dto.has_more,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedDateDto {
    pub user_tasks: SubFeedDto,
    pub other_tasks: SubFeedDto,
}

impl TryFrom<DetailedDateDto> for DatePage {
    type Error = RepositoryError;

    fn try_from(dto: DetailedDateDto) -> Result<Self, Self::Error> {
        Ok(Self {
            user_tasks: dto.user_tasks.try_into()?,
            other_tasks: dto.other_tasks.try_into()?,
        })
    }
}
