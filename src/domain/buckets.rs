use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::Task;

/// Tasks sharing one calendar date, in the order the server returned them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateBucket {
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
}

/// Groups a flat task sequence into date buckets. Bucket order is the order
/// of first appearance of each distinct date, not chronological — the server
/// already decides the presentation order.
pub fn group_by_date(tasks: &[Task]) -> Vec<DateBucket> {
    let mut buckets: Vec<DateBucket> = Vec::new();
    for task in tasks {
        match buckets.iter_mut().find(|b| b.date == task.date) {
            Some(bucket) => bucket.tasks.push(task.clone()),
            None => buckets.push(DateBucket {
                date: task.date,
                tasks: vec![task.clone()],
            }),
        }
    }
    buckets
}

/// Per-day presence split used for calendar dot highlighting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayTasks {
    pub own: Vec<Task>,
    pub other: Vec<Task>,
}

impl DayTasks {
    pub fn has_any(&self) -> bool {
        !self.own.is_empty() || !self.other.is_empty()
    }
}

/// Date-keyed presence map for one calendar window. Built from the flat
/// calendar-range fetch; only used for highlight decisions, never for full
/// listings.
pub type CalendarIndex = BTreeMap<NaiveDate, DayTasks>;

pub fn build_calendar_index(tasks: Vec<Task>, current_username: &str) -> CalendarIndex {
    let mut index = CalendarIndex::new();
    for task in tasks {
        let day = index.entry(task.date).or_default();
        if task.is_assigned_to(current_username) {
            day.own.push(task);
        } else {
            day.other.push(task);
        }
    }
    index
}

/// First and last day of the given month, for the calendar range fetch.
/// Returns `None` for an out-of-range month number.
pub fn month_window(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_month.pred_opt()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskId, TaskPriority, TaskStatus};

    fn task(id: i64, user: &str, date: &str) -> Task {
        Task {
            id: TaskId(id),
            assigned_user: user.to_string(),
            assigned_by: None,
            date: date.parse().unwrap(),
            description: format!("task {id}"),
            status: TaskStatus::Pending,
            priority: TaskPriority::Low,
        }
    }

    #[test]
    fn buckets_follow_first_occurrence_order() {
        let tasks = vec![
            task(1, "a", "2024-01-02"),
            task(2, "b", "2024-01-01"),
            task(3, "c", "2024-01-02"),
        ];
        let buckets = group_by_date(&tasks);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].date, "2024-01-02".parse().unwrap());
        assert_eq!(
            buckets[0].tasks.iter().map(|t| t.id.0).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(buckets[1].date, "2024-01-01".parse().unwrap());
        assert_eq!(buckets[1].tasks[0].id.0, 2);
    }

    #[test]
    fn empty_input_yields_no_buckets() {
        assert!(group_by_date(&[]).is_empty());
    }

    #[test]
    fn calendar_index_splits_by_assignee() {
        let tasks = vec![
            task(1, "alice", "2024-03-05"),
            task(2, "bob", "2024-03-05"),
            task(3, "alice", "2024-03-07"),
        ];
        let index = build_calendar_index(tasks, "alice");

        let day = &index[&"2024-03-05".parse().unwrap()];
        assert_eq!(day.own.len(), 1);
        assert_eq!(day.own[0].id.0, 1);
        assert_eq!(day.other.len(), 1);
        assert_eq!(day.other[0].id.0, 2);

        let day = &index[&"2024-03-07".parse().unwrap()];
        assert_eq!(day.own.len(), 1);
        assert!(day.other.is_empty());
        assert!(day.has_any());
    }

    #[test]
    fn month_window_handles_year_end_and_leap_feb() {
        let (start, end) = month_window(2024, 12).unwrap();
        assert_eq!(start, "2024-12-01".parse().unwrap());
        assert_eq!(end, "2024-12-31".parse().unwrap());

        let (start, end) = month_window(2024, 2).unwrap();
        assert_eq!(start, "2024-02-01".parse().unwrap());
        assert_eq!(end, "2024-02-29".parse().unwrap());

        assert!(month_window(2024, 13).is_none());
    }
}
