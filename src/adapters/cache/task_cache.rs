use moka::future::Cache;
use std::time::Duration;

use crate::domain::{Task, TaskId};

/// Detail-view cache: single tasks by id. List feeds are never cached here;
/// the feed board owns their accumulated state.
pub struct TaskCache {
    inner: Cache<TaskId, Task>,
}

impl TaskCache {
    pub fn new(ttl_seconds: u64) -> Self {
        let inner = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(1000)
            .build();

        Self { inner }
    }

    pub async fn get(&self, id: TaskId) -> Option<Task> {
        self.inner.get(&id).await
    }

    pub async fn insert(&self, task: Task) {
        self.inner.insert(task.id, task).await;
    }

    pub async fn remove(&self, id: TaskId) {
        self.inner.remove(&id).await;
    }
}
