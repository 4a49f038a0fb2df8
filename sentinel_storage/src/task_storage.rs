use std::{cmp::Ordering, collections::HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use sentinel_models::{
    task::{NewTask, Task, TaskId, TaskStatus, UpdateTask},
    user::UserId,
};

use crate::StorageError;

/// Per-user task persistence. Tasks owned by another user behave as missing.
#[async_trait]
pub trait TaskStorage: Send + Sync {
    async fn insert(&self, user_id: &UserId, task: NewTask) -> Result<Task, StorageError>;
    async fn get(&self, user_id: &UserId, id: &TaskId) -> Result<Option<Task>, StorageError>;
    async fn get_all_user_tasks(&self, user_id: &UserId) -> Result<Vec<Task>, StorageError>;
    async fn update(
        &self,
        user_id: &UserId,
        id: &TaskId,
        update: UpdateTask,
    ) -> Result<Task, StorageError>;
    async fn delete(&self, user_id: &UserId, id: &TaskId) -> Result<Task, StorageError>;
}

#[derive(Default)]
struct TaskStore {
    next_id: u64,
    tasks: HashMap<TaskId, Task>,
}

impl TaskStore {
    fn owned_mut(&mut self, user_id: &UserId, id: &TaskId) -> Result<&mut Task, StorageError> {
        self.tasks
            .get_mut(id)
            .filter(|task| &task.user_id == user_id)
            .ok_or_else(|| StorageError::TaskNotFound(id.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryTaskStorage {
    store: RwLock<TaskStore>,
}

impl InMemoryTaskStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStorage for InMemoryTaskStorage {
    async fn insert(&self, user_id: &UserId, task: NewTask) -> Result<Task, StorageError> {
        let mut store = self.store.write().await;
        store.next_id += 1;
        let id = store.next_id.to_string();
        let now = Utc::now();

        let task = Task {
            id: id.clone(),
            user_id: user_id.clone(),
            title: task.title,
            due_at: task.due_at,
            is_starred: task.is_starred,
            category: task.category,
            parent_id: task.parent_id,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        store.tasks.insert(id.clone(), task.clone());
        log::debug!("Inserted task. [task_id = {id}, user_id = {user_id}]");
        Ok(task)
    }

    async fn get(&self, user_id: &UserId, id: &TaskId) -> Result<Option<Task>, StorageError> {
        let store = self.store.read().await;
        Ok(store
            .tasks
            .get(id)
            .filter(|task| &task.user_id == user_id)
            .cloned())
    }

    async fn get_all_user_tasks(&self, user_id: &UserId) -> Result<Vec<Task>, StorageError> {
        let store = self.store.read().await;
        let mut tasks: Vec<Task> = store
            .tasks
            .values()
            .filter(|task| &task.user_id == user_id)
            .cloned()
            .collect();

        tasks.sort_by(compare_for_listing);
        Ok(tasks)
    }

    async fn update(
        &self,
        user_id: &UserId,
        id: &TaskId,
        update: UpdateTask,
    ) -> Result<Task, StorageError> {
        let mut store = self.store.write().await;
        let task = store.owned_mut(user_id, id)?;

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(due_at) = update.due_at {
            task.due_at = Some(due_at);
        }
        if let Some(is_starred) = update.is_starred {
            task.is_starred = is_starred;
        }
        if let Some(category) = update.category {
            task.category = Some(category);
        }
        task.updated_at = Utc::now();

        Ok(task.clone())
    }

    async fn delete(&self, user_id: &UserId, id: &TaskId) -> Result<Task, StorageError> {
        let mut store = self.store.write().await;
        store.owned_mut(user_id, id)?;
        store
            .tasks
            .remove(id)
            .ok_or_else(|| StorageError::TaskNotFound(id.clone()))
    }
}

/// Starred tasks first, then by due date with undated tasks last.
fn compare_for_listing(a: &Task, b: &Task) -> Ordering {
    b.is_starred
        .cmp(&a.is_starred)
        .then_with(|| match (a.due_at, b.due_at) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.created_at.cmp(&b.created_at))
}
