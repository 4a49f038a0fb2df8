use std::sync::Arc;

use sentinel_models::{
    email::SuggestedTask,
    task::{NewTask, Task, TaskId, UpdateTask},
    user::UserId,
};
use sentinel_scheduler::{ReminderRequest, ReminderScheduler};
use sentinel_storage::{StorageError, TaskStorage, UserStorage};

/// Task lifecycle operations. Keeps reminders in step with each task's due
/// date and status; reminder problems never fail the task operation.
pub struct TaskService {
    tasks: Arc<dyn TaskStorage>,
    users: Arc<dyn UserStorage>,
    reminders: Arc<dyn ReminderScheduler>,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskStorage>,
        users: Arc<dyn UserStorage>,
        reminders: Arc<dyn ReminderScheduler>,
    ) -> Self {
        Self {
            tasks,
            users,
            reminders,
        }
    }

    pub async fn list_tasks(&self, user_id: &UserId) -> anyhow::Result<Vec<Task>> {
        Ok(self.tasks.get_all_user_tasks(user_id).await?)
    }

    pub async fn create_task(&self, user_id: &UserId, new_task: NewTask) -> anyhow::Result<Task> {
        let task = self.tasks.insert(user_id, new_task).await?;
        log::info!("Created task '{}'. [task_id = {}, user_id = {}]", task.title, task.id, user_id);

        self.schedule_reminder(&task).await;
        Ok(task)
    }

    pub async fn accept_suggestion(
        &self,
        user_id: &UserId,
        suggestion: SuggestedTask,
    ) -> anyhow::Result<Task> {
        self.create_task(user_id, suggestion.into()).await
    }

    pub async fn update_task(
        &self,
        user_id: &UserId,
        task_id: &TaskId,
        update: UpdateTask,
    ) -> anyhow::Result<Task> {
        let affects_reminder =
            update.due_at.is_some() || update.title.is_some() || update.status.is_some();

        let task = self.tasks.update(user_id, task_id, update).await?;

        if affects_reminder {
            self.reminders.cancel_reminder(&task.id);
            self.schedule_reminder(&task).await;
        }

        Ok(task)
    }

    pub async fn toggle_status(&self, user_id: &UserId, task_id: &TaskId) -> anyhow::Result<Task> {
        let task = self.get_owned(user_id, task_id).await?;
        let update = UpdateTask {
            status: Some(task.status.toggled()),
            ..Default::default()
        };

        self.update_task(user_id, task_id, update).await
    }

    pub async fn toggle_star(&self, user_id: &UserId, task_id: &TaskId) -> anyhow::Result<Task> {
        let task = self.get_owned(user_id, task_id).await?;
        let update = UpdateTask {
            is_starred: Some(!task.is_starred),
            ..Default::default()
        };

        Ok(self.tasks.update(user_id, task_id, update).await?)
    }

    pub async fn delete_task(&self, user_id: &UserId, task_id: &TaskId) -> anyhow::Result<()> {
        let task = self.tasks.delete(user_id, task_id).await?;
        log::info!("Deleted task. [task_id = {}, user_id = {}]", task.id, user_id);

        self.reminders.cancel_reminder(&task.id);
        Ok(())
    }

    async fn get_owned(&self, user_id: &UserId, task_id: &TaskId) -> anyhow::Result<Task> {
        let task = self
            .tasks
            .get(user_id, task_id)
            .await?
            .ok_or_else(|| StorageError::TaskNotFound(task_id.clone()))?;

        Ok(task)
    }

    async fn schedule_reminder(&self, task: &Task) {
        if !task.is_pending() || task.due_at.is_none() {
            return;
        }

        let mut request = ReminderRequest::from(task);
        match self.users.get(&task.user_id).await {
            Ok(Some(user)) => request = request.with_email(user.email),
            Ok(None) => {}
            Err(e) => log::warn!(
                "Could not resolve reminder email, deferring lookup. [task_id = {}, error = {:#}]",
                task.id,
                e
            ),
        }

        self.reminders.schedule_reminder(request);
    }
}
