use chrono::{DateTime, Utc};

use crate::user::UserId;

pub type TaskId = String;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Done,
}

impl TaskStatus {
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,
    pub due_at: Option<DateTime<Utc>>,
    pub is_starred: bool,
    pub category: Option<String>,
    pub parent_id: Option<TaskId>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub due_at: Option<DateTime<Utc>>,
    pub is_starred: bool,
    pub category: Option<String>,
    pub parent_id: Option<TaskId>,
}

/// Partial update of a task. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_at: Option<DateTime<Utc>>,
    pub is_starred: Option<bool>,
    pub category: Option<String>,
}
