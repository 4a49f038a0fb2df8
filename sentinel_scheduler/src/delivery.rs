use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentinel_models::task::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotification {
    pub task_id: TaskId,
    pub task_title: String,
    pub user_email: String,
    pub due_at: DateTime<Utc>,
}

#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn deliver(&self, notification: &ReminderNotification) -> anyhow::Result<()>;
}

/// Writes reminders to the log instead of a real transport.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn deliver(&self, notification: &ReminderNotification) -> anyhow::Result<()> {
        log::info!(
            "🔔 REMINDER: Task '{}' is due at {}. [task_id = {}, user_email = {}]",
            notification.task_title,
            notification.due_at.format("%Y-%m-%d %H:%M UTC"),
            notification.task_id,
            notification.user_email
        );

        Ok(())
    }
}
