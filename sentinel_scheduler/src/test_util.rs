use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use sentinel_models::{task::TaskId, user::UserId};

use crate::{
    NotificationSink, ReminderNotification, ReminderRequest, ReminderScheduler, UserDirectory,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerCall {
    Schedule(ReminderRequest),
    Cancel(TaskId),
    CancelAll,
    Shutdown,
}

/// Scheduler that only records what it was asked to do.
#[derive(Default, Clone)]
pub struct RecordingReminderScheduler {
    calls: Arc<Mutex<Vec<SchedulerCall>>>,
}

impl RecordingReminderScheduler {
    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: SchedulerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ReminderScheduler for RecordingReminderScheduler {
    fn schedule_reminder(&self, request: ReminderRequest) {
        self.record(SchedulerCall::Schedule(request));
    }

    fn cancel_reminder(&self, task_id: &str) {
        self.record(SchedulerCall::Cancel(task_id.to_owned()));
    }

    fn cancel_all_reminders(&self) {
        self.record(SchedulerCall::CancelAll);
    }

    async fn shutdown(&self) {
        self.record(SchedulerCall::Shutdown);
    }
}

pub type Delivered = Arc<Mutex<Vec<ReminderNotification>>>;

/// Sink that records notifications, optionally after a delay or with a failure.
#[derive(Default, Clone)]
pub struct RecordingSink {
    pub started: Delivered,
    pub delivered: Delivered,
    pub delay: Option<Duration>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn delivered(&self) -> Vec<ReminderNotification> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<ReminderNotification> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, notification: &ReminderNotification) -> anyhow::Result<()> {
        self.started.lock().unwrap().push(notification.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            anyhow::bail!("Delivery channel unavailable");
        }

        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct MapUserDirectory {
    pub emails: HashMap<UserId, String>,
    pub fail: bool,
}

impl MapUserDirectory {
    pub fn with_user(mut self, user_id: &str, email: &str) -> Self {
        self.emails.insert(user_id.to_owned(), email.to_owned());
        self
    }
}

#[async_trait]
impl UserDirectory for MapUserDirectory {
    async fn lookup_email(&self, user_id: &UserId) -> anyhow::Result<Option<String>> {
        if self.fail {
            anyhow::bail!("User directory unavailable");
        }

        Ok(self.emails.get(user_id).cloned())
    }
}
