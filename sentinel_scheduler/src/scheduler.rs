use std::time::Duration;

use async_trait::async_trait;

use crate::{
    job::ReminderRequest,
    registry::{ReminderRegistry, ScheduleOutcome},
};

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Reminder operations available to task lifecycle handlers.
///
/// None of these report failure: a reminder problem must never fail the
/// task operation that triggered it.
#[async_trait]
pub trait ReminderScheduler: Send + Sync + 'static {
    fn schedule_reminder(&self, request: ReminderRequest);

    fn cancel_reminder(&self, task_id: &str);

    fn cancel_all_reminders(&self);

    async fn shutdown(&self);
}

pub struct TaskReminderScheduler {
    registry: ReminderRegistry,
    shutdown_timeout: Duration,
}

impl TaskReminderScheduler {
    pub fn new(registry: ReminderRegistry) -> Self {
        Self {
            registry,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    pub fn registry(&self) -> &ReminderRegistry {
        &self.registry
    }
}

#[async_trait]
impl ReminderScheduler for TaskReminderScheduler {
    fn schedule_reminder(&self, request: ReminderRequest) {
        let task_id = request.task_id.clone();
        match self.registry.schedule(request) {
            Ok(ScheduleOutcome::Scheduled { job_id, fire_at }) => log::debug!(
                "Reminder scheduled. [task_id = {task_id}, job_id = {job_id}, fire_at = {fire_at}]"
            ),
            Ok(_) => {}
            Err(e) => log::error!("Failed to schedule reminder. [task_id = {task_id}, error = {e:#}]"),
        }
    }

    fn cancel_reminder(&self, task_id: &str) {
        if !self.registry.cancel(task_id) {
            log::debug!("No pending reminder to cancel. [task_id = {task_id}]");
        }
    }

    fn cancel_all_reminders(&self) {
        self.registry.cancel_all();
    }

    async fn shutdown(&self) {
        self.registry.shutdown(self.shutdown_timeout).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeDelta, Utc};

    use crate::{
        Clock, TokioClock, default_lead_time,
        test_util::{MapUserDirectory, RecordingSink},
    };

    use super::*;

    fn scheduler(sink: &RecordingSink) -> (Arc<TokioClock>, TaskReminderScheduler) {
        let clock = Arc::new(TokioClock::new());
        let registry = ReminderRegistry::new(
            clock.clone(),
            Arc::new(MapUserDirectory::default()),
            Arc::new(sink.clone()),
            default_lead_time(),
        );

        (clock, TaskReminderScheduler::new(registry))
    }

    #[test]
    pub fn schedule_failure_is_swallowed() {
        let sink = RecordingSink::default();
        let (_, scheduler) = scheduler(&sink);
        let request = ReminderRequest::new(
            "t1",
            "u1",
            "Outside runtime",
            Some(Utc::now() + TimeDelta::hours(1)),
        );

        scheduler.schedule_reminder(request);

        assert!(scheduler.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    pub async fn facade_drives_registry() {
        let sink = RecordingSink::default();
        let (clock, scheduler) = scheduler(&sink);
        let due_at = clock.now() + TimeDelta::minutes(30);

        scheduler.schedule_reminder(ReminderRequest::new("t1", "u1", "One", Some(due_at)));
        scheduler.schedule_reminder(ReminderRequest::new("t2", "u1", "Two", Some(due_at)));
        assert_eq!(scheduler.registry().len(), 2);

        scheduler.cancel_reminder("t1");
        scheduler.cancel_reminder("t1");
        assert_eq!(scheduler.registry().len(), 1);

        scheduler.cancel_all_reminders();
        assert!(scheduler.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    pub async fn shutdown_leaves_no_pending_reminders() {
        let sink = RecordingSink::default();
        let (clock, scheduler) = scheduler(&sink);
        let scheduler = scheduler.with_shutdown_timeout(Duration::from_secs(1));
        let due_at = clock.now() + TimeDelta::minutes(30);

        scheduler.schedule_reminder(
            ReminderRequest::new("t1", "u1", "One", Some(due_at)).with_email("u1@example.com"),
        );
        scheduler.shutdown().await;

        assert!(scheduler.registry().is_empty());
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(sink.started().is_empty());
    }
}
