use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use anyhow::Context;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::{runtime::Handle, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use sentinel_models::task::TaskId;

use crate::{
    clock::{Clock, Timer},
    delivery::{NotificationSink, ReminderNotification},
    directory::UserDirectory,
    job::{JobId, ReminderJob, ReminderRequest, ReminderState, get_target_delay, reminder_fire_at},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled {
        job_id: JobId,
        fire_at: DateTime<Utc>,
    },
    NoDueDate,
    TooSoon,
}

struct ReminderEntry {
    job: ReminderJob,
    cancellation_token: CancellationToken,
    task: JoinHandle<()>,
}

impl ReminderEntry {
    fn cancel(mut self) -> JoinHandle<()> {
        self.job.transition(ReminderState::Cancelled);
        self.cancellation_token.cancel();
        self.task
    }
}

struct RegistryInner {
    entries: Mutex<HashMap<TaskId, ReminderEntry>>,
    next_job_id: AtomicU64,
    lead_time: TimeDelta,
    clock: Arc<dyn Clock>,
    directory: Arc<dyn UserDirectory>,
    sink: Arc<dyn NotificationSink>,
}

impl RegistryInner {
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<TaskId, ReminderEntry>> {
        // Entries stay consistent even if a holder panicked: every mutation is a single map call.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn drain(&self) -> Vec<JoinHandle<()>> {
        self.lock_entries()
            .drain()
            .map(|(_, entry)| entry.cancel())
            .collect()
    }

    fn begin_firing(&self, task_id: &str, job_id: JobId) -> Option<ReminderJob> {
        let mut entries = self.lock_entries();
        let entry = entries.get_mut(task_id).filter(|e| e.job.id == job_id)?;

        entry
            .job
            .transition(ReminderState::Firing)
            .then(|| entry.job.clone())
    }

    fn complete(&self, task_id: &str, job_id: JobId) {
        let mut entries = self.lock_entries();
        if let Entry::Occupied(occupied) = entries.entry(task_id.to_owned()) {
            if occupied.get().job.id == job_id {
                let mut entry = occupied.remove();
                entry.job.transition(ReminderState::Completed);
            }
        }
    }

    async fn deliver(&self, job: &ReminderJob) {
        let email = match self.resolve_email(job).await {
            Ok(Some(email)) => email,
            Ok(None) => {
                log::warn!(
                    "No email found for user, cannot send reminder. [task_id = {}, user_id = {}]",
                    job.task_id,
                    job.user_id
                );
                return;
            }
            Err(e) => {
                log::error!(
                    "Failed to look up reminder recipient. [task_id = {}, user_id = {}, error = {:#}]",
                    job.task_id,
                    job.user_id,
                    e
                );
                return;
            }
        };

        let notification = ReminderNotification {
            task_id: job.task_id.clone(),
            task_title: job.task_title.clone(),
            user_email: email,
            due_at: job.due_at,
        };

        if let Err(e) = self.sink.deliver(&notification).await {
            log::error!(
                "Error sending reminder. [task_id = {}, job_id = {}, error = {:#}]",
                job.task_id,
                job.id,
                e
            );
        }
    }

    async fn resolve_email(&self, job: &ReminderJob) -> anyhow::Result<Option<String>> {
        if let Some(email) = job.user_email.as_ref().filter(|e| !e.trim().is_empty()) {
            return Ok(Some(email.clone()));
        }

        let email = self.directory.lookup_email(&job.user_id).await?;
        Ok(email.filter(|e| !e.trim().is_empty()))
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        let cancelled = self.drain().len();
        if cancelled > 0 {
            log::info!("Reminder registry dropped, cancelled {cancelled} pending reminders");
        }
    }
}

/// Process-local map of task ids to their pending reminder job.
///
/// At most one job is live per task id. All map mutations and job state
/// transitions happen under one lock that is never held across an `.await`.
///
/// Cancelling a job guarantees that no delivery starts for it afterwards; a
/// recipient lookup or delivery already in flight is abandoned at its next
/// suspension point. Side effects a sink committed before that point are
/// not undone.
#[derive(Clone)]
pub struct ReminderRegistry {
    inner: Arc<RegistryInner>,
}

impl ReminderRegistry {
    pub fn new(
        clock: Arc<dyn Clock>,
        directory: Arc<dyn UserDirectory>,
        sink: Arc<dyn NotificationSink>,
        lead_time: TimeDelta,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: Mutex::new(HashMap::new()),
                next_job_id: AtomicU64::new(1),
                lead_time,
                clock,
                directory,
                sink,
            }),
        }
    }

    /// Arms a reminder for `request.task_id`, replacing any job it already has.
    ///
    /// A request without a due date, or whose reminder time has already
    /// passed, changes nothing: an existing job for the task stays armed.
    /// Callers moving a due date should `cancel` first.
    pub fn schedule(&self, request: ReminderRequest) -> anyhow::Result<ScheduleOutcome> {
        let Some(due_at) = request.due_at else {
            log::info!(
                "Task has no due date, skipping reminder. [task_id = {}]",
                request.task_id
            );
            return Ok(ScheduleOutcome::NoDueDate);
        };

        let fire_at = reminder_fire_at(due_at, self.inner.lead_time)
            .with_context(|| format!("Reminder time for due date {due_at} is out of range"))?;

        let now = self.inner.clock.now();
        let Some(delay) = get_target_delay(fire_at, now) else {
            log::info!(
                "Task due time is too soon, skipping reminder. [task_id = {}, due_at = {}]",
                request.task_id,
                due_at
            );
            return Ok(ScheduleOutcome::TooSoon);
        };

        let runtime =
            Handle::try_current().context("Reminders must be scheduled inside a tokio runtime")?;

        let job_id = self.inner.next_job_id.fetch_add(1, Ordering::Relaxed);
        let task_id = request.task_id.clone();
        let job = ReminderJob::new(job_id, request, due_at, fire_at);
        let cancellation_token = CancellationToken::new();
        let timer = self.inner.clock.after(delay);

        let mut entries = self.inner.lock_entries();
        if let Some(previous) = entries.remove(&task_id) {
            log::info!(
                "Replacing existing reminder. [task_id = {}, previous_job_id = {}]",
                task_id,
                previous.job.id
            );
            previous.cancel();
        }

        let task = runtime.spawn(run_job(
            Arc::downgrade(&self.inner),
            task_id.clone(),
            job_id,
            timer,
            cancellation_token.clone(),
        ));

        log::info!(
            "Scheduling reminder for task '{}' in {:.1} minutes. [task_id = {}, job_id = {}]",
            job.task_title,
            delay.as_secs_f64() / 60.0,
            task_id,
            job_id
        );

        entries.insert(
            task_id,
            ReminderEntry {
                job,
                cancellation_token,
                task,
            },
        );

        Ok(ScheduleOutcome::Scheduled { job_id, fire_at })
    }

    /// Cancels the pending reminder for `task_id`. Returns whether one existed.
    pub fn cancel(&self, task_id: &str) -> bool {
        let removed = self.inner.lock_entries().remove(task_id);
        match removed {
            Some(entry) => {
                let job_id = entry.job.id;
                entry.cancel();
                log::info!("Cancelled reminder. [task_id = {task_id}, job_id = {job_id}]");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) -> usize {
        let cancelled = self.inner.drain().len();
        log::info!("Cancelled all scheduled reminders. [count = {cancelled}]");
        cancelled
    }

    /// Cancels every reminder and waits up to `timeout` for their tasks to exit.
    pub async fn shutdown(&self, timeout: Duration) {
        let handles = self.inner.drain();
        let count = handles.len();

        let joined = tokio::time::timeout(timeout, async {
            for handle in handles {
                if let Err(e) = handle.await {
                    log::warn!("Reminder task did not exit cleanly. [error = {e}]");
                }
            }
        })
        .await;

        match joined {
            Ok(()) => log::info!("Reminder registry shut down. [cancelled = {count}]"),
            Err(_) => log::warn!(
                "Timed out waiting for reminder tasks to exit. [cancelled = {count}, timeout = {timeout:?}]"
            ),
        }
    }

    pub fn state_of(&self, task_id: &str) -> Option<ReminderState> {
        self.inner
            .lock_entries()
            .get(task_id)
            .map(|entry| entry.job.state())
    }

    pub fn fire_at_of(&self, task_id: &str) -> Option<DateTime<Utc>> {
        self.inner
            .lock_entries()
            .get(task_id)
            .map(|entry| entry.job.fire_at)
    }

    pub fn len(&self) -> usize {
        self.inner.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn run_job(
    registry: Weak<RegistryInner>,
    task_id: TaskId,
    job_id: JobId,
    timer: Timer,
    cancellation_token: CancellationToken,
) {
    tokio::select! {
        biased;
        _ = cancellation_token.cancelled() => {
            log::info!("Reminder was cancelled. [task_id = {task_id}, job_id = {job_id}]");
            return;
        }
        _ = timer => {}
    }

    let Some(registry) = registry.upgrade() else {
        return;
    };

    let Some(job) = registry.begin_firing(&task_id, job_id) else {
        return;
    };

    tokio::select! {
        biased;
        _ = cancellation_token.cancelled() => {
            log::info!(
                "Reminder was cancelled while firing. [task_id = {task_id}, job_id = {job_id}]"
            );
        }
        _ = registry.deliver(&job) => {
            registry.complete(&task_id, job_id);
        }
    }
}
