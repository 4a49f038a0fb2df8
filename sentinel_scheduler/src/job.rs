use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use sentinel_models::{
    task::{Task, TaskId},
    user::UserId,
};

pub type JobId = u64;

pub fn default_lead_time() -> TimeDelta {
    TimeDelta::minutes(5)
}

/// The instant a reminder for a task due at `due_at` should fire.
pub fn reminder_fire_at(due_at: DateTime<Utc>, lead_time: TimeDelta) -> Option<DateTime<Utc>> {
    due_at.checked_sub_signed(lead_time)
}

/// Delay until `fire_at`, or `None` when the instant is not strictly in the future.
pub(crate) fn get_target_delay(fire_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    if fire_at <= now {
        return None;
    }

    (fire_at - now).to_std().ok()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReminderState {
    Pending,
    Firing,
    Completed,
    Cancelled,
}

impl ReminderState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ReminderState::Completed | ReminderState::Cancelled)
    }

    fn can_transition_to(self, next: ReminderState) -> bool {
        matches!(
            (self, next),
            (ReminderState::Pending, ReminderState::Firing)
                | (ReminderState::Pending, ReminderState::Cancelled)
                | (ReminderState::Firing, ReminderState::Completed)
                | (ReminderState::Firing, ReminderState::Cancelled)
        )
    }
}

/// What a task lifecycle event asks the scheduler to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    pub task_id: TaskId,
    pub user_id: UserId,
    pub task_title: String,
    pub due_at: Option<DateTime<Utc>>,
    pub user_email: Option<String>,
}

impl ReminderRequest {
    pub fn new(
        task_id: impl Into<TaskId>,
        user_id: impl Into<UserId>,
        task_title: impl Into<String>,
        due_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            user_id: user_id.into(),
            task_title: task_title.into(),
            due_at,
            user_email: None,
        }
    }

    pub fn with_email(mut self, user_email: impl Into<String>) -> Self {
        self.user_email = Some(user_email.into());
        self
    }
}

impl From<&Task> for ReminderRequest {
    fn from(task: &Task) -> Self {
        Self::new(
            task.id.clone(),
            task.user_id.clone(),
            task.title.clone(),
            task.due_at,
        )
    }
}

#[derive(Debug, Clone)]
pub struct ReminderJob {
    pub id: JobId,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub task_title: String,
    pub user_email: Option<String>,
    pub due_at: DateTime<Utc>,
    pub fire_at: DateTime<Utc>,
    state: ReminderState,
}

impl ReminderJob {
    pub(crate) fn new(
        id: JobId,
        request: ReminderRequest,
        due_at: DateTime<Utc>,
        fire_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_id: request.task_id,
            user_id: request.user_id,
            task_title: request.task_title,
            user_email: request.user_email,
            due_at,
            fire_at,
            state: ReminderState::Pending,
        }
    }

    pub fn state(&self) -> ReminderState {
        self.state
    }

    /// Moves the job to `next`. Returns `false` and leaves the state untouched
    /// when the transition is not part of the lifecycle.
    pub(crate) fn transition(&mut self, next: ReminderState) -> bool {
        if !self.state.can_transition_to(next) {
            log::warn!(
                "Rejected reminder state transition. [state = {:?}, next = {:?}, task_id = {}, job_id = {}]",
                self.state,
                next,
                self.task_id,
                self.id
            );
            return false;
        }

        self.state = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{NaiveDateTime, Timelike};
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;
    use test_strategy::proptest;

    fn job() -> ReminderJob {
        let due_at = Utc::now();
        ReminderJob::new(
            1,
            ReminderRequest::new("t1", "u1", "Title", Some(due_at)),
            due_at,
            due_at - default_lead_time(),
        )
    }

    #[test]
    pub fn fire_at_is_five_minutes_before_due() {
        let due_at = DateTime::parse_from_rfc3339("2025-08-31T17:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let fire_at = reminder_fire_at(due_at, default_lead_time()).unwrap();

        assert_eq!(fire_at.to_rfc3339(), "2025-08-31T16:55:00+00:00");
    }

    #[test]
    pub fn fire_at_overflow_is_none() {
        assert_eq!(
            reminder_fire_at(DateTime::<Utc>::MIN_UTC, default_lead_time()),
            None
        );
    }

    #[test]
    pub fn pending_job_fires_then_completes() {
        let mut job = job();

        assert!(job.transition(ReminderState::Firing));
        assert!(job.transition(ReminderState::Completed));
        assert_eq!(job.state(), ReminderState::Completed);
    }

    #[test]
    pub fn firing_job_can_be_cancelled() {
        let mut job = job();

        assert!(job.transition(ReminderState::Firing));
        assert!(job.transition(ReminderState::Cancelled));
        assert!(job.state().is_terminal());
    }

    #[test]
    pub fn terminal_states_are_final() {
        let mut cancelled = job();
        assert!(cancelled.transition(ReminderState::Cancelled));
        assert!(!cancelled.transition(ReminderState::Firing));
        assert!(!cancelled.transition(ReminderState::Pending));
        assert_eq!(cancelled.state(), ReminderState::Cancelled);

        let mut completed = job();
        assert!(completed.transition(ReminderState::Firing));
        assert!(completed.transition(ReminderState::Completed));
        assert!(!completed.transition(ReminderState::Cancelled));
        assert_eq!(completed.state(), ReminderState::Completed);
    }

    #[test]
    pub fn pending_job_cannot_complete_without_firing() {
        let mut job = job();

        assert!(!job.transition(ReminderState::Completed));
        assert_eq!(job.state(), ReminderState::Pending);
    }

    #[proptest]
    fn target_delay_matches_offset(
        #[strategy(arb::<NaiveDateTime>())] now: NaiveDateTime,
        #[strategy(1i64..1_000_000)] offset_secs: i64,
    ) {
        let now = now.with_nanosecond(0).unwrap().and_utc();
        let fire_at = now.checked_add_signed(TimeDelta::seconds(offset_secs));
        prop_assume!(fire_at.is_some());
        let fire_at = fire_at.unwrap();

        let delay = get_target_delay(fire_at, now);

        prop_assert_eq!(delay, Some(Duration::from_secs(offset_secs as u64)));
    }

    #[proptest]
    fn past_or_present_fire_at_has_no_delay(
        #[strategy(arb::<NaiveDateTime>())] now: NaiveDateTime,
        #[strategy(0i64..1_000_000)] offset_secs: i64,
    ) {
        let now = now.with_nanosecond(0).unwrap().and_utc();
        let fire_at = now.checked_sub_signed(TimeDelta::seconds(offset_secs));
        prop_assume!(fire_at.is_some());
        let fire_at = fire_at.unwrap();

        prop_assert_eq!(get_target_delay(fire_at, now), None);
    }
}
