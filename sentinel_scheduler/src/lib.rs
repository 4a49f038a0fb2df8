mod clock;
mod delivery;
mod directory;
mod job;
mod registry;
mod scheduler;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use clock::{Clock, Timer, TokioClock};
pub use delivery::{LogNotificationSink, NotificationSink, ReminderNotification};
pub use directory::UserDirectory;
pub use job::{
    JobId, ReminderJob, ReminderRequest, ReminderState, default_lead_time, reminder_fire_at,
};
pub use registry::{ReminderRegistry, ScheduleOutcome};
pub use scheduler::{ReminderScheduler, TaskReminderScheduler};
