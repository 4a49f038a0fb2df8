use chrono::{DateTime, Utc};

use crate::task::NewTask;

#[derive(Debug, Clone)]
pub struct Email {
    pub id: String,
    pub subject: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
    pub sender: Option<String>,
    pub recipient: Option<String>,
}

/// A task derived from an email that the user has not accepted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedTask {
    pub id: String,
    pub title: String,
    pub due_at: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub linked_email_id: Option<String>,
    pub email_subject: Option<String>,
}

impl From<SuggestedTask> for NewTask {
    fn from(value: SuggestedTask) -> Self {
        Self {
            title: value.title,
            due_at: value.due_at,
            is_starred: false,
            category: value.category,
            parent_id: None,
        }
    }
}
