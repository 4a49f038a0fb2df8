use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use sentinel_models::{
    category::NewCategory,
    email::{Email, SuggestedTask},
    task::Task,
    user::UserId,
};
use sentinel_storage::CategoryStorage;

use crate::task_service::TaskService;

struct SuggestionRule {
    keywords: &'static [&'static str],
    title: &'static str,
    category: &'static str,
    due_at: fn(DateTime<Utc>) -> Option<DateTime<Utc>>,
}

const RULES: &[SuggestionRule] = &[
    SuggestionRule {
        keywords: &["flight", "ba"],
        title: "Check in for flight BA143",
        category: "Travel",
        due_at: |now| Some(now + TimeDelta::hours(18)),
    },
    SuggestionRule {
        keywords: &["kickoff", "meeting"],
        title: "Prepare for Project Kickoff meeting",
        category: "Work",
        due_at: |now| Some(now + TimeDelta::days(1) - TimeDelta::hours(14)),
    },
    SuggestionRule {
        keywords: &["invoice", "due"],
        title: "Pay invoice #INV-2024-08-001",
        category: "Finance",
        due_at: |now| {
            NaiveDate::from_ymd_opt(now.year(), 8, 31)
                .and_then(|date| date.and_hms_opt(17, 0, 0))
                .map(|due| due.and_utc())
        },
    },
    SuggestionRule {
        keywords: &["deadline", "urgent"],
        title: "Complete quarterly review documents",
        category: "Work",
        due_at: |now| Some(now + TimeDelta::hours(8)),
    },
];

/// Fixed demo inbox standing in for a real mail provider.
pub fn mock_inbox(now: DateTime<Utc>) -> Vec<Email> {
    let email = |id: &str, subject: &str, body: &str, hours_ago: i64, sender: &str| Email {
        id: id.to_owned(),
        subject: subject.to_owned(),
        body: body.to_owned(),
        received_at: now - TimeDelta::hours(hours_ago),
        sender: Some(sender.to_owned()),
        recipient: Some("you@example.com".to_owned()),
    };

    vec![
        email(
            "email-1",
            "Your BA Flight BA143 – London→Dubai – 2 Sep 12:40",
            "Flight confirmation for BA143 departing London Heathrow (LHR) to Dubai (DXB) on September 2nd at 12:40. Please check in online 24 hours before departure.",
            2,
            "British Airways <noreply@britishairways.com>",
        ),
        email(
            "email-2",
            "Project Kickoff – Tue 10:00",
            "Hi team, we have our project kickoff meeting scheduled for Tuesday at 10:00 AM. Please come prepared with your initial thoughts and questions.",
            4,
            "Sarah Johnson <sarah@company.com>",
        ),
        email(
            "email-3",
            "Invoice due 31 Aug - Action Required",
            "Dear customer, your invoice #INV-2024-08-001 for $2,450 is due on August 31st. Please make payment by 5 PM to avoid late fees.",
            6,
            "Billing <billing@service.com>",
        ),
        email(
            "email-4",
            "URGENT: Quarterly Review Deadline Tomorrow",
            "The quarterly review documents are due tomorrow by end of day. Please ensure all sections are completed and submitted through the company portal.",
            1,
            "HR Department <hr@company.com>",
        ),
    ]
}

/// Keyword matching on email subjects. One email can produce several suggestions.
pub fn suggest_tasks(emails: &[Email], now: DateTime<Utc>) -> Vec<SuggestedTask> {
    let mut suggestions = Vec::new();

    for email in emails {
        let subject = email.subject.to_lowercase();
        let matching = RULES
            .iter()
            .filter(|rule| rule.keywords.iter().any(|keyword| subject.contains(keyword)));

        for (n, rule) in matching.enumerate() {
            suggestions.push(SuggestedTask {
                id: format!("suggestion-{}-{}", email.id, n),
                title: rule.title.to_owned(),
                due_at: (rule.due_at)(now),
                category: Some(rule.category.to_owned()),
                linked_email_id: Some(email.id.clone()),
                email_subject: Some(email.subject.clone()),
            });
        }
    }

    suggestions
}

/// Pulls the inbox and turns every suggestion into a task for `user_id`,
/// creating the categories the suggestions use when the user lacks them.
pub async fn sync_inbox(
    service: &TaskService,
    categories: &dyn CategoryStorage,
    user_id: &UserId,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<Task>> {
    let emails = mock_inbox(now);
    let suggestions = suggest_tasks(&emails, now);
    log::info!(
        "Synced {} emails, found {} suggestions. [user_id = {}]",
        emails.len(),
        suggestions.len(),
        user_id
    );

    let mut known: Vec<String> = categories
        .get_all_user_categories(user_id)
        .await?
        .into_iter()
        .map(|category| category.name.to_lowercase())
        .collect();
    for name in suggestions.iter().filter_map(|s| s.category.as_deref()) {
        if known.contains(&name.to_lowercase()) {
            continue;
        }

        let category = categories.insert(user_id, NewCategory::new(name)).await?;
        log::info!(
            "Created category '{}' from inbox. [category_id = {}, user_id = {}]",
            category.name,
            category.id,
            user_id
        );
        known.push(name.to_lowercase());
    }

    let mut tasks = Vec::with_capacity(suggestions.len());
    for suggestion in suggestions {
        tasks.push(service.accept_suggestion(user_id, suggestion).await?);
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use sentinel_scheduler::test_util::{RecordingReminderScheduler, SchedulerCall};
    use sentinel_storage::{InMemoryCategoryStorage, InMemoryTaskStorage, InMemoryUserStorage};
    use test_strategy::proptest;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn email(id: &str, subject: &str) -> Email {
        Email {
            id: id.to_owned(),
            subject: subject.to_owned(),
            body: String::new(),
            received_at: now(),
            sender: None,
            recipient: None,
        }
    }

    #[test]
    pub fn mock_inbox_yields_one_suggestion_per_email() {
        let suggestions = suggest_tasks(&mock_inbox(now()), now());

        let titles: Vec<_> = suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Check in for flight BA143",
                "Prepare for Project Kickoff meeting",
                "Pay invoice #INV-2024-08-001",
                "Complete quarterly review documents",
            ]
        );
    }

    #[test]
    pub fn due_dates_follow_rules() {
        let suggestions = suggest_tasks(&mock_inbox(now()), now());
        let due = |i: usize| suggestions[i].due_at.unwrap();

        assert_eq!(due(0), now() + TimeDelta::hours(18));
        assert_eq!(due(1), now() + TimeDelta::hours(10));
        assert_eq!(due(2).to_rfc3339(), "2025-08-31T17:00:00+00:00");
        assert_eq!(due(3), now() + TimeDelta::hours(8));
    }

    #[test]
    pub fn matching_is_case_insensitive_on_subject_only() {
        let emails = [
            email("a", "TEAM MEETING at noon"),
            email("b", "Lunch?"),
        ];

        let suggestions = suggest_tasks(&emails, now());

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].category.as_deref(), Some("Work"));
        assert_eq!(suggestions[0].linked_email_id.as_deref(), Some("a"));
    }

    #[test]
    pub fn one_email_can_match_several_rules() {
        let emails = [email("x", "Urgent: invoice for the flight")];

        let suggestions = suggest_tasks(&emails, now());

        let ids: Vec<_> = suggestions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["suggestion-x-0", "suggestion-x-1", "suggestion-x-2"]);
    }

    #[proptest]
    fn suggestions_link_back_to_their_email(#[strategy("[a-zA-Z :]{0,40}")] subject: String) {
        let emails = [email("e", &subject)];

        let suggestions = suggest_tasks(&emails, now());

        prop_assert!(suggestions.len() <= RULES.len());
        for (n, suggestion) in suggestions.iter().enumerate() {
            prop_assert_eq!(&suggestion.id, &format!("suggestion-e-{n}"));
            prop_assert_eq!(suggestion.linked_email_id.as_deref(), Some("e"));
            prop_assert_eq!(suggestion.email_subject.as_deref(), Some(subject.as_str()));
        }
    }

    #[tokio::test]
    pub async fn sync_creates_tasks_and_reminders() {
        let reminders = RecordingReminderScheduler::default();
        let service = TaskService::new(
            Arc::new(InMemoryTaskStorage::new()),
            Arc::new(InMemoryUserStorage::new()),
            Arc::new(reminders.clone()),
        );
        let categories = InMemoryCategoryStorage::new();
        let now = Utc::now();

        let tasks = sync_inbox(&service, &categories, &"u1".to_owned(), now)
            .await
            .unwrap();

        assert_eq!(tasks.len(), 4);
        let scheduled = reminders
            .calls()
            .into_iter()
            .filter(|call| matches!(call, SchedulerCall::Schedule(_)))
            .count();
        assert_eq!(scheduled, 4);
    }

    #[tokio::test]
    pub async fn sync_creates_missing_categories_once() {
        let service = TaskService::new(
            Arc::new(InMemoryTaskStorage::new()),
            Arc::new(InMemoryUserStorage::new()),
            Arc::new(RecordingReminderScheduler::default()),
        );
        let categories = InMemoryCategoryStorage::new();
        let user_id = "u1".to_owned();
        categories
            .insert(&user_id, NewCategory::new("work").with_color("#10B981"))
            .await
            .unwrap();

        sync_inbox(&service, &categories, &user_id, Utc::now()).await.unwrap();
        sync_inbox(&service, &categories, &user_id, Utc::now()).await.unwrap();

        let listed = categories.get_all_user_categories(&user_id).await.unwrap();
        let names: Vec<_> = listed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Finance", "Travel", "work"]);
        assert_eq!(listed[2].color, "#10B981");
    }
}
