use std::{sync::Arc, time::Duration};

use anyhow::Context;
use chrono::Utc;
use sentinel_scheduler::{
    LogNotificationSink, ReminderRegistry, ReminderScheduler, TaskReminderScheduler, TokioClock,
};
use sentinel_storage::{
    InMemoryCategoryStorage, InMemoryTaskStorage, InMemoryUserStorage, NewUser, TaskStorage,
    UserStorage,
};

use sentinel::{
    appsettings, directory::StorageUserDirectory, suggestions, task_service::TaskService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_logging();

    let settings = appsettings::load().context("Failed to load appsettings")?;
    log::info!("Starting Sentinel reminder service");

    let users: Arc<dyn UserStorage> = Arc::new(InMemoryUserStorage::new());
    let tasks: Arc<dyn TaskStorage> = Arc::new(InMemoryTaskStorage::new());
    let categories = InMemoryCategoryStorage::new();

    let lead_time = appsettings::reminder_lead_time(&settings.reminders)?;
    let registry = ReminderRegistry::new(
        Arc::new(TokioClock::new()),
        Arc::new(StorageUserDirectory::new(users.clone())),
        Arc::new(LogNotificationSink),
        lead_time,
    );
    let scheduler: Arc<dyn ReminderScheduler> = Arc::new(
        TaskReminderScheduler::new(registry).with_shutdown_timeout(Duration::from_secs(
            settings.reminders.shutdown_timeout_secs,
        )),
    );

    let service = TaskService::new(tasks, users.clone(), scheduler.clone());

    let demo_user = users
        .create(NewUser {
            id: Some(settings.demo.user_id),
            email: settings.demo.email,
        })
        .await?;

    let created = suggestions::sync_inbox(&service, &categories, &demo_user.id, Utc::now()).await?;
    for task in &created {
        log::info!(
            "Accepted suggestion '{}'. [task_id = {}, due_at = {:?}]",
            task.title,
            task.id,
            task.due_at
        );
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    log::info!("Shutting down");
    scheduler.shutdown().await;

    Ok(())
}

fn init_logging() {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}
