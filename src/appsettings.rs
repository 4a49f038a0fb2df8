use anyhow::{Context, ensure};
use chrono::TimeDelta;
use config::{Config, ConfigError, Environment, File};
use sentinel_models::settings::{ReminderSettings, Settings};

/// Layers `appsettings`, the optional `appsettings.local` and `APP__*` environment variables.
pub fn load() -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .add_source(File::with_name("appsettings").required(true))
        .add_source(File::with_name("appsettings.local").required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Reminders must fire before the due date, so the lead time has to be positive.
pub fn reminder_lead_time(settings: &ReminderSettings) -> anyhow::Result<TimeDelta> {
    let minutes = settings.lead_time_minutes;
    ensure!(
        minutes > 0,
        "reminders.lead_time_minutes must be positive, got {minutes}"
    );

    TimeDelta::try_minutes(minutes).context("Reminder lead time is out of range")
}
