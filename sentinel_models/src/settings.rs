use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct ReminderSettings {
    #[serde(default = "default_lead_time_minutes")]
    pub lead_time_minutes: i64,
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            lead_time_minutes: default_lead_time_minutes(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

fn default_lead_time_minutes() -> i64 {
    5
}

fn default_shutdown_timeout_secs() -> u64 {
    5
}

#[derive(Deserialize, Debug, Clone)]
pub struct DemoSettings {
    pub user_id: String,
    pub email: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    #[serde(default)]
    pub reminders: ReminderSettings,
    pub demo: DemoSettings,
}
