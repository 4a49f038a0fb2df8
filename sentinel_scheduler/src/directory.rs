use async_trait::async_trait;
use sentinel_models::user::UserId;

/// Resolves where a reminder for a user should be sent.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    async fn lookup_email(&self, user_id: &UserId) -> anyhow::Result<Option<String>>;
}
