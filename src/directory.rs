use std::sync::Arc;

use async_trait::async_trait;
use sentinel_models::user::UserId;
use sentinel_scheduler::UserDirectory;
use sentinel_storage::UserStorage;

pub struct StorageUserDirectory {
    users: Arc<dyn UserStorage>,
}

impl StorageUserDirectory {
    pub fn new(users: Arc<dyn UserStorage>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserDirectory for StorageUserDirectory {
    async fn lookup_email(&self, user_id: &UserId) -> anyhow::Result<Option<String>> {
        let user = self.users.get(user_id).await?;
        Ok(user.map(|user| user.email))
    }
}
