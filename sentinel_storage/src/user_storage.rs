use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use sentinel_models::user::{User, UserId};

use crate::StorageError;

pub struct NewUser {
    pub id: Option<UserId>,
    pub email: String,
}

#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn get(&self, id: &UserId) -> Result<Option<User>, StorageError>;
    async fn create(&self, new_user: NewUser) -> Result<User, StorageError>;
}

#[derive(Default)]
pub struct InMemoryUserStorage {
    store: RwLock<(u64, HashMap<UserId, User>)>,
}

impl InMemoryUserStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn get(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        let store = self.store.read().await;
        Ok(store.1.get(id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StorageError> {
        let mut store = self.store.write().await;
        if store
            .1
            .values()
            .any(|user| user.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(StorageError::DuplicateEmail(new_user.email));
        }

        let id = match new_user.id {
            Some(id) if store.1.contains_key(&id) => {
                return Err(StorageError::DuplicateUserId(id));
            }
            Some(id) => id,
            None => {
                store.0 += 1;
                format!("user-{}", store.0)
            }
        };

        let user = User {
            id: id.clone(),
            email: new_user.email,
            created_at: Utc::now(),
        };
        store.1.insert(id, user.clone());

        log::info!("Created user. [user_id = {}]", user.id);
        Ok(user)
    }
}
