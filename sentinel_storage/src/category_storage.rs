use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use sentinel_models::{
    category::{Category, CategoryId, NewCategory, UpdateCategory},
    user::UserId,
};

use crate::StorageError;

/// Per-user categories. Categories owned by another user behave as missing.
#[async_trait]
pub trait CategoryStorage: Send + Sync {
    async fn get_all_user_categories(&self, user_id: &UserId)
    -> Result<Vec<Category>, StorageError>;
    async fn insert(&self, user_id: &UserId, category: NewCategory)
    -> Result<Category, StorageError>;
    async fn update(
        &self,
        user_id: &UserId,
        id: &CategoryId,
        update: UpdateCategory,
    ) -> Result<Category, StorageError>;
    async fn delete(&self, user_id: &UserId, id: &CategoryId) -> Result<Category, StorageError>;
}

#[derive(Default)]
pub struct InMemoryCategoryStorage {
    store: RwLock<(u64, HashMap<CategoryId, Category>)>,
}

impl InMemoryCategoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryStorage for InMemoryCategoryStorage {
    async fn get_all_user_categories(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Category>, StorageError> {
        let store = self.store.read().await;
        let mut categories: Vec<Category> = store
            .1
            .values()
            .filter(|category| &category.user_id == user_id)
            .cloned()
            .collect();

        categories.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(categories)
    }

    async fn insert(
        &self,
        user_id: &UserId,
        category: NewCategory,
    ) -> Result<Category, StorageError> {
        let mut store = self.store.write().await;
        store.0 += 1;
        let id = format!("category-{}", store.0);
        let now = Utc::now();

        let category = Category {
            id: id.clone(),
            user_id: user_id.clone(),
            name: category.name,
            color: category.color,
            created_at: now,
            updated_at: now,
        };

        store.1.insert(id.clone(), category.clone());
        log::debug!("Inserted category. [category_id = {id}, user_id = {user_id}]");
        Ok(category)
    }

    async fn update(
        &self,
        user_id: &UserId,
        id: &CategoryId,
        update: UpdateCategory,
    ) -> Result<Category, StorageError> {
        if update.is_empty() {
            return Err(StorageError::EmptyUpdate);
        }

        let mut store = self.store.write().await;
        let category = store
            .1
            .get_mut(id)
            .filter(|category| &category.user_id == user_id)
            .ok_or_else(|| StorageError::CategoryNotFound(id.clone()))?;

        if let Some(name) = update.name {
            category.name = name;
        }
        if let Some(color) = update.color {
            category.color = color;
        }
        category.updated_at = Utc::now();

        Ok(category.clone())
    }

    async fn delete(&self, user_id: &UserId, id: &CategoryId) -> Result<Category, StorageError> {
        let mut store = self.store.write().await;
        let owned = store
            .1
            .get(id)
            .is_some_and(|category| &category.user_id == user_id);
        if !owned {
            return Err(StorageError::CategoryNotFound(id.clone()));
        }

        store
            .1
            .remove(id)
            .ok_or_else(|| StorageError::CategoryNotFound(id.clone()))
    }
}
