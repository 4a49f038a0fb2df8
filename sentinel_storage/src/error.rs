use sentinel_models::{category::CategoryId, task::TaskId, user::UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Task {0} does not exist")]
    TaskNotFound(TaskId),

    #[error("Category {0} does not exist")]
    CategoryNotFound(CategoryId),

    #[error("Update does not change any field")]
    EmptyUpdate,

    #[error("User {0} already exists")]
    DuplicateUserId(UserId),

    #[error("User with email {0} already exists")]
    DuplicateEmail(String),
}
