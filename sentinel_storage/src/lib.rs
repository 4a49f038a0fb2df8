mod category_storage;
mod error;
mod task_storage;
mod user_storage;

pub use category_storage::{CategoryStorage, InMemoryCategoryStorage};
pub use error::StorageError;
pub use task_storage::{InMemoryTaskStorage, TaskStorage};
pub use user_storage::{InMemoryUserStorage, NewUser, UserStorage};
