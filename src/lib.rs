pub mod appsettings;
pub mod directory;
pub mod suggestions;
pub mod task_service;
