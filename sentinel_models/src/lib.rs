pub mod category;
pub mod email;
pub mod settings;
pub mod task;
pub mod user;

pub use chrono;
