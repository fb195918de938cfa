pub mod analytics;
pub mod categories;
pub mod config;
pub mod logging;
pub mod screen;
pub mod session;
pub mod storage;

pub use crate::config::AppConfig;
pub use crate::session::Session;
