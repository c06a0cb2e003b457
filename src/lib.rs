pub mod config;
pub mod console;
pub mod errors;
pub mod format;
pub mod models;
pub mod services;

// Always available for integration tests but marked as test-only
#[cfg(any(test, debug_assertions))]
pub mod test_utils;

pub use config::AppConfig;
pub use errors::{ApiError, ApiResult};
