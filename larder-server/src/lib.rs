//! Larder Server - REST API for recipe records

pub mod config;
pub mod error;
pub mod routes;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, FieldError};
pub use routes::{build_router, AppState};
