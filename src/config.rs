use crate::errors::{AppError, Result};
use std::path::PathBuf;

/// Process configuration, read once at startup and handed to components as
/// constructor dependencies.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub database_path: String,
    pub upload_root: PathBuf,
    pub max_body_bytes: usize,
    pub rate_limit_per_sec: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Config("JWT_SECRET must be set in environment".to_string()))?;

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "veriflow.db".to_string());

        let upload_root = std::env::var("UPLOAD_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("PrivateUploads"));

        // Aggregate multipart ceiling; individual evidence files are capped
        // separately at 50 MiB by the vault.
        let max_body_bytes = std::env::var("MAX_BODY_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(200_000_000);

        let rate_limit_per_sec = std::env::var("RATE_LIMIT_PER_SEC")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            port,
            jwt_secret,
            database_path,
            upload_root,
            max_body_bytes,
            rate_limit_per_sec,
        })
    }
}
