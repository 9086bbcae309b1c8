use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned HTTP {0}")]
    ApiStatus(reqwest::StatusCode),

    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("No cached devotional with id {0}")]
    DevotionalNotFound(i64),

    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Transport or remote API failure (connection, timeout, bad status, bad body).
    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Http(_) | AppError::ApiStatus(_))
    }

    /// Local storage engine failure.
    pub fn is_storage(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Sqlite(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
