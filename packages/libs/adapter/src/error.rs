//! Adapter 에러 타입

/// Adapter 에러
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("connection failure: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("table '{table}' is missing or unreadable: {source}")]
    TableMissing {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("core error: {0}")]
    Core(#[from] rk_core::Error),
}

impl AdapterError {
    /// 에러 코드 (호출자용)
    pub fn code(&self) -> &'static str {
        match self {
            AdapterError::Connection(_) => "CONNECTION_FAILURE",
            AdapterError::TableMissing { .. } => "TABLE_MISSING",
            AdapterError::Config { .. } => "INVALID_CONFIG",
            AdapterError::Storage(_) => "STORAGE_FAILURE",
            AdapterError::Core(e) => e.code(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        AdapterError::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
