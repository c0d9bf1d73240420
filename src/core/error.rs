use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetridexError {
    #[error("Metadata store error: {0}")]
    Store(String),

    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid metric record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Reference not found: {0}")]
    RefNotFound(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Async task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for Metridex operations
pub type Result<T> = std::result::Result<T, MetridexError>;

impl MetridexError {
    /// Creates a new store error
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Self::Store(msg.into())
    }

    /// Creates a new pattern error
    pub fn pattern<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPattern(msg.into())
    }

    /// Creates a new record error
    pub fn record<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRecord(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(_) => true,
            Self::Io(_) => true,
            _ => false,
        }
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Store(_) => "store",
            Self::InvalidPattern(_) => "pattern",
            Self::InvalidRecord(_) | Self::RefNotFound(_) => "validation",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Join(_) => "async",
        }
    }
}
