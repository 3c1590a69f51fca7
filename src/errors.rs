//! Error types for the connection pool

use thiserror::Error;

/// Failure to establish or upgrade a physical connection.
#[derive(Error, Debug, Clone)]
pub enum ConnectError {
    #[error("i/o error connecting to {host}:{port}: {message}")]
    Io {
        host: String,
        port: u16,
        message: String,
    },

    #[error("transport upgrade failed: {0}")]
    TlsUpgrade(String),
}

/// Failure of a protocol bind operation.
///
/// Carries the LDAP result code reported by the server (for example 49,
/// `invalidCredentials`).
#[derive(Error, Debug, Clone)]
#[error("bind failed with result code {code}: {message}")]
pub struct BindError {
    pub code: u32,
    pub message: String,
}

impl BindError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    #[error("connection failed: {0}")]
    Connect(#[from] ConnectError),

    #[error("bind failed: {0}")]
    Bind(#[from] BindError),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid pool configuration: {0}")]
    Config(String),

    #[error("internal pool state fault: {0}")]
    Internal(String),
}

pub type PoolResult<T> = Result<T, PoolError>;
