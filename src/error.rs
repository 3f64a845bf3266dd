use thiserror::Error;

pub type AppResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// Frame that is not a valid envelope
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigErrorKind {
    #[error("failed to read file: {0}")]
    Read(std::io::Error),

    #[error("failed to parse file: {0}")]
    Parse(toml::de::Error),

    #[error("no usable data directory among {0}")]
    NoDataDir(String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: std::path::PathBuf,
        #[source]
        source: ConfigErrorKind,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a username was refused at registration. The `Display` text is sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("empty")]
    Empty,
    #[error("too long")]
    TooLong,
    #[error("leading or trailing whitespace")]
    Whitespace,
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("user not found")]
    UserNotFound,
    #[error("invalid password")]
    InvalidPassword,
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),
    #[error("user already exists")]
    AlreadyExists,
    #[error("internal error: {0}")]
    InternalError(String),
}
