//! Error types for ssd-core
//!
//! Storage failures are split into two reportable categories: the service
//! received the request and rejected it, or the request never reached the
//! service. Everything else is fatal to a run.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for ssd-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of the HTTP exchange a service error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorType {
    /// The request was invalid (4xx)
    Client,
    /// The service failed to process a valid request (5xx)
    Service,
    /// No status was available
    Unknown,
}

impl ErrorType {
    /// Classify by HTTP status code
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(400..=499) => Self::Client,
            Some(500..=599) => Self::Service,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => f.write_str("Client"),
            Self::Service => f.write_str("Service"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

/// A request that reached the storage service and was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceError {
    pub message: String,
    pub status_code: Option<u16>,
    pub error_code: Option<String>,
    pub error_type: ErrorType,
    pub request_id: Option<String>,
}

impl ServiceError {
    pub fn new(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            message: message.into(),
            status_code,
            error_code: None,
            error_type: ErrorType::from_status(status_code),
            request_id: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Whether the service reported a missing bucket or object
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.error_code.as_deref(),
            Some("NoSuchKey" | "NoSuchBucket" | "NotFound")
        ) || self.status_code == Some(404)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.error_code {
            write!(f, " ({code})")?;
        }
        Ok(())
    }
}

/// Coarse error category, used to decide whether a failure is reported or fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Service,
    Client,
    Io,
    Config,
}

/// Error types for ssd-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The service processed and rejected the request
    #[error("Service error: {0}")]
    Service(Box<ServiceError>),

    /// The request never reached the service
    #[error("Client error: {0}")]
    Client(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bucket name rejected before any request was made
    #[error("Invalid bucket name: {0}")]
    InvalidBucketName(String),

    /// Alias not found
    #[error("Alias not found: {0}")]
    AliasNotFound(String),

    /// Alias already exists
    #[error("Alias already exists: {0}")]
    AliasExists(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<ServiceError> for Error {
    fn from(err: ServiceError) -> Self {
        Error::Service(Box::new(err))
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Service(_) => ErrorKind::Service,
            Error::Client(_) => ErrorKind::Client,
            Error::Io(_) => ErrorKind::Io,
            _ => ErrorKind::Config,
        }
    }

    /// True for failures the workflow reports instead of propagating
    pub fn is_reportable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Service | ErrorKind::Client)
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Service(err) => err.is_not_found(),
            Error::AliasNotFound(_) => true,
            _ => false,
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidBucketName(_) | Error::InvalidUrl(_) => 2, // UsageError
            Error::Client(_) => 3,                                                      // NetworkError
            Error::AliasNotFound(_) => 5,                                               // NotFound
            Error::AliasExists(_) => 6,                                                 // Conflict
            Error::Service(err) => match err.status_code {
                Some(401 | 403) => 4,
                _ if err.is_not_found() => 5,
                Some(409 | 412) => 6,
                _ => 1,
            },
            _ => 1, // GeneralError
        }
    }
}
