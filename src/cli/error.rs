//! CLI-specific error types

use reserved_namespaces::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Validation(_) => 2,
            CliError::Service(ServiceError::NotFound(_)) => 3,
            CliError::Service(ServiceError::AlreadyExists(_))
            | CliError::Service(ServiceError::Conflict(_)) => 4,
            CliError::Service(ServiceError::InvalidArgument(_)) => 2,
            CliError::Io(_) | CliError::Service(_) => 1,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
