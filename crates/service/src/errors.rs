use thiserror::Error;

use models::errors::ModelError;

#[derive(Debug, Error, PartialEq)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no reviews stored")]
    EmptyCollection,
    #[error("deleting reviews is disabled")]
    DeletionDisabled,
    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn not_found(id: &str) -> Self {
        Self::NotFound(format!("a review with id={id} not found"))
    }

    /// Lookup miss during `update_review`.
    pub fn update_not_found(id: &str) -> Self {
        Self::NotFound(format!("Couldn't update a review with id={id}. Review not found"))
    }

    pub fn already_exists(id: &str) -> Self {
        Self::AlreadyExists(format!("a review with id={id} already exists"))
    }

    pub fn storage(e: impl std::fmt::Display) -> Self { Self::Storage(e.to_string()) }

    /// Prefix a storage failure with the write that triggered it; other kinds pass through.
    pub fn during(self, action: &str) -> Self {
        match self {
            Self::Storage(msg) => Self::Storage(format!("Failed to {action} the review: {msg}")),
            other => other,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::AlreadyExists(_) => "already_exists",
            ServiceError::InvalidArgument(_) => "invalid_argument",
            ServiceError::EmptyCollection => "empty_collection",
            ServiceError::DeletionDisabled => "deletion_disabled",
            ServiceError::Storage(_) => "storage",
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => ServiceError::Validation(msg),
        }
    }
}
