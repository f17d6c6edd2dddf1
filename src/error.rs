use thiserror::Error;

/// Failures produced by [`crate::UserStore`] operations.
///
/// Every variant is a deterministic outcome of evaluating the input against
/// the current store contents; none of them is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Malformed or missing input (bad id format, empty fields, empty patch).
    #[error("{0}")]
    InvalidArgument(String),

    /// The referenced user is not live.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness constraint would be violated.
    #[error("{0}")]
    Conflict(String),
}

impl StoreError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn user_not_found(id: u64) -> Self {
        Self::NotFound(format!("User with id {id} not found"))
    }

    pub fn email_taken() -> Self {
        Self::Conflict("A user with this email already exists".to_string())
    }

    /// Short machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::InvalidArgument(_) => "invalid_argument",
            StoreError::NotFound(_) => "not_found",
            StoreError::Conflict(_) => "conflict",
        }
    }
}
