//! Error taxonomy for store and auth operations.
//!
//! Lookups that miss are `Ok(None)`, never an error.

use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input violates a store-level constraint (required, min length, unique).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Missing or invalid credential where one is required.
    #[error("{0}")]
    Authentication(String),

    /// Arguments rejected by a resolver (wrong credentials, unknown name).
    #[error("{0}")]
    UserInput(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// A stored row could not be mapped back into the domain model.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub fn not_authenticated() -> Self {
        Self::Authentication("not authenticated".to_string())
    }

    pub fn wrong_credentials() -> Self {
        Self::UserInput("wrong credentials".to_string())
    }

    pub fn not_found() -> Self {
        Self::UserInput("not found".to_string())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}
