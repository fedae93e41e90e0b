use std::collections::BTreeMap;

use models::errors::ModelError;
use thiserror::Error;

/// Field key used for errors that are not tied to a single input field.
pub const NON_FIELD: &str = "non_field_errors";

/// Validation messages grouped by field, rendered as `{"errors": {field: [..]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self { Self::default() }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, field: &str) -> Option<&[String]> { self.0.get(field).map(Vec::as_slice) }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<String>> { &self.0 }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.is_empty() { Ok(()) } else { Err(ServiceError::Validation(self)) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for m in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {m}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    /// Unique constraint rejected the write; callers usually rewrite this as a validation error.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// The payment provider refused or could not process a charge.
    #[error("{0}")]
    Gateway(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{entity} not found.")) }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("You do not have permission to perform this action.".into())
    }

    /// Stable numeric code for logs and metrics labels
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::Conflict(_) => 1002,
            ServiceError::NotFound(_) => 1003,
            ServiceError::Unauthenticated => 1004,
            ServiceError::InvalidCredentials => 1005,
            ServiceError::Forbidden(_) => 1006,
            ServiceError::Gateway(_) => 1101,
            ServiceError::Db(_) => 1200,
            ServiceError::Internal(_) => 1201,
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(m) => ServiceError::invalid(NON_FIELD, m),
            ModelError::NotFound(what) => ServiceError::not_found(&what),
            ModelError::Conflict(detail) => ServiceError::Conflict(detail),
            ModelError::Db(m) => ServiceError::Db(m),
        }
    }
}
