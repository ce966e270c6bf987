//! Error types for pgbase

use thiserror::Error;

/// Result type alias for pgbase operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for condition parsing, CRUD helpers and query execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// A mutating operation was given an empty where-map.
    ///
    /// An empty map never means "every row" for update/delete/restore.
    #[error("Empty condition: {0} requires a non-empty where-map")]
    EmptyCondition(&'static str),

    /// Store/update/batch update was given nothing to write.
    #[error("Empty data: {0} requires at least one column")]
    EmptyData(&'static str),

    /// A where-map entry used an operator tag that is not recognized.
    #[error("Unknown operator '{operator}' for field '{field}'")]
    UnknownOperator { field: String, operator: String },

    /// A where-map entry has the wrong shape (bad operand, bad logic value, ...).
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid condition error
    pub fn invalid_condition(message: impl Into<String>) -> Self {
        Self::InvalidCondition(message.into())
    }

    /// Create an unknown operator error
    pub fn unknown_operator(field: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::UnknownOperator {
            field: field.into(),
            operator: operator.into(),
        }
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error was raised before any SQL ran (empty input).
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::EmptyCondition(_) | Self::EmptyData(_))
    }

    /// Parse a tokio_postgres error into a more specific OrmError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_condition_message_names_operation() {
        let err = OrmError::EmptyCondition("destroy");
        assert_eq!(
            err.to_string(),
            "Empty condition: destroy requires a non-empty where-map"
        );
        assert!(err.is_precondition());
    }

    #[test]
    fn unknown_operator_message() {
        let err = OrmError::unknown_operator("x", "bogus");
        assert_eq!(err.to_string(), "Unknown operator 'bogus' for field 'x'");
        assert!(!err.is_precondition());
    }

    #[test]
    fn not_found_helper() {
        assert!(OrmError::not_found("users").is_not_found());
        assert!(!OrmError::validation("bad").is_not_found());
    }
}
