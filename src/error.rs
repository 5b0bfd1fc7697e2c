use crate::database::DatabaseError;
use rust_decimal::Decimal;
use sqlx::Error as SqlxError;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database errors
    #[error("SQL error: {0}")]
    Sqlx(#[from] SqlxError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or out-of-range request; rejected before any mutation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No plan matches the given identifier
    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Currency is not in the active rate table
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Requested amount falls outside the plan's inclusive range
    #[error("Amount {requested} outside plan range [{min}, {max}]")]
    AmountOutOfRange {
        requested: Decimal,
        min: Decimal,
        max: Decimal,
    },

    /// Ledger-level insufficiency; the creation workflow absorbs this into
    /// a PENDING outcome rather than surfacing it to the caller
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    /// Storage failure during a multi-step mutation; compensation has
    /// already run by the time this surfaces
    #[error("Transaction failed during {step}: {source}")]
    TransactionFailed {
        step: String,
        #[source]
        source: Box<AppError>,
    },

    /// Idempotency short-circuit; a no-op signal, not a failure
    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    /// Partial or duplicate state detected during the cycle; logged for
    /// out-of-band reconciliation, never halts the batch
    #[error("Data integrity warning: {0}")]
    DataIntegrity(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Wrap an error that aborted a saga step after compensation ran
    pub fn transaction_failed(step: &str, source: AppError) -> Self {
        AppError::TransactionFailed {
            step: step.to_string(),
            source: Box::new(source),
        }
    }

    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::PlanNotFound(_))
    }

    /// Check if error is the idempotency no-op signal
    pub fn is_already_processed(&self) -> bool {
        matches!(self, AppError::AlreadyProcessed(_))
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) | AppError::PlanNotFound(_) => 404,
            AppError::InvalidInput(_)
            | AppError::UnknownCurrency(_)
            | AppError::AmountOutOfRange { .. } => 400,
            AppError::InsufficientFunds { .. } => 409,
            AppError::AlreadyProcessed(_) => 409,
            AppError::Config(_) => 500,
            AppError::Database(_) | AppError::Sqlx(_) => 500,
            _ => 500,
        }
    }
}

/// Repository-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database query error
    #[error("Query error: {0}")]
    Query(SqlxError),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Duplicate record (unique-constraint violation)
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Balance too low to cover the requested debit
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Query(e) => AppError::Sqlx(e),
            RepositoryError::Duplicate(msg) => AppError::AlreadyProcessed(msg),
            RepositoryError::ConstraintViolation(msg) => AppError::DataIntegrity(msg),
            RepositoryError::InvalidInput(msg) => AppError::InvalidInput(msg),
            RepositoryError::InsufficientFunds {
                available,
                requested,
            } => AppError::InsufficientFunds {
                available,
                requested,
            },
        }
    }
}

impl From<SqlxError> for RepositoryError {
    fn from(err: SqlxError) -> Self {
        match &err {
            SqlxError::RowNotFound => RepositoryError::NotFound("Record not found".to_string()),
            SqlxError::Database(db_err) => {
                // Check for common PostgreSQL error codes
                let code = db_err.code().map(|c| c.to_string());
                if code.as_deref() == Some("23505") {
                    // Unique violation
                    RepositoryError::Duplicate(db_err.message().to_string())
                } else if code.as_deref() == Some("23503") {
                    // Foreign key violation
                    RepositoryError::ConstraintViolation(db_err.message().to_string())
                } else if code.as_deref() == Some("23514") {
                    // Check constraint violation
                    RepositoryError::ConstraintViolation(db_err.message().to_string())
                } else {
                    RepositoryError::Query(err)
                }
            }
            _ => RepositoryError::Query(err),
        }
    }
}

/// Result type alias for repository errors
pub type RepoResult<T> = Result<T, RepositoryError>;
