use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Recurring expense input rejected on creation
    #[error("Invalid recurring expense: {0}")]
    InvalidTemplate(#[from] TemplateError),

    /// The requested row does not exist or was soft-deleted
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller does not own the row it tried to modify
    #[error("User {user_id} is not allowed to modify expense {expense_id}")]
    Forbidden { user_id: i32, expense_id: i32 },

    /// Input rejected before touching the database
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Reasons a recurring template is rejected before generation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("expense is not recurring")]
    NotRecurring,
    #[error("missing recurring frequency")]
    MissingFrequency,
    #[error("missing recurring start date")]
    MissingStartDate,
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("amount must be at least 0.01, got {0}")]
    AmountBelowMinimum(Decimal),
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title is longer than {max} characters")]
    TitleTooLong { max: usize },
    #[error(transparent)]
    UnknownFrequency(#[from] UnknownFrequency),
}

/// A frequency value that is not one of `daily`, `weekly`, `monthly`, `yearly`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown frequency '{0}'")]
pub struct UnknownFrequency(pub String);

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
