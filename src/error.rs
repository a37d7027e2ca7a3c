use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("{entity_type} already exists: {identifier}")]
    AlreadyExists {
        entity_type: String,
        identifier: String,
    },

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("{field} cannot be blank")]
    BlankField { field: String },

    #[error("{field} must be at least {min} characters long")]
    TooShort { field: String, min: usize },

    #[error("{field} must be positive")]
    NonPositive { field: String },

    #[error("{field} cannot be negative")]
    Negative { field: String },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} cannot be empty")]
    EmptySet { field: String },

    #[error("{field} is required")]
    MissingField { field: String },

    #[error("Start date must be before end date")]
    InvalidDateRange,

    #[error("Minimum age cannot be greater than maximum age")]
    InvalidAgeRange,

    #[error("New visitors can only be recorded on Sundays ({0} is not a Sunday)")]
    NotSunday(NaiveDate),

    #[error("{field} must be in the future")]
    NotInFuture { field: String },

    #[error("You cannot add yourself as co-leader")]
    SelfCoLeader,

    #[error("Co-leader must be of a different gender")]
    SameGenderCoLeader,

    #[error("Gender cannot change while you {0}")]
    GenderLocked(String),

    #[error("A group can have at most {max} leaders")]
    TooManyLeaders { max: usize },

    #[error("You already belong to a group")]
    AlreadyInGroup,

    #[error("You are already a member of this group")]
    AlreadyMember,

    #[error("Data integrity error: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        AppError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        AppError::Forbidden(reason.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
