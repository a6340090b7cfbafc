// Error handling framework

use thiserror::Error;

/// Validation errors for caller-supplied data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Database-specific errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Invalid database configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate key violation: {0}")]
    DuplicateKey(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Migration {} failed: {}", step_label(.step), .cause)]
    MigrationFailed { step: Option<i64>, cause: String },
}

fn step_label(step: &Option<i64>) -> String {
    step.map(|v| v.to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// Lifecycle state machine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Illegal lifecycle transition from {from} to {to}")]
    IllegalTransition { from: &'static str, to: &'static str },
}

/// Errors surfaced by the catalog repository
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i32 },

    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl CatalogError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        CatalogError::NotFound { entity, id }
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::PersistenceUnavailable(_) => "persistence_unavailable",
            CatalogError::Validation(_) => "validation",
            CatalogError::NotFound { .. } => "not_found",
            CatalogError::Connection(_) => "connection",
            CatalogError::Database(_) => "database",
        }
    }
}

impl From<DatabaseError> for CatalogError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionFailed(msg) => CatalogError::Connection(msg),
            DatabaseError::DuplicateKey(msg) => {
                CatalogError::Validation(ValidationError::ConstraintViolation(msg))
            }
            other => CatalogError::Database(other.to_string()),
        }
    }
}

/// API response error type for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::new("VALIDATION_ERROR", err.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::PersistenceUnavailable(_) => {
                ApiError::new("PERSISTENCE_UNAVAILABLE", err.to_string())
            }
            CatalogError::Validation(inner) => inner.into(),
            CatalogError::NotFound { entity, id } => {
                ApiError::new("NOT_FOUND", format!("{} not found: {}", entity, id))
                    .with_details(serde_json::json!({ "entity": entity, "id": id }))
            }
            CatalogError::Connection(_) => ApiError::new("CONNECTION_ERROR", err.to_string()),
            CatalogError::Database(_) => ApiError::new("DATABASE_ERROR", err.to_string()),
        }
    }
}

// Implement From for common external errors
impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Check for specific database error codes
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateKey(db_err.message().to_string()),
                        "23503" => DatabaseError::ForeignKeyViolation(db_err.message().to_string()),
                        // invalid_authorization_specification / invalid_password
                        "28000" | "28P01" => {
                            DatabaseError::ConnectionFailed(db_err.message().to_string())
                        }
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => DatabaseError::ConnectionFailed(err.to_string()),
            sqlx::Error::Configuration(_) => DatabaseError::InvalidConfiguration(err.to_string()),
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}
