/// Errors surfaced by the insight engine and its storage adapters.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("student {0} not found")]
    StudentNotFound(String),

    #[error("unrecognised risk level: {0}")]
    InvalidRiskLevel(String),

    #[error("unrecognised growth status: {0}")]
    InvalidGrowthStatus(String),

    #[error("student {student_id} has a non-finite {field}")]
    NonFiniteValue {
        student_id: String,
        field: &'static str,
    },

    #[error("database error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
