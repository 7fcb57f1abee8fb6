use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

// error taxonomy shared by every core operation
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Storage unavailable: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DashboardError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        DashboardError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, DashboardError::Storage(_))
    }
}
