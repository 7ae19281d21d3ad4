use thiserror::Error;

use crate::models::Role;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("insight '{0}' does not exist")]
    NotFound(String),

    #[error("role '{role}' may not view insight '{insight}'")]
    Forbidden { insight: String, role: Role },

    /// A registration defect: the registry or an insight definition is wrong.
    #[error("insight configuration defect: {0}")]
    Configuration(String),

    #[error("store query failed: {0}")]
    Store(#[from] sqlx::Error),
}

impl InsightError {
    /// Whether the caller caused this error, as opposed to the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Forbidden { .. })
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;
