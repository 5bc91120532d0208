use crate::api::{ApiError, ApiFailure};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelSyncError {
    /// A remote call failed for a reason other than throttling
    #[error("Mattermost API error during {operation} (HTTP {status}): {source}")]
    Api {
        operation: String,
        status: u16,
        #[source]
        source: ApiError,
    },

    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    #[error("No teams available for user {0}")]
    NoTeams(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ChannelSyncError {
    pub fn api(operation: &str, failure: ApiFailure) -> Self {
        ChannelSyncError::Api {
            operation: operation.to_string(),
            status: failure.meta.status_code,
            source: failure.error,
        }
    }

    pub fn cancelled(operation: &str) -> Self {
        ChannelSyncError::Cancelled {
            operation: operation.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ChannelSyncError::Cancelled { .. })
    }

    /// HTTP status of the failed remote call, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ChannelSyncError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChannelSyncError>;
