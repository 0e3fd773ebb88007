//! Collaborator clients
//!
//! The identity and profile services are reached over HTTP. Services depend
//! on the traits only, so tests substitute in-process fakes.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ProfileSnapshot;

mod identity;
mod profile;

pub use identity::HttpIdentityVerifier;
pub use profile::HttpProfileClient;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The collaborator answered and said no
    #[error("credential rejected")]
    Rejected,

    #[error("not found")]
    NotFound,

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Rejected => "rejected",
            ClientError::NotFound => "not_found",
            ClientError::Timeout => "timeout",
            ClientError::Transport(_) => "transport",
            ClientError::Status(_) => "status",
            ClientError::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Opaque credential to stable identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Uuid, ClientError>;
}

/// Identity-keyed profile lookups.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, identity: Uuid) -> Result<ProfileSnapshot, ClientError>;
}

fn build_http_client(timeout: std::time::Duration) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClientError::Transport(e.to_string()))
}
