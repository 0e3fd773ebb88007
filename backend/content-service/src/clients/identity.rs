use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use super::{build_http_client, ClientError, IdentityVerifier};

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user_id: Uuid,
}

/// Calls `GET {base}/api/v1/auth/verify` with the caller's bearer credential.
#[derive(Clone)]
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    verify_url: String,
}

impl HttpIdentityVerifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            verify_url: format!("{}/api/v1/auth/verify", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<Uuid, ClientError> {
        let response = self
            .client
            .get(&self.verify_url)
            .bearer_auth(credential)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let body: VerifyResponse = response.json().await?;
                Ok(body.user_id)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Rejected),
            status => Err(ClientError::Status(status.as_u16())),
        }
    }
}
