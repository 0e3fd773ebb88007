use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use super::{build_http_client, ClientError, ProfileStore};
use crate::models::ProfileSnapshot;

/// Profile record as the profile service returns it.
#[derive(Debug, Deserialize)]
struct ProfileRecord {
    #[serde(alias = "user_id", alias = "id")]
    identity: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
    #[serde(alias = "avatar")]
    avatar_url: Option<String>,
}

impl From<ProfileRecord> for ProfileSnapshot {
    fn from(record: ProfileRecord) -> Self {
        ProfileSnapshot {
            identity: record.identity,
            first_name: record.first_name,
            last_name: record.last_name,
            bio: record.bio,
            avatar_url: record.avatar_url,
        }
    }
}

/// Calls `GET {base}/api/v1/profiles/{identity}`.
#[derive(Clone)]
pub struct HttpProfileClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProfileClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProfileStore for HttpProfileClient {
    async fn get_profile(&self, identity: Uuid) -> Result<ProfileSnapshot, ClientError> {
        let url = format!("{}/api/v1/profiles/{}", self.base_url, identity);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            status if status.is_success() => {
                let record: ProfileRecord = response.json().await?;
                if record.identity != identity {
                    return Err(ClientError::InvalidResponse(format!(
                        "asked for profile {} but received {}",
                        identity, record.identity
                    )));
                }
                Ok(record.into())
            }
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            status => Err(ClientError::Status(status.as_u16())),
        }
    }
}
