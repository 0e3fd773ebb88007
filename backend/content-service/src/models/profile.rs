use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read-only view of a profile, embedded wherever an identity is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub identity: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileSnapshot {
    /// Stand-in used when the profile could not be resolved.
    pub fn placeholder(identity: Uuid) -> Self {
        Self {
            identity,
            first_name: None,
            last_name: None,
            bio: None,
            avatar_url: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
    }
}
