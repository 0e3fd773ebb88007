//! In-process stand-ins for the identity and profile services.
//!
//! Both count calls so tests can assert how often a collaborator was hit.

use async_trait::async_trait;
use content_service::clients::{ClientError, IdentityVerifier, ProfileStore};
use content_service::models::ProfileSnapshot;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

const TOKEN_PREFIX: &str = "token-";

/// Credential the mock verifier accepts for `identity`.
pub fn token_for(identity: Uuid) -> String {
    format!("{}{}", TOKEN_PREFIX, identity)
}

/// Accepts `token-<uuid>` credentials and nothing else.
#[derive(Clone, Default)]
pub struct MockIdentityVerifier {
    calls: Arc<AtomicUsize>,
    unavailable: Arc<Mutex<bool>>,
}

impl MockIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Simulate the identity service being down.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }
}

#[async_trait]
impl IdentityVerifier for MockIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<Uuid, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if *self.unavailable.lock().unwrap() {
            return Err(ClientError::Transport("connection refused".to_string()));
        }

        credential
            .strip_prefix(TOKEN_PREFIX)
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or(ClientError::Rejected)
    }
}

/// Profile service fake with failure and latency injection.
#[derive(Clone, Default)]
pub struct MockProfileStore {
    profiles: Arc<Mutex<HashMap<Uuid, ProfileSnapshot>>>,
    failing: Arc<Mutex<HashSet<Uuid>>>,
    latency: Arc<Mutex<Option<Duration>>>,
    calls: Arc<Mutex<HashMap<Uuid, usize>>>,
}

impl MockProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile with a first name and return the identity.
    pub fn add(&self, first_name: &str) -> Uuid {
        let identity = Uuid::new_v4();
        self.put(ProfileSnapshot {
            first_name: Some(first_name.to_string()),
            last_name: Some("Tester".to_string()),
            bio: None,
            avatar_url: Some(format!("https://cdn.example.com/{}.png", identity)),
            identity,
        });
        identity
    }

    pub fn put(&self, snapshot: ProfileSnapshot) {
        self.profiles
            .lock()
            .unwrap()
            .insert(snapshot.identity, snapshot);
    }

    /// Lookups for `identity` fail with a transport error.
    pub fn fail_for(&self, identity: Uuid) {
        self.failing.lock().unwrap().insert(identity);
    }

    /// Every lookup sleeps this long first.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn calls_for(&self, identity: Uuid) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&identity)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl ProfileStore for MockProfileStore {
    async fn get_profile(&self, identity: Uuid) -> Result<ProfileSnapshot, ClientError> {
        *self.calls.lock().unwrap().entry(identity).or_insert(0) += 1;

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.lock().unwrap().contains(&identity) {
            return Err(ClientError::Transport("profile service down".to_string()));
        }

        self.profiles
            .lock()
            .unwrap()
            .get(&identity)
            .cloned()
            .ok_or(ClientError::NotFound)
    }
}
