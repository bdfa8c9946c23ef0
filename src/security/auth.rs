//! Relay key authentication.
//!
//! The gateway relay is the only intended client of the API. It presents a
//! shared key as `Authorization: Bearer <key>`.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::warn;

const KEY_PREFIX: &str = "cb_";
const KEY_RANDOM_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Whether authentication is enabled.
    pub enabled: bool,
    /// Prefix in front of the key in the header (default: "Bearer ").
    pub prefix: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "Bearer ".to_string(),
        }
    }
}

impl AuthConfig {
    /// Create a disabled auth config (for development).
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Thread-safe set of accepted relay keys.
#[derive(Debug)]
pub struct RelayKeyStore {
    keys: RwLock<HashSet<String>>,
    config: AuthConfig,
}

impl RelayKeyStore {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            keys: RwLock::new(HashSet::new()),
            config,
        }
    }

    /// Create a store with authentication disabled.
    pub fn disabled() -> Self {
        Self::new(AuthConfig::disabled())
    }

    pub fn add_key(&self, key: impl Into<String>) {
        if let Ok(mut keys) = self.keys.write() {
            keys.insert(key.into());
        }
    }

    pub fn remove_key(&self, key: &str) -> bool {
        self.keys
            .write()
            .map(|mut keys| keys.remove(key))
            .unwrap_or(false)
    }

    pub fn is_valid(&self, key: &str) -> bool {
        self.keys
            .read()
            .map(|keys| keys.contains(key))
            .unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.keys.read().map(|k| k.len()).unwrap_or(0)
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Pull the key out of an `Authorization` header value.
    pub fn extract_key<'a>(&self, header_value: &'a str) -> Option<&'a str> {
        header_value.strip_prefix(self.config.prefix.as_str())
    }
}

impl Default for RelayKeyStore {
    fn default() -> Self {
        Self::new(AuthConfig::default())
    }
}

/// Reject requests without a valid relay key. `/health` is always open.
pub async fn relay_auth_middleware(
    State(store): State<Arc<RelayKeyStore>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !store.is_enabled() || request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|header| store.extract_key(header))
        .is_some_and(|key| store.is_valid(key));

    if authorized {
        Ok(next.run(request).await)
    } else {
        warn!(path = %request.uri().path(), "Rejected request without a valid relay key");
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Generate a random relay key: `cb_` followed by 32 alphanumerics.
pub fn generate_relay_key() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{KEY_PREFIX}{random}")
}
