use async_trait::async_trait;
use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// IdentityProvider
///
/// Account creation in the external auth service. The local profile row is
/// keyed by the id this returns.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Uuid>;
}

#[derive(Debug, Deserialize)]
struct SignupResponse {
    // GoTrue returns the user either at the top level or under "user".
    id: Option<Uuid>,
    user: Option<SignupUser>,
}

#[derive(Debug, Deserialize)]
struct SignupUser {
    id: Uuid,
}

/// SupabaseIdentity
///
/// Calls `POST {url}/auth/v1/signup` with the project API key.
pub struct SupabaseIdentity {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseIdentity {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Uuid> {
        let response = self
            .client
            .post(format!("{}/auth/v1/signup", self.base_url))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            // Duplicate email, weak password and similar are the caller's problem.
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "signup rejected by identity provider");
            return Err(AppError::invalid("the identity provider rejected this account"));
        }
        if !status.is_success() {
            return Err(AppError::AuthProvider(format!("signup returned {status}")));
        }

        let parsed = response
            .json::<SignupResponse>()
            .await
            .map_err(|e| AppError::AuthProvider(e.to_string()))?;
        parsed
            .user
            .map(|u| u.id)
            .or(parsed.id)
            .ok_or_else(|| AppError::AuthProvider("signup response carried no user id".to_string()))
    }
}

/// MockIdentity
///
/// Issues fresh ids and remembers the emails it has seen; a repeated email is
/// rejected like the real provider would.
#[derive(Default)]
pub struct MockIdentity {
    pub should_fail: bool,
    seen: Mutex<Vec<String>>,
}

impl MockIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn sign_up(&self, email: &str, _password: &str) -> AppResult<Uuid> {
        if self.should_fail {
            return Err(AppError::AuthProvider("Mock Identity Error: Simulation requested".to_string()));
        }
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        if seen.iter().any(|e| e == email) {
            return Err(AppError::invalid("the identity provider rejected this account"));
        }
        seen.push(email.to_string());
        Ok(Uuid::new_v4())
    }
}

pub type IdentityState = Arc<dyn IdentityProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_rejects_a_repeated_email() {
        let identity = MockIdentity::new();
        let first = identity.sign_up("c1@example.org", "password123").await.unwrap();
        let second = identity.sign_up("c2@example.org", "password123").await.unwrap();
        assert_ne!(first, second);

        let again = identity.sign_up("c1@example.org", "password123").await;
        assert!(matches!(again, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn failing_mock_is_a_provider_error() {
        let result = MockIdentity::new_failing().sign_up("x@example.org", "password123").await;
        assert!(matches!(result, Err(AppError::AuthProvider(_))));
    }
}
