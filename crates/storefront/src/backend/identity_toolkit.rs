//! Identity Toolkit REST client (email/password accounts).

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use fantasia_core::{Email, UserId};

use super::identity::{AuthUser, IdentityError, IdentityProvider};
use crate::config::FirebaseConfig;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the Identity Toolkit `accounts:*` endpoints.
#[derive(Clone)]
pub struct IdentityToolkitClient {
    inner: Arc<IdentityToolkitInner>,
}

struct IdentityToolkitInner {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl IdentityToolkitClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            inner: Arc::new(IdentityToolkitInner {
                client: reqwest::Client::new(),
                base_url: config.identity_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
            }),
        }
    }

    /// POST `body` to `accounts:{method}` and parse the response.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, IdentityError> {
        let url = format!("{}/accounts:{method}", self.inner.base_url);
        let response = self
            .inner
            .client
            .post(&url)
            .query(&[("key", self.inner.api_key.expose_secret())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // The service reports failures as {"error": {"message": "CODE"}}
            return match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => {
                    debug!(method, code = %envelope.error.message, "Identity provider rejected request");
                    Err(IdentityError::rejected(envelope.error.message))
                }
                Err(_) => {
                    warn!(method, status = %status, "Identity provider returned unexpected error body");
                    Err(IdentityError::Unexpected(format!("HTTP {status}")))
                }
            };
        }

        serde_json::from_str(&text).map_err(|e| IdentityError::Unexpected(e.to_string()))
    }

    fn to_user(response: AccountResponse, fallback: &Email) -> AuthUser {
        let email = response
            .email
            .as_deref()
            .and_then(|e| Email::parse(e).ok())
            .unwrap_or_else(|| fallback.clone());
        AuthUser {
            uid: UserId::new(response.local_id),
            email,
            id_token: SecretString::from(response.id_token),
        }
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkitClient {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, IdentityError> {
        let body = json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
            "returnSecureToken": true
        });
        let response: AccountResponse = self.call("signInWithPassword", &body).await?;
        Ok(Self::to_user(response, email))
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, IdentityError> {
        let body = json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
            "returnSecureToken": true
        });
        let response: AccountResponse = self.call("signUp", &body).await?;
        Ok(Self::to_user(response, email))
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn send_password_reset(&self, email: &Email) -> Result<(), IdentityError> {
        let body = json!({
            "requestType": "PASSWORD_RESET",
            "email": email.as_str()
        });
        let _: Value = self.call("sendOobCode", &body).await?;
        Ok(())
    }
}
