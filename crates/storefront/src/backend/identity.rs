//! Identity provider port.

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use fantasia_core::{Email, UserId};

/// A user authenticated by the identity provider.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Provider-assigned user ID; also the key of the user's profile document.
    pub uid: UserId,
    /// Email the user signed in with.
    pub email: Email,
    /// Short-lived ID token issued by the provider.
    pub id_token: SecretString,
}

/// Errors returned by the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider refused the request with an error code
    /// (e.g. `EMAIL_EXISTS`, `INVALID_LOGIN_CREDENTIALS`).
    #[error("identity provider rejected request: {code}")]
    Rejected {
        /// Provider error code.
        code: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with something we could not parse.
    #[error("unexpected identity provider response: {0}")]
    Unexpected(String),
}

impl IdentityError {
    /// Build a rejection from a provider error code.
    #[must_use]
    pub fn rejected(code: impl Into<String>) -> Self {
        Self::Rejected { code: code.into() }
    }

    /// Message suitable for showing next to the form.
    ///
    /// Provider codes may carry a suffix (`"WEAK_PASSWORD : Password should
    /// be at least 6 characters"`); only the leading code is matched.
    #[must_use]
    pub fn user_message(&self) -> String {
        let Self::Rejected { code } = self else {
            return "Não foi possível contatar o serviço de autenticação. Tente novamente.".to_string();
        };
        let head = code.split(':').next().unwrap_or_default().trim();
        match head {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                "E-mail ou senha inválidos.".to_string()
            }
            "EMAIL_EXISTS" => "Este e-mail já está cadastrado.".to_string(),
            "INVALID_EMAIL" => "E-mail inválido.".to_string(),
            "USER_DISABLED" => "Esta conta foi desativada.".to_string(),
            "TOO_MANY_ATTEMPTS_TRY_LATER" => {
                "Muitas tentativas. Aguarde alguns minutos e tente novamente.".to_string()
            }
            "WEAK_PASSWORD" => "A senha é muito fraca.".to_string(),
            _ => format!("Erro: {code}"),
        }
    }
}

/// Operations the storefront needs from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password.
    async fn sign_in(&self, email: &Email, password: &SecretString)
    -> Result<AuthUser, IdentityError>;

    /// Create an account. The new account is not signed in by the storefront.
    async fn sign_up(&self, email: &Email, password: &SecretString)
    -> Result<AuthUser, IdentityError>;

    /// Ask the provider to email a password-reset link.
    async fn send_password_reset(&self, email: &Email) -> Result<(), IdentityError>;
}
