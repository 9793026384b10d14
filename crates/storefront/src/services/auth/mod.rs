//! Authentication service.
//!
//! Email/password accounts live with the identity provider; this service
//! validates input locally and forwards the request.

mod error;

pub use error::AuthError;

use secrecy::SecretString;
use tracing::instrument;

use fantasia_core::{Email, NewPassword};

use crate::backend::{AuthUser, IdentityProvider};

/// Authentication service.
pub struct AuthService<'a> {
    identity: &'a dyn IdentityProvider,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(identity: &'a dyn IdentityProvider) -> Self {
        Self { identity }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::Provider` if the provider rejects the credentials.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = Email::parse(email)?;
        let password = SecretString::from(password.to_owned());
        Ok(self.identity.sign_in(&email, &password).await?)
    }

    /// Register a new account.
    ///
    /// The password must have at least six characters including one that is
    /// neither a letter nor a digit, and must match the confirmation. The
    /// new account is not signed in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::Password` for local
    /// validation failures (the provider is not contacted), or
    /// `AuthError::Provider` if the provider refuses the account.
    #[instrument(skip(self, password, confirmation))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<AuthUser, AuthError> {
        let email = Email::parse(email)?;
        let password = NewPassword::parse(password, confirmation)?;
        Ok(self.identity.sign_up(&email, password.secret()).await?)
    }

    /// Send a password-reset email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::Provider` if the provider refuses the request.
    #[instrument(skip(self))]
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        Ok(self.identity.send_password_reset(&email).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::MemoryIdentityProvider;

    #[tokio::test]
    async fn test_register_validates_before_provider() {
        let provider = MemoryIdentityProvider::new();
        let auth = AuthService::new(&provider);

        let err = auth.register("ana@example.com", "abc", "abc").await.unwrap_err();
        assert_eq!(err.user_message(), "A senha deve ter pelo menos 6 caracteres.");

        let err = auth
            .register("ana@example.com", "abcdef1", "abcdef1")
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            "A senha deve conter pelo menos um caractere especial."
        );

        let err = auth
            .register("ana@example.com", "abc#def", "abc#deg")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "As senhas não coincidem.");
        assert!(err.is_validation());

        // Nothing reached the provider
        assert!(auth.sign_in("ana@example.com", "abc#def").await.is_err());
    }

    #[tokio::test]
    async fn test_register_then_sign_in() {
        let provider = MemoryIdentityProvider::new();
        let auth = AuthService::new(&provider);

        let created = auth
            .register(" ana@example.com ", "abc#def", "abc#def")
            .await
            .unwrap();
        let user = auth.sign_in("ana@example.com", "abc#def").await.unwrap();
        assert_eq!(created.uid, user.uid);

        let err = auth
            .register("ana@example.com", "abc#def", "abc#def")
            .await
            .unwrap_err();
        assert!(!err.is_validation());
        assert_eq!(err.user_message(), "Este e-mail já está cadastrado.");
    }

    #[tokio::test]
    async fn test_reset_password_rejects_bad_email() {
        let provider = MemoryIdentityProvider::new();
        let auth = AuthService::new(&provider);
        let err = auth.reset_password("not-an-email").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));
    }
}
