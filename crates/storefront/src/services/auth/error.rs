//! Authentication error types.

use thiserror::Error;

use fantasia_core::{EmailError, PasswordError};

use crate::backend::IdentityError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Registration password refused by the local policy.
    #[error("password validation failed: {0}")]
    Password(#[from] PasswordError),

    /// The identity provider refused or failed the request.
    #[error("identity provider error: {0}")]
    Provider(#[from] IdentityError),
}

impl AuthError {
    /// Whether the error was caught before contacting the provider.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidEmail(_) | Self::Password(_))
    }

    /// Message shown next to the form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Informe um e-mail válido.".to_string(),
            Self::Password(PasswordError::TooShort { min }) => {
                format!("A senha deve ter pelo menos {min} caracteres.")
            }
            Self::Password(PasswordError::MissingSpecialCharacter) => {
                "A senha deve conter pelo menos um caractere especial.".to_string()
            }
            Self::Password(PasswordError::Mismatch) => "As senhas não coincidem.".to_string(),
            Self::Provider(err) => err.user_message(),
        }
    }
}
