//! Registration password policy.

use secrecy::{ExposeSecret, SecretString};

/// Reasons a registration password is refused before reaching the
/// identity provider.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Fewer characters than [`NewPassword::MIN_LENGTH`].
    #[error("password must be at least {min} characters")]
    TooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// Only letters and digits.
    #[error("password must contain at least one special character")]
    MissingSpecialCharacter,
    /// Password and confirmation differ.
    #[error("passwords do not match")]
    Mismatch,
}

/// A password that passed the registration policy.
///
/// The policy requires at least six characters, at least one character that
/// is neither a letter nor a digit, and an identical confirmation.
pub struct NewPassword(SecretString);

impl NewPassword {
    /// Minimum password length in characters.
    pub const MIN_LENGTH: usize = 6;

    /// Validate a password and its confirmation.
    ///
    /// Checks run in order: length, special character, confirmation.
    ///
    /// # Errors
    ///
    /// Returns the first [`PasswordError`] the input violates.
    pub fn parse(password: &str, confirmation: &str) -> Result<Self, PasswordError> {
        if password.chars().count() < Self::MIN_LENGTH {
            return Err(PasswordError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if password.chars().all(char::is_alphanumeric) {
            return Err(PasswordError::MissingSpecialCharacter);
        }
        if password != confirmation {
            return Err(PasswordError::Mismatch);
        }
        Ok(Self(SecretString::from(password.to_owned())))
    }

    /// Borrow the validated password.
    #[must_use]
    pub const fn secret(&self) -> &SecretString {
        &self.0
    }

    /// Expose the validated password for transmission to the provider.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl core::fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("NewPassword([REDACTED])")
    }
}
