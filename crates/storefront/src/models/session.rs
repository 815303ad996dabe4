//! Session-related types.
//!
//! Types stored in the session for authentication.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use sanital_core::{Role, UserId};

/// Session-stored user identity.
///
/// Carries the backend access token so later calls (orders, admin changes)
/// can be made on the user's behalf. The token never leaves the session
/// store and is redacted from `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's backend ID.
    pub id: UserId,
    /// User's email address.
    pub email: String,
    /// User's role.
    pub role: Role,
    token: String,
}

impl CurrentUser {
    #[must_use]
    pub fn new(id: UserId, email: impl Into<String>, role: Role, token: &SecretString) -> Self {
        use secrecy::ExposeSecret;

        Self {
            id,
            email: email.into(),
            role,
            token: token.expose_secret().to_string(),
        }
    }

    /// The backend access token.
    #[must_use]
    pub fn token(&self) -> SecretString {
        SecretString::from(self.token.clone())
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
