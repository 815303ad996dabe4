//! Authentication service.
//!
//! The backend owns accounts and issues access tokens; this service performs
//! the login and registration calls and derives the session identity from
//! the token's claims, asking the profile endpoint when the token lacks a
//! role.

mod error;

pub use error::AuthError;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use sanital_core::{Role, UserId, id_from_json};

use crate::backend::{BackendClient, BackendError, RegisterRequest};
use crate::models::CurrentUser;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// User id recorded when neither the token nor the profile carries one.
const UNKNOWN_USER_ID: &str = "unknown";

/// Claims read from the access token payload.
///
/// The signature is not verified here; the backend checks it on every call
/// made with the token.
#[derive(Debug, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Value,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Whether `exp` lies in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp
            .is_some_and(|exp| exp <= chrono::Utc::now().timestamp())
    }
}

/// Decode the payload segment of a JWT.
///
/// Returns `None` for opaque tokens or payloads that are not JSON objects.
#[must_use]
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Registration form as submitted by the visitor.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

/// Authentication service.
///
/// Handles login and registration against the backend.
pub struct AuthService<'a> {
    backend: &'a BackendClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` if either field is blank.
    /// Returns `AuthError::InvalidCredentials` if the backend rejects them.
    /// Returns `AuthError::TokenExpired` if the issued token is already expired.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<CurrentUser, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.expose_secret().is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let token = self
            .backend
            .login(email, password)
            .await
            .map_err(|e| match e {
                BackendError::Unauthorized(_) => AuthError::InvalidCredentials,
                other => AuthError::Backend(other),
            })?;

        let claims = decode_claims(token.expose_secret()).unwrap_or_else(|| {
            warn!("Access token payload could not be decoded");
            TokenClaims::default()
        });
        if claims.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        if let Some(role) = claims.role.as_deref() {
            let id = id_from_json(&claims.sub).unwrap_or_else(|| UNKNOWN_USER_ID.to_string());
            let email = claims.email.as_deref().unwrap_or(email);
            debug!(user_id = %id, "Identity read from token");
            return Ok(CurrentUser::new(
                UserId::new(id),
                email,
                role.parse().unwrap_or_default(),
                &token,
            ));
        }

        // Token lacked a role: ask the profile endpoint
        match self.backend.profile(&token).await {
            Ok(profile) => {
                let id = profile
                    .user_id()
                    .unwrap_or_else(|| UNKNOWN_USER_ID.to_string());
                let role = profile
                    .role
                    .as_deref()
                    .map_or(Role::User, |r| r.parse().unwrap_or_default());
                let email = profile.email.as_deref().unwrap_or(email);
                Ok(CurrentUser::new(UserId::new(id), email, role, &token))
            }
            Err(e) => {
                warn!(error = %e, "Profile lookup failed, continuing as regular user");
                Ok(CurrentUser::new(
                    UserId::new(UNKNOWN_USER_ID),
                    email,
                    Role::User,
                    &token,
                ))
            }
        }
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if a field is blank.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &RegisterForm) -> Result<(), AuthError> {
        validate_registration(form)?;

        let request = RegisterRequest {
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
            email: form.email.trim(),
            password: form.password.expose_secret(),
        };
        self.backend.register(&request).await?;
        Ok(())
    }
}

/// Check a registration form before it is sent to the backend.
fn validate_registration(form: &RegisterForm) -> Result<(), AuthError> {
    for (name, value) in [
        ("first_name", &form.first_name),
        ("last_name", &form.last_name),
        ("email", &form.email),
    ] {
        if value.trim().is_empty() {
            return Err(AuthError::MissingField(name));
        }
    }

    if form.password.expose_secret() != form.confirm_password.expose_secret() {
        return Err(AuthError::PasswordMismatch);
    }

    validate_password(form.password.expose_secret())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    fn form(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            first_name: "Mario".to_string(),
            last_name: "Rossi".to_string(),
            email: "mario@sanital.it".to_string(),
            password: SecretString::from(password),
            confirm_password: SecretString::from(confirm),
        }
    }

    #[test]
    fn test_decode_claims() {
        let claims =
            decode_claims(&token_with(r#"{"sub":"u1","email":"a@b.it","role":"admin"}"#)).unwrap();
        assert_eq!(id_from_json(&claims.sub).as_deref(), Some("u1"));
        assert_eq!(claims.role.as_deref(), Some("admin"));
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_decode_claims_numeric_sub() {
        let claims = decode_claims(&token_with(r#"{"sub":42}"#)).unwrap();
        assert_eq!(id_from_json(&claims.sub).as_deref(), Some("42"));
        assert!(claims.role.is_none());
    }

    #[test]
    fn test_decode_claims_rejects_opaque_tokens() {
        assert!(decode_claims("opaque-token").is_none());
        assert!(decode_claims("a.!!!.c").is_none());
        assert!(decode_claims(&token_with("[1,2]")).is_none());
    }

    #[test]
    fn test_expired_claims() {
        let claims = decode_claims(&token_with(r#"{"sub":"u1","exp":1000}"#)).unwrap();
        assert!(claims.is_expired());
    }

    #[test]
    fn test_validate_registration() {
        assert!(validate_registration(&form("segreto", "segreto")).is_ok());
        assert!(matches!(
            validate_registration(&form("segreto", "segreta")),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            validate_registration(&form("abc", "abc")),
            Err(AuthError::WeakPassword(_))
        ));

        let mut blank = form("segreto", "segreto");
        blank.last_name = "  ".to_string();
        assert!(matches!(
            validate_registration(&blank),
            Err(AuthError::MissingField("last_name"))
        ));
    }
}
