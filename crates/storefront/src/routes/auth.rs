//! Auth route handlers.

use axum::{Json, extract::State, http::StatusCode};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::{info, instrument};

use sanital_core::{Role, UserId};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthService, RegisterForm};
use crate::state::AppState;

/// Logged-in user as shown to the client. Never includes the token.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
}

impl From<&CurrentUser> for UserView {
    fn from(user: &CurrentUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            is_admin: user.is_admin(),
        }
    }
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
}

/// Handle login.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<UserView>> {
    let user = AuthService::new(state.backend())
        .login(&form.email, &form.password)
        .await?;

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(&user.email));
    info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(Json(UserView::from(&user)))
}

/// Handle registration.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<Value>)> {
    AuthService::new(state.backend()).register(&form).await?;
    info!("Account registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Registration successful, please log in" })),
    ))
}

/// Handle logout. The cart stays with the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in user.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<UserView> {
    Json(UserView::from(&user))
}
