//! Authentication route handlers.
//!
//! Handles sign-in, registration, password reset and sign-out against the
//! identity provider. One page serves both the sign-in and the register
//! form, switched with `?mode=register`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Seconds the registration confirmation waits before returning to sign-in.
pub const REGISTER_REDIRECT_SECONDS: u32 = 3;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Query parameters of the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub mode: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Form shown on the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    Register,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub mode: AuthMode,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl LoginTemplate {
    fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            email: String::new(),
            error: None,
            success: None,
        }
    }

    fn failed(mode: AuthMode, email: String, err: &AuthError) -> Self {
        Self {
            email,
            error: Some(err.user_message()),
            ..Self::new(mode)
        }
    }
}

/// Registration success page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register_success.html")]
pub struct RegisterSuccessTemplate {
    pub email: String,
    pub redirect_seconds: u32,
}

// =============================================================================
// Sign-in
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<LoginQuery>) -> LoginTemplate {
    let mode = match query.mode.as_deref() {
        Some("register") => AuthMode::Register,
        _ => AuthMode::SignIn,
    };
    LoginTemplate::new(mode)
}

/// Handle login form submission.
///
/// On success the user is stored in the session and sent to the catalog.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let auth = AuthService::new(state.identity());

    match auth.sign_in(&form.email, &form.password).await {
        Ok(user) => {
            let current_user = CurrentUser::from(user);
            if let Err(e) = set_current_user(&session, &current_user).await {
                tracing::error!("Failed to set session: {}", e);
                return LoginTemplate {
                    error: Some("Não foi possível iniciar a sessão. Tente novamente.".to_string()),
                    ..LoginTemplate::new(AuthMode::SignIn)
                }
                .into_response();
            }

            set_sentry_user(&current_user.id, Some(current_user.email.as_str()));
            tracing::info!(user_id = %current_user.id, "User signed in");
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            LoginTemplate::failed(AuthMode::SignIn, form.email, &e).into_response()
        }
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Handle registration form submission.
///
/// The password policy and confirmation are checked before contacting the
/// provider. The new account is not signed in; the success page returns to
/// the sign-in form after a short delay.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    let auth = AuthService::new(state.identity());

    match auth
        .register(&form.email, &form.password, &form.password_confirm)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.uid, "Account created");
            RegisterSuccessTemplate {
                email: user.email.to_string(),
                redirect_seconds: REGISTER_REDIRECT_SECONDS,
            }
            .into_response()
        }
        Err(e) => {
            if e.is_validation() {
                tracing::debug!("Registration refused: {}", e);
            } else {
                tracing::warn!("Registration failed: {}", e);
            }
            LoginTemplate::failed(AuthMode::Register, form.email, &e).into_response()
        }
    }
}

// =============================================================================
// Password Reset
// =============================================================================

/// Handle forgot password form submission.
///
/// Provider errors are shown to the user.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> LoginTemplate {
    let auth = AuthService::new(state.identity());

    match auth.reset_password(&form.email).await {
        Ok(()) => LoginTemplate {
            success: Some(
                "Enviamos um e-mail com as instruções para redefinir sua senha.".to_string(),
            ),
            ..LoginTemplate::new(AuthMode::SignIn)
        },
        Err(e) => {
            tracing::warn!("Password reset request failed: {}", e);
            LoginTemplate::failed(AuthMode::SignIn, form.email, &e)
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout. The whole session is cleared.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }

    clear_sentry_user();
    Redirect::to("/").into_response()
}
