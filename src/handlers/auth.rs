use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tower_sessions::Session;
use crate::errors::{AppError, AppResult};
use crate::middleware::{current_user, USER_SESSION_KEY};
use crate::models::{LoginForm, PublicUser};
use crate::services::password::verify_password;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[axum::debug_handler]
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Json(login_form): Json<LoginForm>,
) -> AppResult<Json<PublicUser>> {
    tracing::info!("Login attempt for user: {}", login_form.username);

    let Some(user) = state.users.find_by_username(login_form.username.trim()).await else {
        tracing::debug!("User not found: {}", login_form.username);
        verify_password(&login_form.password, state.decoy_hash().await?).await?;
        return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
    };

    if !verify_password(&login_form.password, &user.password_hash).await? {
        tracing::debug!("Invalid password for user: {}", user.username);
        return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
    }

    // New id on login so a pre-login cookie cannot be reused
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Session(e.to_string()))?;
    session
        .insert(USER_SESSION_KEY, user.username.clone())
        .await
        .map_err(|e| AppError::Session(e.to_string()))?;

    tracing::info!("User {} logged in", user.username);
    Ok(Json(user.to_public()))
}

pub async fn handle_logout(session: Session) -> AppResult<Response> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Session(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn current_session(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<PublicUser>> {
    let user = current_user(&session, &state.users).await?;
    Ok(Json(user.to_public()))
}
