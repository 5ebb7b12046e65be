use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tower_sessions::Session;
use crate::errors::{AppError, AppResult};
use crate::middleware::{current_user, require_admin, require_self_or_admin};
use crate::models::{
    LikeForm, PromoteForm, PublicUser, RegisterForm, Role, UpdateUserForm, UserListQuery,
};
use crate::services::{password::hash_password, toggle_like, LikeOutcome};
use crate::state::AppState;

pub async fn handle_register(
    State(state): State<AppState>,
    Json(register_form): Json<RegisterForm>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    if register_form.password.is_empty() {
        return Err(AppError::Validation("Username and password are required".into()));
    }

    // Checked again under the store lock by create
    if state
        .users
        .find_by_username(register_form.username.trim())
        .await
        .is_some()
    {
        return Err(AppError::Validation(format!(
            "Username {} already exists",
            register_form.username.trim()
        )));
    }

    let password_hash =
        hash_password(&register_form.password, state.config.security.bcrypt_cost).await?;
    let user = state
        .users
        .create(&register_form.username, password_hash, register_form.requested_roles)
        .await?;

    Ok((StatusCode::CREATED, Json(user.to_public())))
}

pub async fn list_users(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<Vec<PublicUser>>> {
    let admin = current_user(&session, &state.users).await?;
    require_admin(&admin)?;

    let users = if query.pending {
        state.users.list_pending().await
    } else {
        state.users.list().await
    };

    tracing::debug!("Listing {} users (pending only: {})", users.len(), query.pending);
    Ok(Json(users.iter().map(PublicUser::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
) -> AppResult<Json<PublicUser>> {
    let viewer = current_user(&session, &state.users).await?;
    require_self_or_admin(&viewer, &username)?;

    let user = state.users.get(&username).await?;
    Ok(Json(user.to_public()))
}

pub async fn update_user(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
    Json(form): Json<UpdateUserForm>,
) -> AppResult<Json<PublicUser>> {
    if form.username != username {
        return Err(AppError::Validation("Username in URL and body must match".into()));
    }

    let editor = current_user(&session, &state.users).await?;
    require_self_or_admin(&editor, &username)?;

    let password_hash = match form.password.as_deref() {
        Some("") => return Err(AppError::Validation("Password must not be empty".into())),
        Some(password) => Some(hash_password(password, state.config.security.bcrypt_cost).await?),
        None => None,
    };

    let user = state
        .users
        .update(&username, password_hash, form.requested_roles)
        .await?;

    tracing::info!("User {} updated by {}", username, editor.username);
    Ok(Json(user.to_public()))
}

pub async fn promote_user(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
    Json(form): Json<PromoteForm>,
) -> AppResult<Json<PublicUser>> {
    let admin = current_user(&session, &state.users).await?;
    require_admin(&admin)?;

    let user = state.users.promote(&username, form.role).await?;
    Ok(Json(user.to_public()))
}

pub async fn deny_role_request(
    State(state): State<AppState>,
    session: Session,
    Path((username, role)): Path<(String, Role)>,
) -> AppResult<Json<PublicUser>> {
    let admin = current_user(&session, &state.users).await?;
    require_admin(&admin)?;

    let user = state.users.deny_request(&username, role).await?;
    Ok(Json(user.to_public()))
}

pub async fn liked_posts(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
) -> AppResult<Json<Value>> {
    let viewer = current_user(&session, &state.users).await?;
    require_self_or_admin(&viewer, &username)?;

    let user = state.users.get(&username).await?;
    Ok(Json(json!({ "likedPosts": user.liked_posts })))
}

pub async fn toggle_user_like(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
    Json(form): Json<LikeForm>,
) -> AppResult<Json<LikeOutcome>> {
    let user = current_user(&session, &state.users).await?;
    // Likes are personal; admins do not like on someone's behalf
    if user.username != username {
        return Err(AppError::Forbidden(format!(
            "{} may not change likes of {}",
            user.username, username
        )));
    }
    if form.recipe_id.trim().is_empty() {
        return Err(AppError::Validation("Recipe ID is required".into()));
    }

    let outcome = toggle_like(&state.users, &state.recipes, &username, &form.recipe_id).await?;
    Ok(Json(outcome))
}
