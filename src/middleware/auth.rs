use axum::{
    middleware::Next,
    response::{IntoResponse, Response},
    extract::Request,
    body::Body,
    http::Method,
};
use tower_sessions::Session;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::services::UserRepository;

pub const USER_SESSION_KEY: &str = "user_session";

// Requests that change state need a logged-in user, except logging in
// and registering.
fn is_public(method: &Method, path: &str) -> bool {
    if !path.starts_with("/api/") {
        return true;
    }
    if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
        return true;
    }
    method == Method::POST && (path == "/api/login" || path == "/api/users")
}

pub async fn require_auth(
    session: Session,
    req: Request<Body>,
    next: Next,
) -> Response {
    if is_public(req.method(), req.uri().path()) {
        return next.run(req).await;
    }

    match session.get::<String>(USER_SESSION_KEY).await {
        Ok(Some(_)) => next.run(req).await,
        Ok(None) => AppError::Auth("Not authenticated".into()).into_response(),
        Err(e) => AppError::Session(e.to_string()).into_response(),
    }
}

pub async fn session_username(session: &Session) -> AppResult<Option<String>> {
    session
        .get::<String>(USER_SESSION_KEY)
        .await
        .map_err(|e| AppError::Session(e.to_string()))
}

/// The logged-in user, loaded fresh from the repository so role checks
/// never rely on data the client holds.
pub async fn current_user(session: &Session, users: &UserRepository) -> AppResult<User> {
    let username = session_username(session)
        .await?
        .ok_or_else(|| AppError::Auth("Not authenticated".into()))?;

    users
        .find_by_username(&username)
        .await
        .ok_or_else(|| AppError::Auth(format!("Session user {} no longer exists", username)))
}

/// Like `current_user`, but anonymous visitors are `None`.
pub async fn optional_user(session: &Session, users: &UserRepository) -> AppResult<Option<User>> {
    match session_username(session).await? {
        Some(username) => Ok(users.find_by_username(&username).await),
        None => Ok(None),
    }
}

pub fn require_self_or_admin(user: &User, username: &str) -> AppResult<()> {
    if user.username == username || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} may not act on behalf of {}",
            user.username, username
        )))
    }
}

pub fn require_admin(user: &User) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin role required".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::collections::BTreeSet;

    #[test]
    fn test_public_routes() {
        assert!(is_public(&Method::GET, "/api/recipes"));
        assert!(is_public(&Method::POST, "/api/login"));
        assert!(is_public(&Method::POST, "/api/users"));
        assert!(is_public(&Method::GET, "/index.html"));

        assert!(!is_public(&Method::POST, "/api/recipes"));
        assert!(!is_public(&Method::PUT, "/api/users/alice"));
        assert!(!is_public(&Method::POST, "/api/users/alice/likes"));
        assert!(!is_public(&Method::DELETE, "/api/recipes/1"));
    }

    #[test]
    fn test_self_or_admin() {
        let mut alice = User::new("alice".into(), "h".into(), BTreeSet::new());
        assert!(require_self_or_admin(&alice, "alice").is_ok());
        assert!(require_self_or_admin(&alice, "bob").is_err());
        assert!(require_admin(&alice).is_err());

        alice.roles.insert(Role::Admin);
        assert!(require_self_or_admin(&alice, "bob").is_ok());
        assert!(require_admin(&alice).is_ok());
    }
}
