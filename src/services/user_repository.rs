use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use crate::errors::{AppError, AppResult, StoreResult};
use crate::models::{Role, User};
use super::json_store::JsonStore;

const MAX_USERNAME_LEN: usize = 64;

#[derive(Clone)]
pub struct UserRepository {
    store: Arc<JsonStore<User>>,
}

impl UserRepository {
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Ok(Self {
            store: Arc::new(JsonStore::open(path).await?),
        })
    }

    pub(crate) fn store(&self) -> &JsonStore<User> {
        &self.store
    }

    pub async fn find_by_username(&self, username: &str) -> Option<User> {
        self.store
            .read(|users| users.iter().find(|u| u.username == username).cloned())
            .await
    }

    pub async fn get(&self, username: &str) -> AppResult<User> {
        self.find_by_username(username)
            .await
            .ok_or_else(|| not_found(username))
    }

    pub async fn list(&self) -> Vec<User> {
        self.store.snapshot().await
    }

    /// Users waiting for an admin to act on a role request.
    pub async fn list_pending(&self) -> Vec<User> {
        self.store
            .read(|users| {
                users
                    .iter()
                    .filter(|u| !u.requested_roles.is_empty())
                    .cloned()
                    .collect()
            })
            .await
    }

    pub async fn create(
        &self,
        username: &str,
        password_hash: String,
        requested_roles: BTreeSet<Role>,
    ) -> AppResult<User> {
        let username = validate_username(username)?;
        validate_requested_roles(&requested_roles)?;

        let user = self
            .store
            .mutate(|users| {
                if users.iter().any(|u| u.username == username) {
                    return Err(AppError::Validation(format!(
                        "Username {} already exists",
                        username
                    )));
                }
                let user = User::new(username.clone(), password_hash, requested_roles);
                users.push(user.clone());
                Ok(user)
            })
            .await?;

        tracing::info!("Registered user {}", user.username);
        Ok(user)
    }

    /// Grants `role`. Granting a role already held changes nothing but
    /// still clears a matching pending request.
    pub async fn promote(&self, username: &str, role: Role) -> AppResult<User> {
        let user = self
            .store
            .mutate(|users| {
                let user = find_mut(users, username)?;
                user.roles.insert(role);
                user.requested_roles.remove(&role);
                Ok::<_, AppError>(user.clone())
            })
            .await?;

        tracing::info!("Granted {} to {}", role, username);
        Ok(user)
    }

    pub async fn deny_request(&self, username: &str, role: Role) -> AppResult<User> {
        let user = self
            .store
            .mutate(|users| {
                let user = find_mut(users, username)?;
                if !user.requested_roles.remove(&role) {
                    return Err(AppError::Validation(format!(
                        "{} has not requested the {} role",
                        username, role
                    )));
                }
                Ok(user.clone())
            })
            .await?;

        tracing::info!("Denied {} request from {}", role, username);
        Ok(user)
    }

    /// Self-service changes: password and pending role requests.
    pub async fn update(
        &self,
        username: &str,
        password_hash: Option<String>,
        requested_roles: Option<BTreeSet<Role>>,
    ) -> AppResult<User> {
        if let Some(requested) = &requested_roles {
            validate_requested_roles(requested)?;
        }

        self.store
            .mutate(|users| {
                let user = find_mut(users, username)?;
                if let Some(hash) = password_hash {
                    user.password_hash = hash;
                }
                if let Some(requested) = requested_roles {
                    let held = user.roles.clone();
                    user.requested_roles = requested.difference(&held).copied().collect();
                }
                Ok(user.clone())
            })
            .await
    }

    /// Makes sure `username` exists and holds the Admin role. An existing
    /// account keeps its password.
    pub async fn ensure_admin(&self, username: &str, password_hash: String) -> AppResult<User> {
        let username = validate_username(username)?;

        self.store
            .mutate(|users| {
                if let Some(user) = users.iter_mut().find(|u| u.username == username) {
                    user.roles.insert(Role::Admin);
                    return Ok::<_, AppError>(user.clone());
                }
                let mut user = User::new(username.clone(), password_hash, BTreeSet::new());
                user.roles.insert(Role::Admin);
                users.push(user.clone());
                Ok(user)
            })
            .await
    }
}

fn find_mut<'a>(users: &'a mut [User], username: &str) -> AppResult<&'a mut User> {
    users
        .iter_mut()
        .find(|u| u.username == username)
        .ok_or_else(|| not_found(username))
}

fn not_found(username: &str) -> AppError {
    AppError::NotFound(format!("User {} not found", username))
}

fn validate_username(username: &str) -> AppResult<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".into()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::Validation(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if username.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(AppError::Validation(
            "Username must not contain spaces or slashes".into(),
        ));
    }
    Ok(username.to_string())
}

fn validate_requested_roles(requested: &BTreeSet<Role>) -> AppResult<()> {
    match requested.iter().find(|r| !r.is_requestable()) {
        Some(role) => Err(AppError::Validation(format!("The {} role cannot be requested", role))),
        None => Ok(()),
    }
}
