use std::sync::Arc;
use tokio::sync::OnceCell;
use crate::config::Config;
use crate::errors::{AppResult, StoreResult};
use crate::services::{password, RecipeRepository, UserRepository};

// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub users: UserRepository,
    pub recipes: RecipeRepository,
    pub config: Arc<Config>,
    decoy_hash: Arc<OnceCell<String>>,
}

impl AppState {
    pub async fn open(config: Config) -> StoreResult<Self> {
        let users = UserRepository::open(config.users_path()).await?;
        let recipes = RecipeRepository::open(config.recipes_path()).await?;

        Ok(Self {
            users,
            recipes,
            config: Arc::new(config),
            decoy_hash: Arc::new(OnceCell::new()),
        })
    }

    /// Hash checked when a login names an unknown user, so that path
    /// costs the same bcrypt work as a wrong password.
    pub async fn decoy_hash(&self) -> AppResult<&str> {
        let cost = self.config.security.bcrypt_cost;
        self.decoy_hash
            .get_or_try_init(|| password::hash_password("decoy-password", cost))
            .await
            .map(String::as_str)
    }

    /// Creates the configured administrator if a password is set.
    pub async fn bootstrap_admin(&self) -> AppResult<()> {
        let bootstrap = &self.config.bootstrap;
        let (Some(username), Some(admin_password)) =
            (&bootstrap.admin_username, &bootstrap.admin_password)
        else {
            tracing::debug!("No bootstrap admin configured");
            return Ok(());
        };

        if self
            .users
            .find_by_username(username)
            .await
            .is_some_and(|u| u.is_admin())
        {
            return Ok(());
        }

        let password_hash =
            password::hash_password(admin_password, self.config.security.bcrypt_cost).await?;
        self.users.ensure_admin(username, password_hash).await?;
        tracing::info!("Administrator {} is ready", username);
        Ok(())
    }
}
