mod auth;

pub use auth::{
    current_user, optional_user, require_admin, require_auth, require_self_or_admin,
    USER_SESSION_KEY,
};
