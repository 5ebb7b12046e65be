use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Admin,
    Chef,
    Traducteur,
}

impl Role {
    // Roles a user may ask for at registration; Admin is only ever granted.
    pub fn is_requestable(self) -> bool {
        !matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "Admin",
            Role::Chef => "Chef",
            Role::Traducteur => "Traducteur",
        };
        f.write_str(name)
    }
}

/// A stored account. Only the bcrypt hash of the password is kept.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    #[serde(default)]
    pub requested_roles: BTreeSet<Role>,
    #[serde(default)]
    pub liked_posts: Vec<String>,
}

impl User {
    pub fn new(username: String, password_hash: String, requested_roles: BTreeSet<Role>) -> Self {
        Self {
            username,
            password_hash,
            roles: BTreeSet::new(),
            requested_roles,
            liked_posts: Vec::new(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn is_chef(&self) -> bool {
        self.has_role(Role::Chef)
    }

    pub fn is_translator(&self) -> bool {
        self.has_role(Role::Traducteur)
    }

    pub fn has_liked(&self, recipe_id: &str) -> bool {
        self.liked_posts.iter().any(|id| id == recipe_id)
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser::from(self)
    }
}

/// The user shape returned by the API.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub username: String,
    pub roles: BTreeSet<Role>,
    pub requested_roles: BTreeSet<Role>,
    pub liked_posts: Vec<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            roles: user.roles.clone(),
            requested_roles: user.requested_roles.clone(),
            liked_posts: user.liked_posts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_roles(roles: &[Role]) -> User {
        let mut user = User::new("alice".into(), "hash".into(), BTreeSet::new());
        user.roles.extend(roles.iter().copied());
        user
    }

    #[test]
    fn test_role_predicates() {
        let user = user_with_roles(&[Role::Chef]);
        assert!(user.is_chef());
        assert!(!user.is_admin());
        assert!(!user.is_translator());

        let user = user_with_roles(&[Role::Admin, Role::Traducteur]);
        assert!(user.is_admin());
        assert!(user.is_translator());
        assert!(!user.is_chef());
    }

    #[test]
    fn test_public_user_has_no_password() {
        let user = user_with_roles(&[Role::Chef]);
        let json = serde_json::to_value(user.to_public()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["roles"], serde_json::json!(["Chef"]));
        assert_eq!(json["requestedRoles"], serde_json::json!([]));
    }

    #[test]
    fn test_user_json_shape() {
        let json = r#"{
            "username": "bob",
            "passwordHash": "$2b$04$abc",
            "roles": ["Traducteur"],
            "requestedRoles": ["Chef"]
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.is_translator());
        assert!(user.requested_roles.contains(&Role::Chef));
        assert!(user.liked_posts.is_empty());
    }

    #[test]
    fn test_admin_is_not_requestable() {
        assert!(!Role::Admin.is_requestable());
        assert!(Role::Chef.is_requestable());
        assert!(Role::Traducteur.is_requestable());
        assert_eq!(Role::Traducteur.to_string(), "Traducteur");
    }
}
