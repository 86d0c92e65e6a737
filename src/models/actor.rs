use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "Admin";

/// The identity performing an operation, as vouched for by the identity
/// provider in front of this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: false,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: true,
        }
    }

    /// Builds an actor from a comma-separated role list such as `"User,Admin"`.
    pub fn from_roles(id: impl Into<String>, roles: &str) -> Self {
        let is_admin = roles
            .split(',')
            .any(|role| role.trim().eq_ignore_ascii_case(ROLE_ADMIN));
        Self {
            id: id.into(),
            is_admin,
        }
    }
}
