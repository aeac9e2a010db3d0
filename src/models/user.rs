use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserAccount {
    /// User ID
    pub id: u32,
    /// Display name, unique across accounts
    pub username: String,
    /// Unique across accounts
    pub email: String,
    /// Credential hash as produced by the signup flow
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    /// Public reference such as `/Media/avatars/avatar_7_1700000000000.jpg`
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    /// Unix milliseconds
    #[serde(default)]
    pub created_at: i64,
}

impl UserAccount {
    pub fn new(id: u32, username: &str, email: &str, password_hash: &str, created_at: i64) -> Self {
        Self {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: Role::User,
            avatar_url: None,
            banner_url: None,
            created_at,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Partial account update. Fields left as `None` are not touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
}
