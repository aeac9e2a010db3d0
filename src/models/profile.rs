use crate::models::user::{Role, UserAccount};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    pub message: Option<String>,
}

/// Data handed to the profile page
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileView {
    pub title: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub avatar_url: String,
    pub banner_url: String,
    pub message: Option<String>,
}

impl ProfileView {
    /// Build the view, substituting the default assets for missing references
    pub fn new(
        account: &UserAccount,
        default_avatar: &str,
        default_banner: &str,
        message: Option<String>,
    ) -> Self {
        Self {
            title: format!("Profile - {}", account.username),
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.role,
            avatar_url: account
                .avatar_url
                .clone()
                .unwrap_or_else(|| default_avatar.to_string()),
            banner_url: account
                .banner_url
                .clone()
                .unwrap_or_else(|| default_banner.to_string()),
            message,
        }
    }
}

/// References produced by a successful profile image update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileImageUpdate {
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
