use crate::core::error::ProfileError;
use crate::core::state::AppState;
use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use std::sync::Arc;
use tracing::debug;

/// Id of the logged-in user
///
/// Session handling lives in front of this service; it forwards the user id
/// in the configured header. A missing or malformed header means "not logged
/// in" and rejects with a redirect to the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub u32);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ProfileError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        user_id_from_headers(&parts.headers, &state.config.auth.user_header)
            .map(CurrentUser)
            .ok_or_else(|| {
                debug!("Request without a logged-in user");
                ProfileError::Unauthorized
            })
    }
}

pub fn user_id_from_headers(headers: &HeaderMap, header_name: &str) -> Option<u32> {
    headers
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
