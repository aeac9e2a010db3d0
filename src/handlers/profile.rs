use crate::core::error::{ProfileError, UpdateError};
use crate::core::state::AppState;
use crate::models::profile::{ProfileQuery, ProfileView};
use crate::utils::auth::CurrentUser;
use crate::validation::profile_form::ProfileImageForm;
use axum::{
    extract::{rejection::FormRejection, Query, State},
    response::{Json, Redirect},
    Form,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const UPDATED_MESSAGE: &str = "Profile updated successfully";

/// Current user's profile
///
/// GET /profile?message=<status>
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ProfileView>, ProfileError> {
    let account = state.user_store.get_by_id(user_id).ok_or_else(|| {
        warn!(user_id, "Logged-in user has no account");
        ProfileError::NotFound
    })?;

    Ok(Json(ProfileView::new(
        &account,
        &state.config.media.default_avatar,
        &state.config.media.default_banner,
        query.message,
    )))
}

/// Replace avatar and/or banner from remote URLs
///
/// POST /profile/update-image (form: avatarUrl, bannerUrl)
///
/// Always answers with a redirect back to the profile page carrying a
/// human-readable status message.
#[instrument(skip(state, form))]
pub async fn update_image_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    form: Result<Form<ProfileImageForm>, FormRejection>,
) -> Redirect {
    let outcome = match form {
        Ok(Form(form)) => match form.validate() {
            Ok(sources) => state.profile_service.update_profile_images(user_id, &sources).await,
            Err(e) => Err(e),
        },
        Err(rejection) => Err(UpdateError::MalformedForm(rejection.body_text())),
    };

    let message = match &outcome {
        Ok(update) => {
            info!(
                user_id,
                avatar = ?update.avatar_url,
                banner = ?update.banner_url,
                "Profile image update completed"
            );
            UPDATED_MESSAGE
        }
        Err(e) => {
            warn!(user_id, error = %e, "Profile image update failed");
            e.user_message()
        }
    };

    Redirect::to(&profile_location(message))
}

fn profile_location(message: &str) -> String {
    match serde_urlencoded::to_string([("message", message)]) {
        Ok(query) => format!("/profile?{}", query),
        Err(_) => "/profile".to_string(),
    }
}
