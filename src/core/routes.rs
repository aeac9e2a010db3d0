// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{fallback, health, presence, profile};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

pub fn build_router(state: Arc<AppState>) -> Router {
    let media = ServeDir::new(state.layout.media_root());

    Router::new()
        // Profile endpoints (require a logged-in user)
        .route("/profile", get(profile::profile_handler))
        .route("/profile/update-image", post(profile::update_image_handler))

        // Public endpoints
        .route("/api/online-users", get(presence::online_users_handler))
        .route("/health", get(health::health_handler))
        .nest_service("/Media", media)

        // 404 fallback for all unmatched routes
        .fallback(fallback::fallback_handler)

        // Outermost, so every request is seen, matched or not
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            presence::track_presence,
        ))

        .with_state(state)
}
