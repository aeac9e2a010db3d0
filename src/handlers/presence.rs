use crate::core::state::AppState;
use crate::models::presence::OnlineUsersResponse;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

/// Middleware recording every inbound request in the presence tracker,
/// before routing and regardless of the eventual outcome
pub async fn track_presence(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let identity = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Unknown");

    state.presence.touch(&identity, user_agent);

    next.run(request).await
}

/// Online users handler
///
/// GET /api/online-users
pub async fn online_users_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.presence.snapshot();

    (
        StatusCode::OK,
        Json(OnlineUsersResponse {
            count: snapshot.count,
            users: snapshot.entries,
        }),
    )
}
