use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use tracing::{info, warn};

use crate::services::session_service;
use crate::state::AppState;
use crate::web::middleware::auth::Viewer;

/// Ends the current session (if any), clears the cookies and hands the
/// browser to the identity provider's logout page, or home.
pub async fn signout_handler(
    Extension(viewer): Extension<Viewer>,
    State(state): State<AppState>,
) -> Response {
    if let Some(token) = viewer.session_token.as_deref() {
        if let Err(e) = state.sessions.end_session(token).await {
            warn!("Failed to end session: {}", e);
        }
        info!(
            "🚪 Signed out {}",
            viewer.user_id.as_deref().unwrap_or("unknown")
        );
    }

    let target = state.end_session_url.as_deref().unwrap_or("/");
    let mut response = Redirect::to(target).into_response();
    for cookie in session_service::clear_session_cookies() {
        match cookie.parse() {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Invalid Set-Cookie value: {}", e),
        }
    }
    response
}
