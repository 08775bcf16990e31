use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::error::AppError;
use crate::services::privacy_service::VisibilityScope;
use crate::state::AppState;

/// Who is asking. Present on every request; anonymous when there is no
/// live session.
#[derive(Clone, Debug, Default)]
pub struct Viewer {
    pub user_id: Option<String>,
    pub session_token: Option<String>,
}

impl Viewer {
    pub fn scope(&self) -> VisibilityScope {
        VisibilityScope::for_viewer(self.user_id.as_deref())
    }
}

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
}

pub async fn resolve_viewer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let viewer = match state.sessions.get_session(request.headers()).await {
        Ok(Some(session)) => Viewer {
            user_id: Some(session.user_id),
            session_token: Some(session.token),
        },
        Ok(None) => Viewer::default(),
        Err(e) => {
            // A broken session lookup degrades to an anonymous view.
            warn!("Session lookup failed: {}", e);
            Viewer::default()
        }
    };

    request.extensions_mut().insert(viewer);
    next.run(request).await
}

pub async fn require_auth(mut request: Request, next: Next) -> Response {
    let user_id = request
        .extensions()
        .get::<Viewer>()
        .and_then(|v| v.user_id.clone());

    match user_id {
        Some(id) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser { id });
            next.run(request).await
        }
        None => AppError::Unauthorized.into_response(),
    }
}
