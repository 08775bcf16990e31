use axum::{extract::State, Extension, Json};

use crate::error::Result;
use crate::services::map_service::{self, MapMarker};
use crate::state::AppState;
use crate::web::middleware::auth::Viewer;

pub async fn map_handler(
    Extension(viewer): Extension<Viewer>,
    State(state): State<AppState>,
) -> Result<Json<Vec<MapMarker>>> {
    let markers = map_service::load_map_markers(
        state.profiles.as_ref(),
        viewer.user_id.as_deref(),
        &state.avatar_urls,
    )
    .await?;
    Ok(Json(markers))
}
