use axum::{
    extract::State,
    Extension, Json,
};

use crate::error::Result;
use crate::services::directory_service::{self, DirectoryPage, DirectoryQuery};
use crate::state::AppState;
use crate::web::extract::ApiQuery;
use crate::web::middleware::auth::Viewer;

pub async fn directory_handler(
    Extension(viewer): Extension<Viewer>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DirectoryQuery>,
) -> Result<Json<DirectoryPage>> {
    let mut page = directory_service::build_directory_page(
        state.profiles.as_ref(),
        viewer.user_id.as_deref(),
        &query,
    )
    .await?;
    for row in &mut page.rows {
        row.avatar = state.avatar_urls.url_for(row.avatar.as_deref());
    }
    Ok(Json(page))
}
