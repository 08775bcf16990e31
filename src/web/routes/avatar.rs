use axum::{
    extract::State,
    response::Redirect,
    Extension,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::services::profile_service;
use crate::state::AppState;
use crate::web::extract::ApiQuery;
use crate::web::middleware::auth::Viewer;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AvatarQuery {
    pub profile_id: Option<String>,
    pub user_id: Option<String>,
    pub account_id: Option<String>,
    pub provider_id: Option<String>,
}

/// Redirects to the stored avatar of a profile, addressed by profile id,
/// user id or an OAuth account.
pub async fn avatar_redirect_handler(
    Extension(viewer): Extension<Viewer>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AvatarQuery>,
) -> Result<Redirect> {
    let repo = state.profiles.as_ref();
    let scope = viewer.scope();

    let profile = if let Some(profile_id) = &query.profile_id {
        profile_service::load_visible_profile(repo, &scope, profile_id).await?
    } else if let Some(user_id) = &query.user_id {
        profile_service::load_visible_profile_by_user(repo, &scope, user_id).await?
    } else if let (Some(account_id), Some(provider_id)) = (&query.account_id, &query.provider_id)
    {
        profile_service::load_visible_profile_by_account(repo, &scope, account_id, provider_id)
            .await?
    } else {
        return Err(AppError::BadRequest("Missing required parameters".into()));
    };

    let profile = profile.ok_or(AppError::NotFound("Profile"))?;
    let url = state
        .avatar_urls
        .url_for(profile.avatar.as_deref())
        .ok_or(AppError::NotFound("Avatar"))?;
    Ok(Redirect::temporary(&url))
}
