use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::models::ProfileRecord;
use crate::services::avatar_service;
use crate::services::profile_service::{
    self, AboutForm, FieldSelection, ProfileForm, PublicProfileView,
};
use crate::state::AppState;
use crate::web::extract::{ApiForm, ApiJson, ApiQuery};
use crate::web::middleware::auth::{AuthenticatedUser, Viewer};

#[derive(Debug, Deserialize, Default)]
pub struct FieldsQuery {
    pub fields: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LookupQuery {
    pub id: Option<String>,
    pub ids: Option<String>,
    pub fields: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdsBody {
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdsBody {
    pub user_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AccountQuery {
    #[serde(rename = "accountId", alias = "id")]
    pub account_id: Option<String>,
    #[serde(rename = "providerId", alias = "provider")]
    pub provider_id: Option<String>,
    pub fields: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRef {
    pub account_id: String,
    pub provider_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AccountsBody {
    pub accounts: Vec<AccountRef>,
}

fn format_all(
    state: &AppState,
    records: &[ProfileRecord],
    fields: &FieldSelection,
) -> Json<Value> {
    Json(Value::Array(
        records
            .iter()
            .map(|r| profile_service::format_profile(r, fields, &state.avatar_urls))
            .collect(),
    ))
}

pub async fn all_profiles_handler(
    Extension(viewer): Extension<Viewer>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FieldsQuery>,
) -> Result<Json<Value>> {
    let fields = FieldSelection::parse(query.fields.as_deref());
    let records =
        profile_service::load_visible_profiles(state.profiles.as_ref(), &viewer.scope(), None, None)
            .await?;
    Ok(format_all(&state, &records, &fields))
}

pub async fn by_id_handler(
    Extension(viewer): Extension<Viewer>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LookupQuery>,
) -> Result<Json<Value>> {
    let fields = FieldSelection::parse(query.fields.as_deref());
    let scope = viewer.scope();

    if let Some(ids) = query.ids.as_deref() {
        let ids = profile_service::split_id_list(ids);
        let records =
            profile_service::load_visible_profiles(state.profiles.as_ref(), &scope, Some(ids), None)
                .await?;
        return Ok(format_all(&state, &records, &fields));
    }

    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest("Missing id or ids parameter".into()))?;
    let record = profile_service::load_visible_profile(state.profiles.as_ref(), &scope, &id)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;
    Ok(Json(profile_service::format_profile(
        &record,
        &fields,
        &state.avatar_urls,
    )))
}

pub async fn by_ids_post_handler(
    Extension(viewer): Extension<Viewer>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FieldsQuery>,
    ApiJson(body): ApiJson<IdsBody>,
) -> Result<Json<Value>> {
    let fields = FieldSelection::parse(query.fields.as_deref());
    let records = profile_service::load_visible_profiles(
        state.profiles.as_ref(),
        &viewer.scope(),
        Some(body.ids),
        None,
    )
    .await?;
    Ok(format_all(&state, &records, &fields))
}

pub async fn by_user_handler(
    Extension(viewer): Extension<Viewer>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LookupQuery>,
) -> Result<Json<Value>> {
    let fields = FieldSelection::parse(query.fields.as_deref());
    let scope = viewer.scope();

    if let Some(ids) = query.ids.as_deref() {
        let user_ids = profile_service::split_id_list(ids);
        let records = profile_service::load_visible_profiles(
            state.profiles.as_ref(),
            &scope,
            None,
            Some(user_ids),
        )
        .await?;
        return Ok(format_all(&state, &records, &fields));
    }

    let user_id = query
        .id
        .ok_or_else(|| AppError::BadRequest("Missing id or ids parameter".into()))?;
    let record =
        profile_service::load_visible_profile_by_user(state.profiles.as_ref(), &scope, &user_id)
            .await?
            .ok_or(AppError::NotFound("Profile"))?;
    Ok(Json(profile_service::format_profile(
        &record,
        &fields,
        &state.avatar_urls,
    )))
}

pub async fn by_users_post_handler(
    Extension(viewer): Extension<Viewer>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FieldsQuery>,
    ApiJson(body): ApiJson<UserIdsBody>,
) -> Result<Json<Value>> {
    let fields = FieldSelection::parse(query.fields.as_deref());
    let records = profile_service::load_visible_profiles(
        state.profiles.as_ref(),
        &viewer.scope(),
        None,
        Some(body.user_ids),
    )
    .await?;
    Ok(format_all(&state, &records, &fields))
}

pub async fn by_account_handler(
    Extension(viewer): Extension<Viewer>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AccountQuery>,
) -> Result<Json<Value>> {
    let fields = FieldSelection::parse(query.fields.as_deref());
    let (Some(account_id), Some(provider_id)) = (query.account_id, query.provider_id) else {
        return Err(AppError::BadRequest(
            "Missing accountId or providerId parameter".into(),
        ));
    };
    let record = profile_service::load_visible_profile_by_account(
        state.profiles.as_ref(),
        &viewer.scope(),
        &account_id,
        &provider_id,
    )
    .await?
    .ok_or(AppError::NotFound("Profile"))?;
    Ok(Json(profile_service::format_profile(
        &record,
        &fields,
        &state.avatar_urls,
    )))
}

pub async fn by_accounts_post_handler(
    Extension(viewer): Extension<Viewer>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FieldsQuery>,
    ApiJson(body): ApiJson<AccountsBody>,
) -> Result<Json<Value>> {
    let fields = FieldSelection::parse(query.fields.as_deref());
    let scope = viewer.scope();
    let mut records = Vec::new();
    for account in &body.accounts {
        if let Some(record) = profile_service::load_visible_profile_by_account(
            state.profiles.as_ref(),
            &scope,
            &account.account_id,
            &account.provider_id,
        )
        .await?
        {
            records.push(record);
        }
    }
    Ok(format_all(&state, &records, &fields))
}

pub async fn public_profile_handler(
    Extension(viewer): Extension<Viewer>,
    State(state): State<AppState>,
    Path(profile_id): Path<String>,
) -> Result<Json<PublicProfileView>> {
    let record =
        profile_service::load_visible_profile(state.profiles.as_ref(), &viewer.scope(), &profile_id)
            .await?
            .ok_or(AppError::NotFound("Profile"))?;
    Ok(Json(PublicProfileView::from_record(
        &record,
        &state.avatar_urls,
    )))
}

pub async fn update_profile_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    ApiForm(form): ApiForm<ProfileForm>,
) -> Result<Redirect> {
    let profile_id =
        profile_service::update_profile(state.profiles.as_ref(), &auth_user.id, &form).await?;
    Ok(Redirect::to(&format!("/profile/{}", profile_id)))
}

pub async fn update_about_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    ApiForm(form): ApiForm<AboutForm>,
) -> Result<Redirect> {
    let profile_id =
        profile_service::update_about(state.profiles.as_ref(), &auth_user.id, &form).await?;
    Ok(Redirect::to(&format!("/profile/{}", profile_id)))
}

pub async fn upload_avatar_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let key = avatar_service::upload_avatar(
        state.profiles.as_ref(),
        state.avatars.as_ref(),
        &auth_user.id,
        content_type,
        &body,
    )
    .await?;

    let body = json!({
        "key": key,
        "url": state.avatar_urls.url_for(Some(&key)),
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}
