use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::services::spread_service;
use crate::state::AppState;
use crate::web::extract::ApiQuery;

/// `count` is the only client-selectable knob; unlisted values fall back to
/// the configured count.
#[derive(Debug, Deserialize, Default)]
pub struct LandingQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LandingPin {
    pub id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub avatar: Option<String>,
}

/// Landing globe pins: a cached, evenly spread selection.
pub async fn landing_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LandingQuery>,
) -> Result<Json<Vec<LandingPin>>> {
    let points = spread_service::get_landing_spread(
        state.profiles.as_ref(),
        &state.landing_cache,
        &state.landing,
        query.count,
    )
    .await?;

    let pins = points
        .into_iter()
        .map(|p| LandingPin {
            avatar: state.avatar_urls.url_for(p.avatar.as_deref()),
            id: p.id,
            latitude: p.latitude,
            longitude: p.longitude,
        })
        .collect();
    Ok(Json(pins))
}
