//! Analytics endpoint handler.

use axum::extract::{Query, State};
use axum::Json;

use curb_models::{AnalyticsQuery, AnalyticsResponse};

use crate::error::ApiResult;
use crate::state::AppState;

/// Assemble the full analytics snapshot for the requested window.
pub async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<AnalyticsResponse>> {
    let range = query.time_range.unwrap_or_default();
    let snapshot = state
        .analytics
        .snapshot(query.user_prompt.as_deref(), range)
        .await?;

    Ok(Json(snapshot))
}
