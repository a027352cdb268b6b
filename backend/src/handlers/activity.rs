//! Activity feed handler

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::Staff;
use crate::models::ApiResponse;
use crate::services::activity::{ActivityEntry, ActivityQuery};
use crate::services::ActivityService;
use crate::AppState;

pub async fn list_activity(
    State(state): State<AppState>,
    _staff: Staff,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<ApiResponse<Vec<ActivityEntry>>>> {
    let entries = ActivityService::new(state.db).list(query).await?;
    Ok(Json(ApiResponse::list(entries)))
}
