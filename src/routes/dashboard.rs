use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::dashboard::DashboardSummary, error::AppResult, middleware::auth::AuthUser,
    response::ApiResponse, services::dashboard_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/summary", get(summary))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/summary",
    responses(
        (status = 200, description = "Counters for the caller's role", body = ApiResponse<DashboardSummary>)
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardSummary>>> {
    let resp = dashboard_service::summary(&state, &user).await?;
    Ok(Json(resp))
}
